use tassel_core::canvas::CanvasClient;

#[derive(Clone)]
pub struct AppState {
    pub canvas: CanvasClient,
}
