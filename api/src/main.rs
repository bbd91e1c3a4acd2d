use std::net::SocketAddr;

use axum::Router;
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tassel_core::canvas::{CanvasClient, CanvasCredentials};

mod error;
mod middleware;
mod routes;
mod state;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Tassel API",
        version = "0.1.0",
        description = "Canvas study-productivity aggregations: grade projections, prioritized study plans, discussion participation."
    ),
    paths(
        routes::health::health_check,
        routes::courses::list_courses,
        routes::courses::list_all_assignments,
        routes::courses::get_profile,
        routes::grades::course_grades,
        routes::study_plan::get_study_plan,
        routes::discussions::get_discussion_insights,
        routes::feed::list_announcements,
        routes::feed::list_calendar_events,
        routes::feed::list_course_files,
    ),
    components(schemas(
        HealthResponse,
        tassel_core::error::ApiError,
        tassel_core::canvas::types::Course,
        tassel_core::canvas::types::Assignment,
        tassel_core::canvas::types::Submission,
        tassel_core::canvas::types::UserProfile,
        tassel_core::canvas::types::Announcement,
        tassel_core::canvas::types::CalendarEvent,
        tassel_core::canvas::types::CanvasFile,
        tassel_core::canvas::types::EnrollmentGrades,
        tassel_core::grades::CourseGradeSummary,
        tassel_core::grades::GradeReport,
        tassel_core::grades::GroupBreakdown,
        tassel_core::grades::TargetProjection,
        tassel_core::planner::StudyPlan,
        tassel_core::planner::PlanItem,
        tassel_core::planner::PlanSummary,
        tassel_core::discussions::DiscussionInsights,
        tassel_core::discussions::UnansweredTopic,
        tassel_core::discussions::DiscussionSummary,
        tassel_core::schedule::WorkStatus,
    ))
)]
struct ApiDoc;

#[derive(Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[tokio::main]
async fn main() {
    // Load .env if present (dev only)
    let _ = dotenvy::dotenv();

    // Structured JSON logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tassel_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    // Canvas connection — credential sourcing stops at this boundary; the
    // core only ever sees the resolved values.
    let base_url =
        std::env::var("TASSEL_CANVAS_URL").expect("TASSEL_CANVAS_URL must be set");
    let access_token =
        std::env::var("TASSEL_CANVAS_TOKEN").expect("TASSEL_CANVAS_TOKEN must be set");

    let canvas = CanvasClient::new(&CanvasCredentials {
        base_url,
        access_token,
    })
    .expect("TASSEL_CANVAS_URL is not a usable base URL");

    let app_state = state::AppState { canvas };

    let cors_layer = middleware::cors::build_cors_layer();

    let app = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .merge(routes::health::router())
        .merge(routes::courses::router())
        .merge(routes::grades::router())
        .merge(routes::study_plan::router())
        .merge(routes::discussions::router())
        .merge(routes::feed::router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer),
        )
        .with_state(app_state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Tassel API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
