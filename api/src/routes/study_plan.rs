use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;

use tassel_core::error::ApiError;
use tassel_core::planner::{self, StudyPlan};

use crate::error::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/v1/study-plan", get(get_study_plan))
}

/// Prioritized study plan across all active courses
///
/// Outstanding assignments ranked by urgency (due date) and impact (share
/// of the grade), overdue work always first.
#[utoipa::path(
    get,
    path = "/v1/study-plan",
    responses(
        (status = 200, description = "Ranked study plan", body = StudyPlan),
        (status = 502, description = "Canvas rejected the request", body = ApiError)
    ),
    tag = "planning"
)]
pub async fn get_study_plan(
    State(state): State<AppState>,
) -> Result<Json<StudyPlan>, AppError> {
    // "now" is pinned once per request; everything downstream is pure.
    let plan = planner::study_plan(&state.canvas, Utc::now()).await?;
    Ok(Json(plan))
}
