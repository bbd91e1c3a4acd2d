use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};

use tassel_core::error::ApiError;
use tassel_core::grades::{self, CourseGradeSummary};

use crate::error::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/v1/courses/{course_id}/grades", get(course_grades))
}

/// Grade analysis for one course
///
/// Per-group earned/possible/ungraded points, the weighted overall grade,
/// and the average score needed on remaining work for each letter grade.
/// Canvas's own enrollment scores ride along when available.
#[utoipa::path(
    get,
    path = "/v1/courses/{course_id}/grades",
    params(
        ("course_id" = u64, Path, description = "Canvas course id")
    ),
    responses(
        (status = 200, description = "Grade report", body = CourseGradeSummary),
        (status = 502, description = "Canvas rejected the request", body = ApiError)
    ),
    tag = "grades"
)]
pub async fn course_grades(
    State(state): State<AppState>,
    Path(course_id): Path<u64>,
) -> Result<Json<CourseGradeSummary>, AppError> {
    let summary = grades::course_grade_report(&state.canvas, course_id).await?;
    Ok(Json(summary))
}
