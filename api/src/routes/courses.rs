use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use tassel_core::canvas::types::{Assignment, Course, UserProfile};
use tassel_core::error::ApiError;

use crate::error::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/courses", get(list_courses))
        .route("/v1/assignments", get(list_all_assignments))
        .route("/v1/profile", get(get_profile))
}

/// Active courses for the connected Canvas user
#[utoipa::path(
    get,
    path = "/v1/courses",
    responses(
        (status = 200, description = "Active courses", body = Vec<Course>),
        (status = 502, description = "Canvas rejected the request", body = ApiError)
    ),
    tag = "canvas"
)]
pub async fn list_courses(
    State(state): State<AppState>,
) -> Result<Json<Vec<Course>>, AppError> {
    Ok(Json(state.canvas.fetch_courses().await?))
}

/// Every assignment across active courses, with the user's own submissions
///
/// A course whose assignment fetch fails contributes an empty slice rather
/// than failing the whole listing.
#[utoipa::path(
    get,
    path = "/v1/assignments",
    responses(
        (status = 200, description = "Assignments across all courses", body = Vec<Assignment>),
        (status = 502, description = "Canvas rejected the request", body = ApiError)
    ),
    tag = "canvas"
)]
pub async fn list_all_assignments(
    State(state): State<AppState>,
) -> Result<Json<Vec<Assignment>>, AppError> {
    let courses = state.canvas.fetch_courses().await?;
    Ok(Json(state.canvas.fetch_all_assignments(&courses).await))
}

/// The connected user's Canvas profile
#[utoipa::path(
    get,
    path = "/v1/profile",
    responses(
        (status = 200, description = "User profile", body = UserProfile),
        (status = 502, description = "Canvas rejected the request", body = ApiError)
    ),
    tag = "canvas"
)]
pub async fn get_profile(
    State(state): State<AppState>,
) -> Result<Json<UserProfile>, AppError> {
    Ok(Json(state.canvas.fetch_user_profile().await?))
}
