use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};

use tassel_core::canvas::types::{Announcement, CalendarEvent, CanvasFile};
use tassel_core::error::ApiError;

use crate::error::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/announcements", get(list_announcements))
        .route("/v1/calendar-events", get(list_calendar_events))
        .route("/v1/courses/{course_id}/files", get(list_course_files))
}

/// Recent announcements across all active courses, newest first
#[utoipa::path(
    get,
    path = "/v1/announcements",
    responses(
        (status = 200, description = "Announcements", body = Vec<Announcement>),
        (status = 502, description = "Canvas rejected the request", body = ApiError)
    ),
    tag = "feed"
)]
pub async fn list_announcements(
    State(state): State<AppState>,
) -> Result<Json<Vec<Announcement>>, AppError> {
    let courses = state.canvas.fetch_courses().await?;
    let mut announcements = state.canvas.fetch_announcements(&courses).await?;
    announcements.sort_by(|a, b| b.posted_at.cmp(&a.posted_at));
    Ok(Json(announcements))
}

/// Upcoming calendar events, soonest first
#[utoipa::path(
    get,
    path = "/v1/calendar-events",
    responses(
        (status = 200, description = "Calendar events", body = Vec<CalendarEvent>),
        (status = 502, description = "Canvas rejected the request", body = ApiError)
    ),
    tag = "feed"
)]
pub async fn list_calendar_events(
    State(state): State<AppState>,
) -> Result<Json<Vec<CalendarEvent>>, AppError> {
    let mut events = state.canvas.fetch_calendar_events().await?;
    events.sort_by(|a, b| a.start_at.cmp(&b.start_at));
    Ok(Json(events))
}

/// Files posted in one course, alphabetical
#[utoipa::path(
    get,
    path = "/v1/courses/{course_id}/files",
    params(
        ("course_id" = u64, Path, description = "Canvas course id")
    ),
    responses(
        (status = 200, description = "Course files", body = Vec<CanvasFile>),
        (status = 502, description = "Canvas rejected the request", body = ApiError)
    ),
    tag = "feed"
)]
pub async fn list_course_files(
    State(state): State<AppState>,
    Path(course_id): Path<u64>,
) -> Result<Json<Vec<CanvasFile>>, AppError> {
    let mut files = state.canvas.fetch_course_files(course_id).await?;
    files.sort_by(|a, b| a.display_name.cmp(&b.display_name));
    Ok(Json(files))
}
