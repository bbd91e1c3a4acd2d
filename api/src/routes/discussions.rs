use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;

use tassel_core::discussions::{self, DiscussionInsights};
use tassel_core::error::ApiError;

use crate::error::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/v1/discussions/insights", get(get_discussion_insights))
}

/// Discussion participation across all active courses
///
/// Published topics the user has not posted in, bucketed by due date,
/// soonest first.
#[utoipa::path(
    get,
    path = "/v1/discussions/insights",
    responses(
        (status = 200, description = "Discussion insights", body = DiscussionInsights),
        (status = 502, description = "Canvas rejected the request", body = ApiError)
    ),
    tag = "discussions"
)]
pub async fn get_discussion_insights(
    State(state): State<AppState>,
) -> Result<Json<DiscussionInsights>, AppError> {
    let insights = discussions::discussion_insights(&state.canvas, Utc::now()).await?;
    Ok(Json(insights))
}
