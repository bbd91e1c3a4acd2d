use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tassel_core::error::{self, ApiError, CanvasError};

/// Internal error type that converts to structured API responses
#[derive(Debug)]
pub enum AppError {
    /// Canvas answered with a non-2xx status (502 with upstream detail)
    Upstream { status: u16, status_text: String },
    /// Canvas could not be reached, or its response was undecodable (502)
    Unreachable(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let request_id = uuid::Uuid::now_v7().to_string();

        let (status, api_error) = match self {
            AppError::Upstream {
                status,
                status_text,
            } => (
                StatusCode::BAD_GATEWAY,
                ApiError {
                    error: error::codes::UPSTREAM_HTTP_ERROR.to_string(),
                    message: format!("Canvas returned {status} {status_text}"),
                    upstream_status: Some(status),
                    request_id,
                    docs_hint: Some(
                        "Check that the Canvas base URL and access token are still valid."
                            .to_string(),
                    ),
                },
            ),
            AppError::Unreachable(detail) => {
                tracing::error!("Canvas unreachable: {}", detail);
                (
                    StatusCode::BAD_GATEWAY,
                    ApiError {
                        error: error::codes::UPSTREAM_HTTP_ERROR.to_string(),
                        message: "Could not reach Canvas".to_string(),
                        upstream_status: None,
                        request_id,
                        docs_hint: None,
                    },
                )
            }
        };

        (status, Json(api_error)).into_response()
    }
}

impl From<CanvasError> for AppError {
    fn from(err: CanvasError) -> Self {
        match err {
            CanvasError::Upstream {
                status,
                status_text,
                url,
            } => {
                tracing::warn!(status, %url, "canvas rejected the request");
                AppError::Upstream {
                    status,
                    status_text,
                }
            }
            other => AppError::Unreachable(other.to_string()),
        }
    }
}
