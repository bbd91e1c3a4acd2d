use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// Errors surfaced by the Canvas client.
///
/// Primary-path failures (the course list itself, a requested course's
/// grade data) propagate unmodified. Secondary fan-out branches downgrade
/// per unit via [`crate::canvas::or_empty`]. There is no retry anywhere —
/// transient and permanent upstream failures are treated identically.
#[derive(Debug, Error)]
pub enum CanvasError {
    /// Non-2xx response from the Canvas API.
    #[error("canvas returned {status} {status_text} for {url}")]
    Upstream {
        status: u16,
        status_text: String,
        url: String,
    },

    /// Network-level failure, or a body that did not decode as expected.
    #[error("canvas request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The base URL did not parse even after normalization.
    #[error("invalid canvas base url: {0}")]
    InvalidBaseUrl(String),
}

/// Structured error response body returned by the HTTP surface.
/// Carries enough detail for the caller to render a meaningful message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiError {
    /// Machine-readable error code (e.g. "upstream_http_error")
    pub error: String,
    /// Human/agent-readable description of what went wrong
    pub message: String,
    /// Status the upstream API answered with, when there was an answer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream_status: Option<u16>,
    /// Request ID for tracing and debugging
    pub request_id: String,
    /// Hint about how to remediate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docs_hint: Option<String>,
}

/// Error codes used across the API and tool surfaces
pub mod codes {
    pub const UPSTREAM_HTTP_ERROR: &str = "upstream_http_error";
    pub const NOT_CONNECTED: &str = "not_connected";
    pub const INVALID_CREDENTIALS: &str = "invalid_credentials";
    pub const INTERNAL_ERROR: &str = "internal_error";
}
