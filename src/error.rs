//! Error types for faultline.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// Top-level error type for faultline operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration or scenario-file error.
    #[error("configuration error: {0}")]
    Config(String),

    /// A scenario failed validation at the control-API boundary.
    #[error("invalid scenario: {0}")]
    InvalidScenario(String),

    /// Body template parse or execution failure.
    #[error("template error: {0}")]
    Template(String),

    /// Replay target could not be reached.
    #[error("replay transport error: {0}")]
    ReplayTransport(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for faultline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Maps a library error onto the HTTP status it represents at the API edge.
///
/// Core logic never produces HTTP responses directly (see `SPEC_FULL.md` §7);
/// this impl is the single place that bridges `Error` to the wire.
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Config(_) | Self::InvalidScenario(_) | Self::Json(_) | Self::Yaml(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Template(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ReplayTransport(_) => StatusCode::BAD_GATEWAY,
            Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, axum::Json(json!({ "error": self.to_string() }))).into_response()
    }
}
