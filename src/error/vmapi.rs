use axum::http::StatusCode;
use thiserror::Error;

use super::IsRetryable;

/// Failures talking to the remote compute-management API.
#[derive(Debug, Error)]
pub enum VmapiError {
    #[error("HTTP request error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success status from the remote API, with its structured error
    /// body when one could be parsed.
    #[error("upstream error with status: {status}")]
    Upstream {
        status: StatusCode,
        code: Option<String>,
        message: Option<String>,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),
}

impl IsRetryable for VmapiError {
    fn is_retryable(&self) -> bool {
        // Application-level errors from the remote API are never retried;
        // only the transport may be transient.
        matches!(self, VmapiError::Transport(_))
    }
}
