use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error as ThisError;

use super::vmapi::VmapiError;
use crate::auth::AuthError;
use crate::db::DbError;

/// Service-level error for route handlers, mapped onto transport responses.
#[derive(Debug, ThisError)]
pub enum ApiError {
    /// Credential mismatch on login; a client-facing failure, not a system error.
    #[error("invalid credentials")]
    Unauthorized,

    #[error("validation error: {0}")]
    Validation(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Vmapi(#[from] VmapiError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_body) = match self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                ApiErrorObject {
                    code: "UNAUTHORIZED".to_string(),
                    message: "Invalid username or password.".to_string(),
                    details: None,
                },
            ),

            ApiError::Validation(message) => (
                StatusCode::BAD_REQUEST,
                ApiErrorObject {
                    code: "INVALID_REQUEST".to_string(),
                    message,
                    details: None,
                },
            ),

            ApiError::Conflict(message) => (
                StatusCode::CONFLICT,
                ApiErrorObject {
                    code: "CONFLICT".to_string(),
                    message,
                    details: None,
                },
            ),

            ApiError::NotFound(message) => (
                StatusCode::NOT_FOUND,
                ApiErrorObject {
                    code: "NOT_FOUND".to_string(),
                    message,
                    details: None,
                },
            ),

            // Transaction-state and store failures are internal; the body
            // stays opaque and the access log carries the 5xx.
            ApiError::Db(_) | ApiError::Auth(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiErrorObject {
                    code: "INTERNAL_ERROR".to_string(),
                    message: "An internal server error occurred.".to_string(),
                    details: None,
                },
            ),

            ApiError::Vmapi(err) => match err {
                VmapiError::Upstream {
                    status,
                    code,
                    message,
                } if status.is_client_error() => (
                    status,
                    ApiErrorObject {
                        code: code.unwrap_or_else(|| "UPSTREAM_ERROR".to_string()),
                        message: message.unwrap_or_else(|| "Upstream service error.".to_string()),
                        details: None,
                    },
                ),

                VmapiError::Json(_) => (
                    StatusCode::BAD_GATEWAY,
                    ApiErrorObject {
                        code: "BAD_UPSTREAM_PAYLOAD".to_string(),
                        message: "Failed to parse upstream response.".to_string(),
                        details: None,
                    },
                ),

                VmapiError::Transport(_) | VmapiError::Upstream { .. } | VmapiError::Url(_) => (
                    StatusCode::BAD_GATEWAY,
                    ApiErrorObject {
                        code: "UPSTREAM_ERROR".to_string(),
                        message: "Upstream service error.".to_string(),
                        details: None,
                    },
                ),
            },
        };
        (status, Json(ApiErrorBody { inner: error_body })).into_response()
    }
}

/// Standardized API error response payload.
#[derive(Serialize)]
pub struct ApiErrorObject {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

#[derive(Serialize)]
pub struct ApiErrorBody {
    #[serde(rename = "error")]
    pub inner: ApiErrorObject,
}
