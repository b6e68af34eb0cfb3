//! Error types for lectern-attend

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Errors raised by the session registry and persistence layer
///
/// Noisy or unrecognized frames never produce an error; only session-control
/// misuse and infrastructure failures do.
#[derive(Debug, Error)]
pub enum AttendError {
    /// `start_session` on an id that is already active without `force`
    #[error("Attention session already active: {0}")]
    SessionAlreadyActive(String),

    /// Frame or end request for a session that was never started
    #[error("Attention session not found: {0}")]
    SessionNotFound(String),

    /// Invalid `[attention]` configuration
    #[error("Invalid attention configuration: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Stored attendance row that no longer parses
    #[error("Corrupt attendance record: {0}")]
    CorruptRecord(String),

    #[error(transparent)]
    Common(#[from] lectern_common::Error),
}

pub type Result<T> = std::result::Result<T, AttendError>;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Conflict (409), e.g. session already active
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<AttendError> for ApiError {
    fn from(err: AttendError) -> Self {
        match err {
            AttendError::SessionAlreadyActive(_) => ApiError::Conflict(err.to_string()),
            AttendError::SessionNotFound(_) => ApiError::NotFound(err.to_string()),
            AttendError::Config(_) => ApiError::BadRequest(err.to_string()),
            AttendError::Database(_) | AttendError::CorruptRecord(_) | AttendError::Common(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = std::result::Result<T, ApiError>;
