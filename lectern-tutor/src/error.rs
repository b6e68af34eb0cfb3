//! Error types for lectern-tutor

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Failure to produce lecture text for one unit
///
/// Always absorbed by the pipeline; the worst case for a unit is the
/// apology message.
#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    #[error("Generation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Provider {provider} failed: {message}")]
    Provider { provider: String, message: String },

    /// Provider cannot serve requests right now (backend down, no context)
    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    #[error("Generation cancelled")]
    Cancelled,

    /// Every provider in the chain failed; holds the last failure
    #[error("All providers failed: {0}")]
    Exhausted(String),
}

impl GenerationError {
    pub fn provider(provider: &str, message: impl Into<String>) -> Self {
        GenerationError::Provider {
            provider: provider.to_string(),
            message: message.into(),
        }
    }
}

/// Failure while playing back or streaming a lesson
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Delivery cancelled")]
    Cancelled,

    #[error("Delivery failed: {0}")]
    Failed(String),
}

/// Programmer-error-class pipeline conditions
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A background generation was launched while another was still in flight
    #[error("Background generation for unit {in_flight} still in flight, cannot start unit {requested}")]
    PrefetchInFlight { in_flight: usize, requested: usize },

    #[error("Curriculum has no units")]
    EmptyCurriculum,
}

/// Lecture cache backend failure
///
/// Never escapes `LectureCache`; backend errors degrade to a miss.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache backend unavailable: {0}")]
    Unavailable(String),
}

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::EmptyCurriculum => ApiError::BadRequest(err.to_string()),
            PipelineError::PrefetchInFlight { .. } => ApiError::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
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
