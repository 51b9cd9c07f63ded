//! API error types and JSON error response formatting.
//!
//! ApiError provides a consistent JSON error response format across all
//! endpoints, mapping internal errors to appropriate HTTP status codes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// JSON error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code (e.g., "bad_request", "not_found").
    pub error: String,
    /// Human-readable error message.
    pub message: String,
}

/// API error type that maps to HTTP status codes and JSON responses.
#[derive(Debug)]
pub enum ApiError {
    /// 400 Bad Request - missing or invalid parameters.
    BadRequest(String),
    /// 404 Not Found - resource does not exist.
    NotFound(String),
    /// 500 Internal Server Error - unexpected server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg),
        };

        let body = ErrorBody {
            error: error_code.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<heirloom_core::error::HeirloomError> for ApiError {
    fn from(err: heirloom_core::error::HeirloomError) -> Self {
        match &err {
            heirloom_core::error::HeirloomError::Config(msg) => ApiError::BadRequest(msg.clone()),
            heirloom_core::error::HeirloomError::Store(msg) => ApiError::Internal(msg.clone()),
            _ => ApiError::Internal(err.to_string()),
        }
    }
}
