//! API error handling.
//!
//! Maps service errors onto status codes with a `{code, message}` body.

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use slidegen::SlidegenError;

/// API error response body.
#[derive(Debug, Serialize)]
pub struct ApiErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

/// API error type that can be converted to HTTP responses.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, "INVALID_STATE", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorResponse {
            code: self.code,
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<SlidegenError> for ApiError {
    fn from(err: SlidegenError) -> Self {
        match err {
            SlidegenError::NotFound(_) | SlidegenError::OutputMissing(_) => {
                ApiError::not_found(err.to_string())
            }
            SlidegenError::InvalidState { .. } => ApiError::conflict(err.to_string()),
            SlidegenError::UnknownTheme(_) => {
                ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, "UNKNOWN_THEME", err.to_string())
            }
            SlidegenError::UnsupportedMedia(_) => {
                ApiError::new(StatusCode::BAD_REQUEST, "UNSUPPORTED_MEDIA", err.to_string())
            }
            // Already recorded on the job; the detail is safe to echo.
            SlidegenError::Stage(_) => ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "STAGE_FAILED",
                err.to_string(),
            ),
            SlidegenError::Storage(_) | SlidegenError::Config(_) | SlidegenError::AlreadyExists(_) => {
                tracing::error!(error = %err, "Internal error");
                ApiError::internal("An unexpected error occurred")
            }
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::new(err.status(), "BAD_REQUEST", err.body_text())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        tracing::error!(error = %err, "Pipeline task failed");
        ApiError::internal("Pipeline task failed")
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;
