//! The `AppError` type and axum integration

use super::category::ErrorCategory;
use super::codes::ErrorCode;
use crate::response::ApiResponse;
use thiserror::Error;

/// Application error used wherever a request is aborted before (or instead
/// of) running its handler: auth gate, rate limiting, bind/validate.
///
/// Unlike handler envelopes, an `AppError` response carries the HTTP status
/// mapped from its code.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AppError {
    /// Business error code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
}

impl AppError {
    /// Create an error with the default message for the code
    pub fn new(code: ErrorCode) -> Self {
        Self {
            message: code.message().to_string(),
            code,
        }
    }

    /// Create an error with a custom message, prefixed by the code's default
    /// message the way all envelopes are formatted.
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            message: format!("{}: {}", code.message(), message.into()),
            code,
        }
    }

    // ==================== Convenience constructors ====================

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::Unauthorized, msg)
    }

    pub fn param_error(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ParamError, msg)
    }

    pub fn rate_limit(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::RateLimit, msg)
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ValidationFailed, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InternalError, msg)
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ConfigError, msg)
    }
}

/// Result alias for fallible middleware and extractors
pub type AppResult<T> = Result<T, AppError>;

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::Json;

        let status = self.code.http_status();
        // System errors are logged before they leave the process
        if self.code.category() == ErrorCategory::System {
            tracing::error!(code = %self.code, message = %self.message, "System error");
        }
        let body = ApiResponse::from_error(&self);
        (status, Json(body)).into_response()
    }
}
