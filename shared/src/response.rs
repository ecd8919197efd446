//! Unified response envelope
//!
//! Every API response is `{code, message, data}`. Handlers return an
//! [`ApiResponse`] and always write HTTP 200; the envelope `code` carries the
//! real outcome. Paginated results wrap the rows as
//! `data: {records, total}`.

use crate::error::{AppError, ErrorCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Response envelope shared by every endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    /// Business code, see [`ErrorCode`]
    pub code: u32,
    /// Human-readable message
    pub message: String,
    /// Payload, `null` when absent
    pub data: Value,
}

impl ApiResponse {
    fn with(code: ErrorCode, message: impl Into<String>, data: Value) -> Self {
        Self {
            code: code.code(),
            message: message.into(),
            data,
        }
    }

    // ==================== Success ====================

    /// Successful response with payload
    pub fn success<T: Serialize>(data: T) -> Self {
        match serde_json::to_value(data) {
            Ok(value) => Self::with(ErrorCode::Success, "Success", value),
            Err(e) => Self::internal_error(e.to_string()),
        }
    }

    /// Paginated success: `data: {records, total}`
    pub fn page_success<T: Serialize>(records: T, total: i64) -> Self {
        match serde_json::to_value(records) {
            Ok(value) => Self::with(
                ErrorCode::Success,
                "Success",
                json!({ "records": value, "total": total }),
            ),
            Err(e) => Self::internal_error(e.to_string()),
        }
    }

    /// Success without content (e.g. DELETE)
    pub fn no_content() -> Self {
        Self::with(ErrorCode::NoContent, "No content", Value::Null)
    }

    // ==================== Client errors ====================

    pub fn param_error(message: impl ToString) -> Self {
        Self::prefixed(ErrorCode::ParamError, message)
    }

    pub fn not_found(message: impl ToString) -> Self {
        Self::prefixed(ErrorCode::NotFound, message)
    }

    pub fn unauthorized(message: impl ToString) -> Self {
        Self::prefixed(ErrorCode::Unauthorized, message)
    }

    pub fn conflict(message: impl ToString) -> Self {
        Self::prefixed(ErrorCode::Conflict, message)
    }

    // ==================== Server errors ====================

    pub fn internal_error(message: impl ToString) -> Self {
        Self::prefixed(ErrorCode::InternalError, message)
    }

    pub fn database_error(message: impl ToString) -> Self {
        Self::prefixed(ErrorCode::DatabaseError, message)
    }

    pub fn business_error(message: impl ToString) -> Self {
        Self::prefixed(ErrorCode::BusinessError, message)
    }

    pub fn rate_limit(message: impl ToString) -> Self {
        Self::prefixed(ErrorCode::RateLimit, message)
    }

    // ==================== Third party / system ====================

    pub fn third_party_error(service: &str, message: impl ToString) -> Self {
        Self::with(
            ErrorCode::ThirdPartyError,
            format!("{} service error: {}", service, message.to_string()),
            Value::Null,
        )
    }

    pub fn system_error(message: impl ToString) -> Self {
        Self::prefixed(ErrorCode::SystemError, message)
    }

    /// Envelope for a middleware-level [`AppError`] (message already formatted)
    pub fn from_error(err: &AppError) -> Self {
        Self {
            code: err.code.code(),
            message: err.message.clone(),
            data: Value::Null,
        }
    }

    /// `"<default message>: <detail>"` formatting shared by all error kinds
    fn prefixed(code: ErrorCode, message: impl ToString) -> Self {
        Self::with(
            code,
            format!("{}: {}", code.message(), message.to_string()),
            Value::Null,
        )
    }
}

impl axum::response::IntoResponse for ApiResponse {
    fn into_response(self) -> axum::response::Response {
        // Handler outcomes are always written with HTTP 200; the envelope
        // code carries the result.
        axum::Json(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope() {
        let rsp = ApiResponse::success("hello");
        assert_eq!(rsp.code, 100_000);
        assert_eq!(rsp.message, "Success");
        assert_eq!(rsp.data, json!("hello"));
    }

    #[test]
    fn test_page_success_shape() {
        let rsp = ApiResponse::page_success(vec![1, 2, 3], 42);
        assert_eq!(rsp.code, 100_000);
        assert_eq!(rsp.data["records"], json!([1, 2, 3]));
        assert_eq!(rsp.data["total"], json!(42));
    }

    #[test]
    fn test_unauthorized_prefix() {
        let rsp = ApiResponse::unauthorized("Invalid credentials");
        assert_eq!(rsp.code, 200_003);
        assert!(rsp.message.starts_with("Unauthorized"));
        assert_eq!(rsp.data, Value::Null);
    }

    #[test]
    fn test_data_always_present_in_json() {
        let rsp = ApiResponse::no_content();
        let json = serde_json::to_string(&rsp).unwrap();
        assert!(json.contains("\"data\":null"));
    }

    #[test]
    fn test_rate_limit_code() {
        let rsp = ApiResponse::rate_limit("try later");
        assert_eq!(rsp.code, 300_004);
    }
}
