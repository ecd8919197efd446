//! Business error codes
//!
//! Code ranges by prefix:
//! - 1xxxxx: success
//! - 2xxxxx: client errors
//! - 3xxxxx: server errors
//! - 4xxxxx: third-party errors
//! - 5xxxxx: system errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Business error code carried in every response envelope.
///
/// Serialized as its numeric value for cross-language compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u32", try_from = "u32")]
#[repr(u32)]
pub enum ErrorCode {
    // ==================== 1xxxxx: Success ====================
    /// Operation completed successfully
    Success = 100_000,
    /// Success with no content (e.g. DELETE)
    NoContent = 100_001,
    /// Request accepted
    Accepted = 100_002,
    /// Partial content
    PartialContent = 100_003,

    // ==================== 2xxxxx: Client ====================
    /// Parameter binding or format error
    ParamError = 200_001,
    /// Resource not found
    NotFound = 200_002,
    /// Not authenticated / permission denied at the gate
    Unauthorized = 200_003,
    /// Forbidden
    Forbidden = 200_004,
    /// Resource conflict (unique key violation)
    Conflict = 200_005,
    /// Too many requests
    TooManyRequests = 200_006,
    /// Invalid token
    InvalidToken = 200_007,
    /// Token expired
    TokenExpired = 200_008,
    /// Unsupported media type
    UnsupportedMedia = 200_009,
    /// Validation failed
    ValidationFailed = 200_010,
    /// Missing required header
    MissingHeader = 200_011,
    /// Invalid format
    InvalidFormat = 200_012,

    // ==================== 3xxxxx: Server ====================
    /// Internal server error
    InternalError = 300_001,
    /// Database operation failed
    DatabaseError = 300_002,
    /// Key/value store operation failed
    KvError = 300_003,
    /// Request rejected by rate limiting or circuit breaking
    RateLimit = 300_004,
    /// Service unavailable
    ServiceUnavailable = 300_005,
    /// Operation timed out
    Timeout = 300_006,
    /// Configuration error
    ConfigError = 300_007,
    /// Initialization failed
    InitFailed = 300_008,
    /// Business rule violation
    BusinessError = 310_000,

    // ==================== 4xxxxx: Third party ====================
    /// Generic third-party service error
    ThirdPartyError = 400_001,
    /// Third-party API call error
    ThirdPartyApiError = 400_006,

    // ==================== 5xxxxx: System ====================
    /// System error
    SystemError = 500_001,
    /// System resource exhausted
    ResourceExhausted = 500_002,
    /// File not found
    FileNotFound = 500_003,
    /// System-level permission denied
    SystemPermissionDenied = 500_004,
}

impl ErrorCode {
    /// Numeric value of the code
    pub fn code(&self) -> u32 {
        *self as u32
    }

    /// Default human-readable message
    pub fn message(&self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::NoContent => "No content",
            Self::Accepted => "Accepted",
            Self::PartialContent => "Partial content",
            Self::ParamError => "Parameter error",
            Self::NotFound => "Resource not found",
            Self::Unauthorized => "Unauthorized",
            Self::Forbidden => "Forbidden",
            Self::Conflict => "Conflict",
            Self::TooManyRequests => "Too many requests",
            Self::InvalidToken => "Invalid token",
            Self::TokenExpired => "Token expired",
            Self::UnsupportedMedia => "Unsupported media type",
            Self::ValidationFailed => "Validation failed",
            Self::MissingHeader => "Missing required header",
            Self::InvalidFormat => "Invalid format",
            Self::InternalError => "Internal server error",
            Self::DatabaseError => "Database error",
            Self::KvError => "KV store error",
            Self::RateLimit => "Rate limit",
            Self::ServiceUnavailable => "Service unavailable",
            Self::Timeout => "Operation timed out",
            Self::ConfigError => "Configuration error",
            Self::InitFailed => "Initialization failed",
            Self::BusinessError => "Business error",
            Self::ThirdPartyError => "Third-party service error",
            Self::ThirdPartyApiError => "Third-party API error",
            Self::SystemError => "System error",
            Self::ResourceExhausted => "Resource exhausted",
            Self::FileNotFound => "File not found",
            Self::SystemPermissionDenied => "Permission denied",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl From<ErrorCode> for u32 {
    fn from(code: ErrorCode) -> u32 {
        code as u32
    }
}

impl TryFrom<u32> for ErrorCode {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        let code = match value {
            100_000 => Self::Success,
            100_001 => Self::NoContent,
            100_002 => Self::Accepted,
            100_003 => Self::PartialContent,
            200_001 => Self::ParamError,
            200_002 => Self::NotFound,
            200_003 => Self::Unauthorized,
            200_004 => Self::Forbidden,
            200_005 => Self::Conflict,
            200_006 => Self::TooManyRequests,
            200_007 => Self::InvalidToken,
            200_008 => Self::TokenExpired,
            200_009 => Self::UnsupportedMedia,
            200_010 => Self::ValidationFailed,
            200_011 => Self::MissingHeader,
            200_012 => Self::InvalidFormat,
            300_001 => Self::InternalError,
            300_002 => Self::DatabaseError,
            300_003 => Self::KvError,
            300_004 => Self::RateLimit,
            300_005 => Self::ServiceUnavailable,
            300_006 => Self::Timeout,
            300_007 => Self::ConfigError,
            300_008 => Self::InitFailed,
            310_000 => Self::BusinessError,
            400_001 => Self::ThirdPartyError,
            400_006 => Self::ThirdPartyApiError,
            500_001 => Self::SystemError,
            500_002 => Self::ResourceExhausted,
            500_003 => Self::FileNotFound,
            500_004 => Self::SystemPermissionDenied,
            other => return Err(format!("unknown error code: {other}")),
        };
        Ok(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_values() {
        assert_eq!(ErrorCode::Success.code(), 100_000);
        assert_eq!(ErrorCode::Unauthorized.code(), 200_003);
        assert_eq!(ErrorCode::RateLimit.code(), 300_004);
        assert_eq!(ErrorCode::BusinessError.code(), 310_000);
    }

    #[test]
    fn test_round_trip() {
        for code in [
            ErrorCode::Success,
            ErrorCode::ParamError,
            ErrorCode::Unauthorized,
            ErrorCode::DatabaseError,
            ErrorCode::SystemError,
        ] {
            assert_eq!(ErrorCode::try_from(code.code()).unwrap(), code);
        }
    }

    #[test]
    fn test_unknown_code_rejected() {
        assert!(ErrorCode::try_from(999_999).is_err());
    }

    #[test]
    fn test_serde_as_number() {
        let json = serde_json::to_string(&ErrorCode::Unauthorized).unwrap();
        assert_eq!(json, "200003");
        let back: ErrorCode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ErrorCode::Unauthorized);
    }
}
