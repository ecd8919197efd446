//! HTTP status mapping for error codes
//!
//! Only middleware aborts use these statuses; handler-produced envelopes are
//! always written with HTTP 200 and the real outcome in `code`.

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// HTTP status used when this code aborts the middleware chain.
    ///
    /// Permission denial intentionally maps to 401, not 403 (documented
    /// behavior relied on by existing clients).
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::Success | Self::NoContent | Self::Accepted | Self::PartialContent => {
                StatusCode::OK
            }

            // 401 Unauthorized
            Self::Unauthorized | Self::InvalidToken | Self::TokenExpired => {
                StatusCode::UNAUTHORIZED
            }

            // 403 Forbidden
            Self::Forbidden | Self::SystemPermissionDenied => StatusCode::FORBIDDEN,

            // 404 Not Found
            Self::NotFound => StatusCode::NOT_FOUND,

            // 409 Conflict
            Self::Conflict => StatusCode::CONFLICT,

            // 415 Unsupported Media Type
            Self::UnsupportedMedia => StatusCode::UNSUPPORTED_MEDIA_TYPE,

            // 429 Too Many Requests
            Self::TooManyRequests | Self::RateLimit => StatusCode::TOO_MANY_REQUESTS,

            // 400 Bad Request
            Self::ParamError
            | Self::ValidationFailed
            | Self::MissingHeader
            | Self::InvalidFormat => StatusCode::BAD_REQUEST,

            // 502 Bad Gateway
            Self::ThirdPartyError | Self::ThirdPartyApiError => StatusCode::BAD_GATEWAY,

            // 503 Service Unavailable
            Self::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,

            // 500 Internal Server Error
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_family() {
        assert_eq!(
            ErrorCode::Unauthorized.http_status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ErrorCode::InvalidToken.http_status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ErrorCode::TokenExpired.http_status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_rate_limit_is_429() {
        assert_eq!(
            ErrorCode::RateLimit.http_status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ErrorCode::TooManyRequests.http_status(),
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[test]
    fn test_server_errors_are_500() {
        assert_eq!(
            ErrorCode::InternalError.http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ErrorCode::DatabaseError.http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
