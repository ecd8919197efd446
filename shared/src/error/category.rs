//! Error categories derived from code ranges

use super::codes::ErrorCode;

/// Coarse error category, one per code range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// 1xxxxx
    Success,
    /// 2xxxxx
    Client,
    /// 3xxxxx
    Server,
    /// 4xxxxx
    ThirdParty,
    /// 5xxxxx
    System,
}

impl ErrorCode {
    /// Category of this code, by range
    pub fn category(&self) -> ErrorCategory {
        match self.code() {
            100_000..=199_999 => ErrorCategory::Success,
            200_000..=299_999 => ErrorCategory::Client,
            300_000..=399_999 => ErrorCategory::Server,
            400_000..=499_999 => ErrorCategory::ThirdParty,
            _ => ErrorCategory::System,
        }
    }

    /// Whether this code represents a successful outcome
    pub fn is_success(&self) -> bool {
        self.category() == ErrorCategory::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(ErrorCode::Success.category(), ErrorCategory::Success);
        assert_eq!(ErrorCode::NoContent.category(), ErrorCategory::Success);
        assert_eq!(ErrorCode::ParamError.category(), ErrorCategory::Client);
        assert_eq!(ErrorCode::Unauthorized.category(), ErrorCategory::Client);
        assert_eq!(ErrorCode::RateLimit.category(), ErrorCategory::Server);
        assert_eq!(ErrorCode::BusinessError.category(), ErrorCategory::Server);
        assert_eq!(
            ErrorCode::ThirdPartyError.category(),
            ErrorCategory::ThirdParty
        );
        assert_eq!(ErrorCode::SystemError.category(), ErrorCategory::System);
    }

    #[test]
    fn test_is_success() {
        assert!(ErrorCode::Success.is_success());
        assert!(ErrorCode::NoContent.is_success());
        assert!(!ErrorCode::NotFound.is_success());
    }
}
