//! Business services
//!
//! - [`auth`] - login, token refresh, user-response projection
//! - [`permission`] - RBAC engine: roles, permissions, links, caches
//! - [`system_setting`] - typed key/value settings
//! - [`init`] - first-boot seeding

pub mod auth;
pub mod convert;
pub mod init;
pub mod permission;
pub mod system_setting;

pub use auth::AuthService;
pub use init::InitService;
pub use permission::PermissionService;
pub use system_setting::SystemSettingService;

use crate::auth::jwt::JwtError;
use crate::db::RepoError;
use shared::ApiResponse;
use thiserror::Error;

/// Service-layer error bridging repository and token errors into
/// envelope-level outcomes.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Unknown user or wrong password; callers cannot tell which
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error(transparent)]
    Token(#[from] JwtError),
    #[error(transparent)]
    Repo(#[from] RepoError),
    /// Business rule violation with a client-visible message
    #[error("{0}")]
    Business(String),
    /// Unique-key conflict with a client-visible message
    #[error("{0}")]
    Conflict(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl From<ServiceError> for ApiResponse {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::InvalidCredentials => ApiResponse::unauthorized("Invalid credentials"),
            ServiceError::Token(e) => ApiResponse::unauthorized(e),
            ServiceError::Conflict(msg) => ApiResponse::conflict(msg),
            ServiceError::Business(msg) => ApiResponse::business_error(msg),
            ServiceError::Repo(RepoError::RecordNotFound) => {
                ApiResponse::not_found("record not found")
            }
            ServiceError::Repo(e) => {
                tracing::error!(error = %e, "Repository error");
                ApiResponse::database_error(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_credentials_maps_to_unauthorized() {
        let rsp: ApiResponse = ServiceError::InvalidCredentials.into();
        assert_eq!(rsp.code, 200_003);
        assert!(rsp.message.starts_with("Unauthorized"));
    }

    #[test]
    fn test_not_found_maps_to_client_error() {
        let rsp: ApiResponse = ServiceError::Repo(RepoError::RecordNotFound).into();
        assert_eq!(rsp.code, 200_002);
    }

    #[test]
    fn test_business_error_code() {
        let rsp: ApiResponse = ServiceError::Business("nope".into()).into();
        assert_eq!(rsp.code, 310_000);
    }
}
