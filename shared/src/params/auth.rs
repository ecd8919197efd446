//! Authentication requests

use super::{check_ids, check_positive, Validate};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), String> {
        if self.username.is_empty() {
            return Err("username must not be empty".to_string());
        }
        if self.password.is_empty() {
            return Err("password must not be empty".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

impl Validate for RefreshTokenRequest {
    fn validate(&self) -> Result<(), String> {
        if self.refresh_token.is_empty() {
            return Err("refresh_token must not be empty".to_string());
        }
        Ok(())
    }
}

/// Assign a full role set to a user (re-sync semantics)
#[derive(Debug, Clone, Deserialize)]
pub struct AssignRolesRequest {
    pub user_id: i64,
    #[serde(default)]
    pub role_ids: Vec<i64>,
}

impl Validate for AssignRolesRequest {
    fn validate(&self) -> Result<(), String> {
        check_positive("user_id", self.user_id)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetUserRolesRequest {
    pub user_id: i64,
    #[serde(default)]
    pub flags: i32,
}

impl Validate for GetUserRolesRequest {
    fn validate(&self) -> Result<(), String> {
        check_positive("user_id", self.user_id)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetUserPermissionsRequest {
    pub user_id: i64,
}

impl Validate for GetUserPermissionsRequest {
    fn validate(&self) -> Result<(), String> {
        check_positive("user_id", self.user_id)
    }
}

/// Assign a full permission set to a role (re-sync semantics)
#[derive(Debug, Clone, Deserialize)]
pub struct AssignRolePermissionsRequest {
    pub role_id: i64,
    #[serde(default)]
    pub permission_ids: Vec<i64>,
}

impl Validate for AssignRolePermissionsRequest {
    fn validate(&self) -> Result<(), String> {
        check_positive("role_id", self.role_id)?;
        if !self.permission_ids.is_empty() {
            check_ids("permission_ids", &self.permission_ids)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetRolePermissionsRequest {
    pub role_id: i64,
}

impl Validate for GetRolePermissionsRequest {
    fn validate(&self) -> Result<(), String> {
        check_positive("role_id", self.role_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_request_rejects_empty() {
        let req = LoginRequest {
            username: String::new(),
            password: "x".into(),
        };
        assert!(req.validate().is_err());

        let req = LoginRequest {
            username: "admin".into(),
            password: "123456".into(),
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_assign_roles_requires_user() {
        let req = AssignRolesRequest {
            user_id: 0,
            role_ids: vec![1],
        };
        assert!(req.validate().is_err());
    }
}
