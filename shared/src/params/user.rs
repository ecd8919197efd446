//! User management requests

use super::page::{default_limit, validate_page};
use super::{check_ids, check_len, check_positive, Validate};
use crate::query::{Condition, Filterable, Op};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub avatar_url: String,
    /// At least one role must be linked at creation time
    pub role_ids: Vec<i64>,
    #[serde(default)]
    pub status: i32,
}

impl Validate for CreateUserRequest {
    fn validate(&self) -> Result<(), String> {
        check_len("username", &self.username, 1, 50)?;
        check_len("password", &self.password, 6, 20)?;
        check_len("email", &self.email, 1, 100)?;
        check_len("phone", &self.phone, 0, 20)?;
        check_len("avatar_url", &self.avatar_url, 0, 255)?;
        check_ids("role_ids", &self.role_ids)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateUserRequest {
    pub id: i64,
    #[serde(default)]
    pub username: String,
    /// Empty means the password is unchanged
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub avatar_url: String,
    /// `None` leaves assignments untouched; `Some(vec![])` clears them
    #[serde(default)]
    pub role_ids: Option<Vec<i64>>,
    #[serde(default)]
    pub status: i32,
}

impl Validate for UpdateUserRequest {
    fn validate(&self) -> Result<(), String> {
        check_positive("id", self.id)?;
        check_len("username", &self.username, 0, 50)?;
        if !self.password.is_empty() {
            check_len("password", &self.password, 6, 20)?;
        }
        check_len("email", &self.email, 0, 100)?;
        check_len("phone", &self.phone, 0, 20)?;
        check_len("avatar_url", &self.avatar_url, 0, 255)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteUserRequest {
    pub ids: Vec<i64>,
}

impl Validate for DeleteUserRequest {
    fn validate(&self) -> Result<(), String> {
        check_ids("ids", &self.ids)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetUserRequest {
    pub id: i64,
    #[serde(default)]
    pub flags: i32,
}

impl Validate for GetUserRequest {
    fn validate(&self) -> Result<(), String> {
        check_positive("id", self.id)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetUserListRequest {
    #[serde(default)]
    pub offset: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub status: i32,
    #[serde(default)]
    pub flags: i32,
}

impl Validate for GetUserListRequest {
    fn validate(&self) -> Result<(), String> {
        validate_page(self.offset, self.limit)?;
        check_len("username", &self.username, 0, 50)?;
        check_len("email", &self.email, 0, 100)?;
        check_len("phone", &self.phone, 0, 20)
    }
}

impl Filterable for GetUserListRequest {
    fn filters(&self) -> Vec<Condition> {
        let mut conds = Vec::new();
        if !self.username.is_empty() {
            conds.push(Condition::new("username", Op::Like, self.username.clone()));
        }
        if !self.email.is_empty() {
            conds.push(Condition::new("email", Op::Like, self.email.clone()));
        }
        if !self.phone.is_empty() {
            conds.push(Condition::new("phone", Op::Like, self.phone.clone()));
        }
        if self.status != 0 {
            conds.push(Condition::new("status", Op::Eq, self.status));
        }
        conds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_user_validation() {
        let req = CreateUserRequest {
            username: "bob".into(),
            password: "secret1".into(),
            email: "bob@example.com".into(),
            phone: String::new(),
            avatar_url: String::new(),
            role_ids: vec![2],
            status: 1,
        };
        assert!(req.validate().is_ok());

        let short_pw = CreateUserRequest {
            password: "123".into(),
            ..req.clone()
        };
        assert!(short_pw.validate().is_err());

        let no_roles = CreateUserRequest {
            role_ids: vec![],
            ..req
        };
        assert!(no_roles.validate().is_err());
    }

    #[test]
    fn test_update_allows_empty_password() {
        let req = UpdateUserRequest {
            id: 1,
            username: String::new(),
            password: String::new(),
            email: String::new(),
            phone: String::new(),
            avatar_url: String::new(),
            role_ids: None,
            status: 0,
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_list_filters_skip_zero_fields() {
        let req = GetUserListRequest {
            offset: 0,
            limit: default_limit(),
            username: "ad".into(),
            email: String::new(),
            phone: String::new(),
            status: 0,
            flags: 0,
        };
        let filters = req.filters();
        assert_eq!(filters.len(), 1);
        assert_eq!(filters[0].field, "username");
        assert_eq!(filters[0].op, Op::Like);
    }
}
