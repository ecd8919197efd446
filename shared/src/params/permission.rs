//! Permission management requests

use super::page::{default_limit, validate_page};
use super::{check_ids, check_len, check_positive, Validate};
use crate::query::{Condition, Filterable, Op};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePermissionRequest {
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parent_id: i64,
    /// 1: menu, 2: button, 3: api
    #[serde(default)]
    pub r#type: i32,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub status: i32,
}

impl Validate for CreatePermissionRequest {
    fn validate(&self) -> Result<(), String> {
        check_len("name", &self.name, 1, 50)?;
        check_len("code", &self.code, 1, 50)?;
        check_len("description", &self.description, 0, 255)?;
        check_len("path", &self.path, 0, 255)?;
        check_len("method", &self.method, 0, 50)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePermissionsRequest {
    pub permissions: Vec<CreatePermissionRequest>,
}

impl Validate for CreatePermissionsRequest {
    fn validate(&self) -> Result<(), String> {
        if self.permissions.is_empty() {
            return Err("permissions must not be empty".to_string());
        }
        for permission in &self.permissions {
            permission.validate()?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdatePermissionRequest {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub description: String,
    /// `None` leaves the parent untouched; `Some(0)` detaches
    #[serde(default)]
    pub parent_id: Option<i64>,
    #[serde(default)]
    pub r#type: i32,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub status: i32,
}

impl Validate for UpdatePermissionRequest {
    fn validate(&self) -> Result<(), String> {
        check_positive("id", self.id)?;
        check_len("name", &self.name, 0, 50)?;
        check_len("code", &self.code, 0, 50)?;
        check_len("description", &self.description, 0, 255)?;
        check_len("path", &self.path, 0, 255)?;
        check_len("method", &self.method, 0, 50)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeletePermissionRequest {
    pub ids: Vec<i64>,
}

impl Validate for DeletePermissionRequest {
    fn validate(&self) -> Result<(), String> {
        check_ids("ids", &self.ids)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetPermissionRequest {
    pub id: i64,
    #[serde(default)]
    pub flags: i32,
}

impl Validate for GetPermissionRequest {
    fn validate(&self) -> Result<(), String> {
        check_positive("id", self.id)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetPermissionListRequest {
    #[serde(default)]
    pub offset: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub r#type: i32,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub status: i32,
    #[serde(default)]
    pub flags: i32,
}

impl Validate for GetPermissionListRequest {
    fn validate(&self) -> Result<(), String> {
        validate_page(self.offset, self.limit)?;
        check_len("name", &self.name, 0, 50)?;
        check_len("code", &self.code, 0, 50)?;
        check_len("path", &self.path, 0, 255)
    }
}

impl Filterable for GetPermissionListRequest {
    fn filters(&self) -> Vec<Condition> {
        let mut conds = Vec::new();
        if !self.name.is_empty() {
            conds.push(Condition::new("name", Op::Like, self.name.clone()));
        }
        if !self.code.is_empty() {
            conds.push(Condition::new("code", Op::StartsWith, self.code.clone()));
        }
        if self.r#type != 0 {
            conds.push(Condition::new("type", Op::Eq, self.r#type));
        }
        if !self.path.is_empty() {
            conds.push(Condition::new("path", Op::Like, self.path.clone()));
        }
        if !self.method.is_empty() {
            conds.push(Condition::new("method", Op::Eq, self.method.clone()));
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
    fn test_pure_grouping_node_is_valid() {
        // A permission with empty method and path is a grouping node
        let req = CreatePermissionRequest {
            name: "System".into(),
            code: "system".into(),
            description: String::new(),
            parent_id: 0,
            r#type: 1,
            path: String::new(),
            method: String::new(),
            status: 1,
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_list_filters() {
        let req = GetPermissionListRequest {
            offset: 0,
            limit: default_limit(),
            name: String::new(),
            code: "user".into(),
            r#type: 3,
            path: String::new(),
            method: "GET".into(),
            status: 0,
            flags: 0,
        };
        let filters = req.filters();
        assert_eq!(filters.len(), 3);
    }
}
