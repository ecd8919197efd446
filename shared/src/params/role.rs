//! Role management requests

use super::page::{default_limit, validate_page};
use super::{check_ids, check_len, check_positive, Validate};
use crate::query::{Condition, Filterable, Op};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRoleRequest {
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: i32,
    #[serde(default)]
    pub permission_ids: Vec<i64>,
}

impl Validate for CreateRoleRequest {
    fn validate(&self) -> Result<(), String> {
        check_len("name", &self.name, 1, 50)?;
        check_len("code", &self.code, 1, 50)?;
        check_len("description", &self.description, 0, 255)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRolesRequest {
    pub roles: Vec<CreateRoleRequest>,
}

impl Validate for CreateRolesRequest {
    fn validate(&self) -> Result<(), String> {
        if self.roles.is_empty() {
            return Err("roles must not be empty".to_string());
        }
        for role in &self.roles {
            role.validate()?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateRoleRequest {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: i32,
    /// `None` leaves links untouched; `Some(vec![])` clears them
    #[serde(default)]
    pub permission_ids: Option<Vec<i64>>,
}

impl Validate for UpdateRoleRequest {
    fn validate(&self) -> Result<(), String> {
        check_positive("id", self.id)?;
        check_len("name", &self.name, 0, 50)?;
        check_len("code", &self.code, 0, 50)?;
        check_len("description", &self.description, 0, 255)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteRoleRequest {
    pub ids: Vec<i64>,
}

impl Validate for DeleteRoleRequest {
    fn validate(&self) -> Result<(), String> {
        check_ids("ids", &self.ids)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetRoleRequest {
    pub id: i64,
    #[serde(default)]
    pub flags: i32,
}

impl Validate for GetRoleRequest {
    fn validate(&self) -> Result<(), String> {
        check_positive("id", self.id)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetRoleListRequest {
    #[serde(default)]
    pub offset: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub status: i32,
    #[serde(default)]
    pub flags: i32,
}

impl Validate for GetRoleListRequest {
    fn validate(&self) -> Result<(), String> {
        validate_page(self.offset, self.limit)?;
        check_len("name", &self.name, 0, 50)?;
        check_len("code", &self.code, 0, 50)
    }
}

impl Filterable for GetRoleListRequest {
    fn filters(&self) -> Vec<Condition> {
        let mut conds = Vec::new();
        if !self.name.is_empty() {
            conds.push(Condition::new("name", Op::Like, self.name.clone()));
        }
        if !self.code.is_empty() {
            conds.push(Condition::new("code", Op::StartsWith, self.code.clone()));
        }
        if self.status != 0 {
            conds.push(Condition::new("status", Op::Eq, self.status));
        }
        conds
    }
}
