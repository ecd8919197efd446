//! System setting requests

use super::page::{default_limit, validate_page};
use super::{check_ids, check_len, check_positive, Validate};
use crate::query::{Condition, Filterable, Op};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSystemSettingRequest {
    pub category: String,
    pub key: String,
    #[serde(default)]
    pub value: String,
    /// 1: text, 2: number, 3: boolean, 4: json
    pub r#type: u8,
    #[serde(default)]
    pub description: String,
}

impl Validate for CreateSystemSettingRequest {
    fn validate(&self) -> Result<(), String> {
        check_len("category", &self.category, 1, 50)?;
        check_len("key", &self.key, 1, 50)?;
        if self.r#type == 0 || self.r#type > 4 {
            return Err("type must be between 1 and 4".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateSystemSettingRequest {
    pub id: i64,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub r#type: u8,
    #[serde(default)]
    pub description: String,
}

impl Validate for UpdateSystemSettingRequest {
    fn validate(&self) -> Result<(), String> {
        check_positive("id", self.id)?;
        check_len("category", &self.category, 0, 50)?;
        check_len("key", &self.key, 0, 50)?;
        if self.r#type > 4 {
            return Err("type must be between 0 and 4".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteSystemSettingRequest {
    pub ids: Vec<i64>,
}

impl Validate for DeleteSystemSettingRequest {
    fn validate(&self) -> Result<(), String> {
        check_ids("ids", &self.ids)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetSystemSettingRequest {
    pub id: i64,
}

impl Validate for GetSystemSettingRequest {
    fn validate(&self) -> Result<(), String> {
        check_positive("id", self.id)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetSystemSettingListRequest {
    #[serde(default)]
    pub offset: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub r#type: u8,
}

impl Validate for GetSystemSettingListRequest {
    fn validate(&self) -> Result<(), String> {
        validate_page(self.offset, self.limit)?;
        check_len("category", &self.category, 0, 50)?;
        check_len("key", &self.key, 0, 50)
    }
}

impl Filterable for GetSystemSettingListRequest {
    fn filters(&self) -> Vec<Condition> {
        let mut conds = Vec::new();
        if !self.category.is_empty() {
            conds.push(Condition::new("category", Op::Eq, self.category.clone()));
        }
        if !self.key.is_empty() {
            conds.push(Condition::new("key", Op::Like, self.key.clone()));
        }
        if self.r#type != 0 {
            conds.push(Condition::new("type", Op::Eq, self.r#type));
        }
        conds
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetSystemSettingByCategoryRequest {
    pub category: String,
}

impl Validate for GetSystemSettingByCategoryRequest {
    fn validate(&self) -> Result<(), String> {
        check_len("category", &self.category, 1, 50)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_requires_valid_type() {
        let mut req = CreateSystemSettingRequest {
            category: "system".into(),
            key: "system.name".into(),
            value: "admin".into(),
            r#type: 1,
            description: String::new(),
        };
        assert!(req.validate().is_ok());
        req.r#type = 5;
        assert!(req.validate().is_err());
        req.r#type = 0;
        assert!(req.validate().is_err());
    }
}
