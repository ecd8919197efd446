//! System setting entity

use crate::db::repository::Entity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::query::{Condition, Value};

/// Declared value types
pub mod setting_type {
    pub const TEXT: i16 = 1;
    pub const NUMBER: i16 = 2;
    pub const BOOLEAN: i16 = 3;
    pub const JSON: i16 = 4;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, sqlx::FromRow)]
pub struct SystemSetting {
    #[serde(default)]
    pub id: i64,
    pub category: String,
    pub key: String,
    #[serde(default)]
    pub value: String,
    /// See [`setting_type`]
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: i16,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub create_by: i64,
    #[serde(default)]
    pub create_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub update_time: Option<DateTime<Utc>>,
}

impl Entity for SystemSetting {
    const TABLE: &'static str = "system_setting";
    const NAME: &'static str = "SystemSetting";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "category",
        "key",
        "value",
        "type",
        "description",
        "create_by",
        "create_time",
        "update_time",
    ];

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn insert_columns(&self) -> Vec<(&'static str, Value)> {
        let now = Utc::now();
        vec![
            ("category", Value::from(self.category.clone())),
            ("key", Value::from(self.key.clone())),
            ("value", Value::from(self.value.clone())),
            ("type", Value::I64(self.kind as i64)),
            ("description", Value::from(self.description.clone())),
            ("create_by", Value::from(self.create_by)),
            ("create_time", Value::from(self.create_time.unwrap_or(now))),
            ("update_time", Value::from(self.update_time.unwrap_or(now))),
        ]
    }

    fn update_columns(&self) -> Vec<(&'static str, Value)> {
        let mut columns = Vec::new();
        if !self.category.is_empty() {
            columns.push(("category", Value::from(self.category.clone())));
        }
        if !self.key.is_empty() {
            columns.push(("key", Value::from(self.key.clone())));
        }
        if !self.value.is_empty() {
            columns.push(("value", Value::from(self.value.clone())));
        }
        if self.kind != 0 {
            columns.push(("type", Value::I64(self.kind as i64)));
        }
        if !self.description.is_empty() {
            columns.push(("description", Value::from(self.description.clone())));
        }
        columns.push(("update_time", Value::from(Utc::now())));
        columns
    }

    fn filter_conditions(&self) -> Vec<Condition> {
        let mut conds = Vec::new();
        if self.id != 0 {
            conds.push(Condition::eq("id", self.id));
        }
        if !self.category.is_empty() {
            conds.push(Condition::eq("category", self.category.clone()));
        }
        if !self.key.is_empty() {
            conds.push(Condition::eq("key", self.key.clone()));
        }
        if self.kind != 0 {
            conds.push(Condition::eq("type", self.kind as i64));
        }
        conds
    }
}
