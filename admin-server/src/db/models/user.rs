//! User, role and permission entities

use crate::db::repository::Entity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::query::{Condition, Value};

/// Account status: 1 = active, 0 = disabled
pub const STATUS_ACTIVE: i32 = 1;

#[derive(Debug, Clone, Default, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    #[serde(default)]
    pub id: i64,
    pub username: String,
    /// Keyed-hash fingerprint, never the plaintext
    #[serde(skip_serializing)]
    #[serde(default)]
    pub password: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub avatar_url: String,
    #[serde(default)]
    pub status: i32,
    #[serde(default)]
    pub create_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub update_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_login_time: Option<DateTime<Utc>>,
}

impl Entity for User {
    const TABLE: &'static str = "user";
    const NAME: &'static str = "User";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "username",
        "password",
        "email",
        "phone",
        "avatar_url",
        "status",
        "create_time",
        "update_time",
        "last_login_time",
    ];

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn insert_columns(&self) -> Vec<(&'static str, Value)> {
        let now = Utc::now();
        let mut columns = vec![
            ("username", Value::from(self.username.clone())),
            ("password", Value::from(self.password.clone())),
            ("email", Value::from(self.email.clone())),
            ("phone", Value::from(self.phone.clone())),
            ("avatar_url", Value::from(self.avatar_url.clone())),
            ("status", Value::from(self.status)),
            ("create_time", Value::from(self.create_time.unwrap_or(now))),
            ("update_time", Value::from(self.update_time.unwrap_or(now))),
        ];
        if let Some(t) = self.last_login_time {
            columns.push(("last_login_time", Value::from(t)));
        }
        columns
    }

    fn update_columns(&self) -> Vec<(&'static str, Value)> {
        let mut columns = Vec::new();
        if !self.username.is_empty() {
            columns.push(("username", Value::from(self.username.clone())));
        }
        if !self.password.is_empty() {
            columns.push(("password", Value::from(self.password.clone())));
        }
        if !self.email.is_empty() {
            columns.push(("email", Value::from(self.email.clone())));
        }
        if !self.phone.is_empty() {
            columns.push(("phone", Value::from(self.phone.clone())));
        }
        if !self.avatar_url.is_empty() {
            columns.push(("avatar_url", Value::from(self.avatar_url.clone())));
        }
        if self.status != 0 {
            columns.push(("status", Value::from(self.status)));
        }
        if let Some(t) = self.last_login_time {
            columns.push(("last_login_time", Value::from(t)));
        }
        columns.push(("update_time", Value::from(Utc::now())));
        columns
    }

    fn filter_conditions(&self) -> Vec<Condition> {
        let mut conds = Vec::new();
        if self.id != 0 {
            conds.push(Condition::eq("id", self.id));
        }
        if !self.username.is_empty() {
            conds.push(Condition::eq("username", self.username.clone()));
        }
        if !self.email.is_empty() {
            conds.push(Condition::eq("email", self.email.clone()));
        }
        if !self.phone.is_empty() {
            conds.push(Condition::eq("phone", self.phone.clone()));
        }
        if self.status != 0 {
            conds.push(Condition::eq("status", self.status));
        }
        conds
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, sqlx::FromRow)]
pub struct Role {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: i32,
    #[serde(default)]
    pub create_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub update_time: Option<DateTime<Utc>>,
}

impl Entity for Role {
    const TABLE: &'static str = "role";
    const NAME: &'static str = "Role";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "code",
        "description",
        "status",
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
            ("name", Value::from(self.name.clone())),
            ("code", Value::from(self.code.clone())),
            ("description", Value::from(self.description.clone())),
            ("status", Value::from(self.status)),
            ("create_time", Value::from(self.create_time.unwrap_or(now))),
            ("update_time", Value::from(self.update_time.unwrap_or(now))),
        ]
    }

    fn update_columns(&self) -> Vec<(&'static str, Value)> {
        let mut columns = Vec::new();
        if !self.name.is_empty() {
            columns.push(("name", Value::from(self.name.clone())));
        }
        if !self.code.is_empty() {
            columns.push(("code", Value::from(self.code.clone())));
        }
        if !self.description.is_empty() {
            columns.push(("description", Value::from(self.description.clone())));
        }
        if self.status != 0 {
            columns.push(("status", Value::from(self.status)));
        }
        columns.push(("update_time", Value::from(Utc::now())));
        columns
    }

    fn filter_conditions(&self) -> Vec<Condition> {
        let mut conds = Vec::new();
        if self.id != 0 {
            conds.push(Condition::eq("id", self.id));
        }
        if !self.name.is_empty() {
            conds.push(Condition::eq("name", self.name.clone()));
        }
        if !self.code.is_empty() {
            conds.push(Condition::eq("code", self.code.clone()));
        }
        if self.status != 0 {
            conds.push(Condition::eq("status", self.status));
        }
        conds
    }
}

/// Permission node. `parent_id = 0` marks a root; a node with empty `method`
/// and `path` is a pure grouping node.
#[derive(Debug, Clone, Default, Serialize, Deserialize, sqlx::FromRow)]
pub struct Permission {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parent_id: i64,
    /// 1: menu, 2: button, 3: api
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    #[serde(default)]
    pub kind: i32,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub status: i32,
    #[serde(default)]
    pub create_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub update_time: Option<DateTime<Utc>>,
}

impl Entity for Permission {
    const TABLE: &'static str = "permission";
    const NAME: &'static str = "Permission";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "code",
        "description",
        "parent_id",
        "type",
        "path",
        "method",
        "status",
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
            ("name", Value::from(self.name.clone())),
            ("code", Value::from(self.code.clone())),
            ("description", Value::from(self.description.clone())),
            ("parent_id", Value::from(self.parent_id)),
            ("type", Value::from(self.kind)),
            ("path", Value::from(self.path.clone())),
            ("method", Value::from(self.method.clone())),
            ("status", Value::from(self.status)),
            ("create_time", Value::from(self.create_time.unwrap_or(now))),
            ("update_time", Value::from(self.update_time.unwrap_or(now))),
        ]
    }

    fn update_columns(&self) -> Vec<(&'static str, Value)> {
        let mut columns = Vec::new();
        if !self.name.is_empty() {
            columns.push(("name", Value::from(self.name.clone())));
        }
        if !self.code.is_empty() {
            columns.push(("code", Value::from(self.code.clone())));
        }
        if !self.description.is_empty() {
            columns.push(("description", Value::from(self.description.clone())));
        }
        if self.parent_id != 0 {
            columns.push(("parent_id", Value::from(self.parent_id)));
        }
        if self.kind != 0 {
            columns.push(("type", Value::from(self.kind)));
        }
        if !self.path.is_empty() {
            columns.push(("path", Value::from(self.path.clone())));
        }
        if !self.method.is_empty() {
            columns.push(("method", Value::from(self.method.clone())));
        }
        if self.status != 0 {
            columns.push(("status", Value::from(self.status)));
        }
        columns.push(("update_time", Value::from(Utc::now())));
        columns
    }

    fn filter_conditions(&self) -> Vec<Condition> {
        let mut conds = Vec::new();
        if self.id != 0 {
            conds.push(Condition::eq("id", self.id));
        }
        if !self.name.is_empty() {
            conds.push(Condition::eq("name", self.name.clone()));
        }
        if !self.code.is_empty() {
            conds.push(Condition::eq("code", self.code.clone()));
        }
        if self.parent_id != 0 {
            conds.push(Condition::eq("parent_id", self.parent_id));
        }
        if self.kind != 0 {
            conds.push(Condition::eq("type", self.kind));
        }
        if !self.path.is_empty() {
            conds.push(Condition::eq("path", self.path.clone()));
        }
        if !self.method.is_empty() {
            conds.push(Condition::eq("method", self.method.clone()));
        }
        if self.status != 0 {
            conds.push(Condition::eq("status", self.status));
        }
        conds
    }
}

/// user ↔ role link row; (user_id, role_id) is unique
#[derive(Debug, Clone, Default, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserRole {
    #[serde(default)]
    pub id: i64,
    pub user_id: i64,
    pub role_id: i64,
}

impl Entity for UserRole {
    const TABLE: &'static str = "user_role";
    const NAME: &'static str = "UserRole";
    const COLUMNS: &'static [&'static str] = &["id", "user_id", "role_id"];

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn insert_columns(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("user_id", Value::from(self.user_id)),
            ("role_id", Value::from(self.role_id)),
        ]
    }

    fn update_columns(&self) -> Vec<(&'static str, Value)> {
        let mut columns = Vec::new();
        if self.user_id != 0 {
            columns.push(("user_id", Value::from(self.user_id)));
        }
        if self.role_id != 0 {
            columns.push(("role_id", Value::from(self.role_id)));
        }
        columns
    }

    fn filter_conditions(&self) -> Vec<Condition> {
        let mut conds = Vec::new();
        if self.id != 0 {
            conds.push(Condition::eq("id", self.id));
        }
        if self.user_id != 0 {
            conds.push(Condition::eq("user_id", self.user_id));
        }
        if self.role_id != 0 {
            conds.push(Condition::eq("role_id", self.role_id));
        }
        conds
    }
}

/// role ↔ permission link row; (role_id, permission_id) is unique
#[derive(Debug, Clone, Default, Serialize, Deserialize, sqlx::FromRow)]
pub struct RolePermission {
    #[serde(default)]
    pub id: i64,
    pub role_id: i64,
    pub permission_id: i64,
}

impl Entity for RolePermission {
    const TABLE: &'static str = "role_permission";
    const NAME: &'static str = "RolePermission";
    const COLUMNS: &'static [&'static str] = &["id", "role_id", "permission_id"];

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn insert_columns(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("role_id", Value::from(self.role_id)),
            ("permission_id", Value::from(self.permission_id)),
        ]
    }

    fn update_columns(&self) -> Vec<(&'static str, Value)> {
        let mut columns = Vec::new();
        if self.role_id != 0 {
            columns.push(("role_id", Value::from(self.role_id)));
        }
        if self.permission_id != 0 {
            columns.push(("permission_id", Value::from(self.permission_id)));
        }
        columns
    }

    fn filter_conditions(&self) -> Vec<Condition> {
        let mut conds = Vec::new();
        if self.id != 0 {
            conds.push(Condition::eq("id", self.id));
        }
        if self.role_id != 0 {
            conds.push(Condition::eq("role_id", self.role_id));
        }
        if self.permission_id != 0 {
            conds.push(Condition::eq("permission_id", self.permission_id));
        }
        conds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_column_resolved_from_descriptor() {
        assert_eq!(User::id_column(), "id");
        assert_eq!(UserRole::id_column(), "id");
        assert_eq!(RolePermission::id_column(), "id");
    }

    #[test]
    fn test_user_filter_skips_zero_fields() {
        let user = User {
            username: "admin".to_string(),
            ..Default::default()
        };
        let conds = user.filter_conditions();
        assert_eq!(conds.len(), 1);
        assert_eq!(conds[0].field, "username");
    }

    #[test]
    fn test_user_update_always_touches_update_time() {
        let user = User::default();
        let columns = user.update_columns();
        assert_eq!(columns.len(), 1);
        assert_eq!(columns[0].0, "update_time");
    }

    #[test]
    fn test_link_row_filters() {
        let link = UserRole {
            id: 0,
            user_id: 7,
            role_id: 0,
        };
        let conds = link.filter_conditions();
        assert_eq!(conds.len(), 1);
        assert_eq!(conds[0].field, "user_id");
    }

    #[test]
    fn test_permission_insert_includes_grouping_fields() {
        let perm = Permission {
            name: "System".into(),
            code: "system".into(),
            kind: 1,
            status: 1,
            ..Default::default()
        };
        let columns = perm.insert_columns();
        // Empty path/method are still written so grouping nodes round-trip
        assert!(columns.iter().any(|(name, _)| *name == "path"));
        assert!(columns.iter().any(|(name, _)| *name == "method"));
    }
}
