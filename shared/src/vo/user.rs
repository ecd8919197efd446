//! User / role / permission view objects

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserVo {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub phone: String,
    pub avatar_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<RoleVo>>,
    pub status: i32,
    pub create_time: Option<DateTime<Utc>>,
    pub update_time: Option<DateTime<Utc>>,
    pub last_login_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleVo {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub description: String,
    pub status: i32,
    pub create_time: Option<DateTime<Utc>>,
    pub update_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<PermissionVo>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionVo {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub description: String,
    pub parent_id: i64,
    pub r#type: i32,
    pub path: String,
    pub method: String,
    pub status: i32,
    pub create_time: Option<DateTime<Utc>>,
    pub update_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<PermissionVo>>,
}

/// Routes the caller is allowed to reach, as `method:path` strings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRoutes {
    pub username: String,
    pub role: String,
    pub routes: Vec<String>,
}
