//! System setting view object

use super::UserVo;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemSettingVo {
    pub id: i64,
    pub category: String,
    pub key: String,
    pub value: String,
    pub r#type: u8,
    pub type_display: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_by: Option<UserVo>,
    pub create_time: Option<DateTime<Utc>>,
    pub update_time: Option<DateTime<Utc>>,
}
