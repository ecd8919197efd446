//! Typed system settings
//!
//! Every stored value must parse under its declared type; numbers go through
//! the fixed-precision decimal coercion so `"12.50"` survives intact.

use super::convert::setting_type_display;
use super::{ServiceError, ServiceResult};
use crate::db::models::{setting_type, SystemSetting, User};
use crate::db::{DbContext, Repo};
use serde_json::Value;
use shared::params::{
    CreateSystemSettingRequest, GetSystemSettingListRequest, UpdateSystemSettingRequest,
};
use shared::query::Filterable;
use shared::vo::{SystemSettingVo, UserVo};

/// Keys that must never be deleted
const CORE_SETTINGS: &[&str] = &[
    "system.name",
    "system.version",
    "database.version",
    "security.jwt_secret",
];

pub struct SystemSettingService {
    setting_repo: Repo<SystemSetting>,
    user_repo: Repo<User>,
}

impl SystemSettingService {
    pub fn new(setting_repo: Repo<SystemSetting>, user_repo: Repo<User>) -> Self {
        Self {
            setting_repo,
            user_repo,
        }
    }

    pub async fn create(
        &self,
        ctx: &DbContext,
        req: &CreateSystemSettingRequest,
        create_by: i64,
    ) -> ServiceResult<SystemSettingVo> {
        self.check_key_unique(ctx, &req.key, 0).await?;
        validate_setting_value(req.r#type as i16, &req.value)?;

        let mut setting = SystemSetting {
            category: req.category.clone(),
            key: req.key.clone(),
            value: req.value.clone(),
            kind: req.r#type as i16,
            description: req.description.clone(),
            create_by,
            ..Default::default()
        };
        self.setting_repo.create(ctx, &mut setting).await?;

        tracing::info!(
            setting_id = setting.id,
            key = %setting.key,
            category = %setting.category,
            "System setting created"
        );
        self.pack_vo(ctx, &setting).await
    }

    pub async fn update(
        &self,
        ctx: &DbContext,
        req: &UpdateSystemSettingRequest,
    ) -> ServiceResult<SystemSettingVo> {
        let mut setting = self.setting_repo.find_by_id(ctx, req.id).await?;

        if !req.key.is_empty() && req.key != setting.key {
            self.check_key_unique(ctx, &req.key, setting.id).await?;
            setting.key = req.key.clone();
        }
        if !req.category.is_empty() {
            setting.category = req.category.clone();
        }
        if req.r#type != 0 {
            setting.kind = req.r#type as i16;
        }
        if !req.value.is_empty() {
            setting.value = req.value.clone();
        }
        if !req.description.is_empty() {
            setting.description = req.description.clone();
        }
        validate_setting_value(setting.kind, &setting.value)?;

        self.setting_repo.update(ctx, &setting).await?;
        tracing::info!(setting_id = setting.id, key = %setting.key, "System setting updated");
        self.pack_vo(ctx, &setting).await
    }

    pub async fn delete_batch(&self, ctx: &DbContext, ids: &[i64]) -> ServiceResult<()> {
        let mut failures = Vec::new();
        for &id in ids {
            if let Err(e) = self.delete_one(ctx, id).await {
                failures.push(format!("setting {id}: {e}"));
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::Business(failures.join("; ")))
        }
    }

    async fn delete_one(&self, ctx: &DbContext, id: i64) -> ServiceResult<()> {
        let setting = self.setting_repo.find_by_id(ctx, id).await?;
        if CORE_SETTINGS.contains(&setting.key.as_str()) {
            return Err(ServiceError::Business(format!(
                "core setting '{}' cannot be deleted",
                setting.key
            )));
        }
        self.setting_repo.delete_by_id(ctx, id).await?;
        Ok(())
    }

    pub async fn get(&self, ctx: &DbContext, id: i64) -> ServiceResult<SystemSettingVo> {
        let setting = self.setting_repo.find_by_id(ctx, id).await?;
        self.pack_vo(ctx, &setting).await
    }

    pub async fn get_list(
        &self,
        ctx: &DbContext,
        req: &GetSystemSettingListRequest,
    ) -> ServiceResult<(Vec<SystemSettingVo>, i64)> {
        let (settings, total) = self
            .setting_repo
            .find_page(ctx, req.filters(), req.limit, req.offset)
            .await?;
        let mut vos = Vec::with_capacity(settings.len());
        for setting in &settings {
            vos.push(self.pack_vo(ctx, setting).await?);
        }
        Ok((vos, total))
    }

    pub async fn get_by_category(
        &self,
        ctx: &DbContext,
        category: &str,
    ) -> ServiceResult<Vec<SystemSettingVo>> {
        let settings = self
            .setting_repo
            .query_builder()
            .eq("category", category)
            .order_by("key ASC")
            .find(ctx)
            .await?;
        let mut vos = Vec::with_capacity(settings.len());
        for setting in &settings {
            vos.push(self.pack_vo(ctx, setting).await?);
        }
        Ok(vos)
    }

    pub async fn get_by_key(&self, ctx: &DbContext, key: &str) -> ServiceResult<SystemSetting> {
        Ok(self.setting_repo.find_by_key(ctx, "key", key).await?)
    }

    /// Typed value lookup with a default when missing or unparsable
    pub async fn get_value(&self, ctx: &DbContext, key: &str, default: Value) -> Value {
        let Ok(setting) = self.get_by_key(ctx, key).await else {
            return default;
        };
        decode_setting_value(setting.kind, &setting.value).unwrap_or(default)
    }

    /// Create-or-update by key
    pub async fn set(
        &self,
        ctx: &DbContext,
        category: &str,
        key: &str,
        value: &str,
        description: &str,
        kind: i16,
        create_by: i64,
    ) -> ServiceResult<()> {
        match self.get_by_key(ctx, key).await {
            Err(_) => {
                let req = CreateSystemSettingRequest {
                    category: category.to_string(),
                    key: key.to_string(),
                    value: value.to_string(),
                    r#type: kind as u8,
                    description: description.to_string(),
                };
                self.create(ctx, &req, create_by).await?;
                Ok(())
            }
            Ok(mut existing) => {
                validate_setting_value(kind, value)?;
                existing.category = category.to_string();
                existing.value = value.to_string();
                existing.kind = kind;
                existing.description = description.to_string();
                self.setting_repo.update(ctx, &existing).await?;
                Ok(())
            }
        }
    }

    async fn check_key_unique(
        &self,
        ctx: &DbContext,
        key: &str,
        exclude_id: i64,
    ) -> ServiceResult<()> {
        let mut builder = self.setting_repo.query_builder().eq("key", key);
        if exclude_id > 0 {
            builder = builder.ne("id", exclude_id);
        }
        let count = builder.count(ctx).await?;
        if count > 0 {
            return Err(ServiceError::Conflict("setting key already exists".into()));
        }
        Ok(())
    }

    async fn pack_vo(
        &self,
        ctx: &DbContext,
        setting: &SystemSetting,
    ) -> ServiceResult<SystemSettingVo> {
        let mut vo = SystemSettingVo::from(setting);
        if setting.create_by > 0 {
            if let Ok(creator) = self.user_repo.find_by_id(ctx, setting.create_by).await {
                vo.create_by = Some(UserVo::from(&creator));
            }
        }
        Ok(vo)
    }
}

/// Accepts the usual boolean spellings: true/false, 1/0, t/f
fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "t" => Some(true),
        "false" | "0" | "f" => Some(false),
        _ => None,
    }
}

/// Reject values that do not parse under the declared type
pub fn validate_setting_value(kind: i16, value: &str) -> Result<(), ServiceError> {
    match kind {
        setting_type::TEXT => Ok(()),
        setting_type::NUMBER => shared::decimal::parse_loose(value)
            .map(|_| ())
            .map_err(|_| ServiceError::Business("invalid number value".into())),
        setting_type::BOOLEAN => parse_bool(value)
            .map(|_| ())
            .ok_or_else(|| ServiceError::Business("invalid boolean value".into())),
        setting_type::JSON => serde_json::from_str::<Value>(value)
            .map(|_| ())
            .map_err(|_| ServiceError::Business("invalid JSON value".into())),
        _ => Err(ServiceError::Business(format!(
            "invalid setting type: {}",
            setting_type_display(kind)
        ))),
    }
}

/// Decode a stored value under its declared type
fn decode_setting_value(kind: i16, value: &str) -> Option<Value> {
    match kind {
        setting_type::TEXT => Some(Value::String(value.to_string())),
        setting_type::NUMBER => {
            if let Ok(int) = value.parse::<i64>() {
                return Some(Value::from(int));
            }
            value.parse::<f64>().ok().and_then(|f| {
                serde_json::Number::from_f64(f).map(Value::Number)
            })
        }
        setting_type::BOOLEAN => parse_bool(value).map(Value::Bool),
        setting_type::JSON => serde_json::from_str(value).ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_validate_text_always_ok() {
        assert!(validate_setting_value(setting_type::TEXT, "anything").is_ok());
    }

    #[test]
    fn test_validate_number() {
        assert!(validate_setting_value(setting_type::NUMBER, "12.5").is_ok());
        assert!(validate_setting_value(setting_type::NUMBER, "12").is_ok());
        assert!(validate_setting_value(setting_type::NUMBER, "twelve").is_err());
    }

    #[test]
    fn test_validate_boolean() {
        assert!(validate_setting_value(setting_type::BOOLEAN, "true").is_ok());
        assert!(validate_setting_value(setting_type::BOOLEAN, "0").is_ok());
        assert!(validate_setting_value(setting_type::BOOLEAN, "yes").is_err());
    }

    #[test]
    fn test_validate_json() {
        assert!(validate_setting_value(setting_type::JSON, r#"{"a":1}"#).is_ok());
        assert!(validate_setting_value(setting_type::JSON, "{oops").is_err());
    }

    #[test]
    fn test_validate_unknown_type_rejected() {
        assert!(validate_setting_value(9, "x").is_err());
    }

    #[test]
    fn test_decode_setting_value() {
        assert_eq!(
            decode_setting_value(setting_type::NUMBER, "42"),
            Some(json!(42))
        );
        assert_eq!(
            decode_setting_value(setting_type::NUMBER, "2.5"),
            Some(json!(2.5))
        );
        assert_eq!(
            decode_setting_value(setting_type::BOOLEAN, "t"),
            Some(json!(true))
        );
        assert_eq!(
            decode_setting_value(setting_type::JSON, r#"[1,2]"#),
            Some(json!([1, 2]))
        );
        assert_eq!(decode_setting_value(setting_type::BOOLEAN, "maybe"), None);
    }
}
