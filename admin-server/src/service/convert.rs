//! Model to view-object conversion

use crate::db::models::{Permission, Role, SystemSetting, User};
use shared::vo::{PermissionVo, RoleVo, SystemSettingVo, UserVo};

impl From<&User> for UserVo {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            avatar_url: user.avatar_url.clone(),
            roles: None,
            status: user.status,
            create_time: user.create_time,
            update_time: user.update_time,
            last_login_time: user.last_login_time,
        }
    }
}

impl From<&Role> for RoleVo {
    fn from(role: &Role) -> Self {
        Self {
            id: role.id,
            name: role.name.clone(),
            code: role.code.clone(),
            description: role.description.clone(),
            status: role.status,
            create_time: role.create_time,
            update_time: role.update_time,
            permissions: None,
        }
    }
}

impl From<&Permission> for PermissionVo {
    fn from(perm: &Permission) -> Self {
        Self {
            id: perm.id,
            name: perm.name.clone(),
            code: perm.code.clone(),
            description: perm.description.clone(),
            parent_id: perm.parent_id,
            r#type: perm.kind,
            path: perm.path.clone(),
            method: perm.method.clone(),
            status: perm.status,
            create_time: perm.create_time,
            update_time: perm.update_time,
            children: None,
        }
    }
}

/// Display name for a setting value type
pub fn setting_type_display(kind: i16) -> &'static str {
    match kind {
        1 => "text",
        2 => "number",
        3 => "boolean",
        4 => "json",
        _ => "unknown",
    }
}

impl From<&SystemSetting> for SystemSettingVo {
    fn from(setting: &SystemSetting) -> Self {
        Self {
            id: setting.id,
            category: setting.category.clone(),
            key: setting.key.clone(),
            value: setting.value.clone(),
            r#type: setting.kind as u8,
            type_display: setting_type_display(setting.kind).to_string(),
            description: setting.description.clone(),
            create_by: None,
            create_time: setting.create_time,
            update_time: setting.update_time,
        }
    }
}
