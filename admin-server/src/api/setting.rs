//! System setting endpoints

use crate::auth::jwt::Claims;
use crate::core::state::AppState;
use crate::db::DbContext;
use crate::extract::{ValidatedJson, ValidatedQuery};
use axum::extract::State;
use axum::Extension;
use shared::params::{
    CreateSystemSettingRequest, DeleteSystemSettingRequest, GetSystemSettingByCategoryRequest,
    GetSystemSettingListRequest, GetSystemSettingRequest, UpdateSystemSettingRequest,
};
use shared::ApiResponse;

/// POST /api/protected/system-setting
pub async fn create_setting(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ValidatedJson(req): ValidatedJson<CreateSystemSettingRequest>,
) -> ApiResponse {
    let ctx = DbContext::new();
    let create_by = claims.identity.parse().unwrap_or(0);
    match state.settings.create(&ctx, &req, create_by).await {
        Ok(setting) => ApiResponse::success(setting),
        Err(e) => e.into(),
    }
}

/// GET /api/protected/system-setting
pub async fn get_setting(
    State(state): State<AppState>,
    ValidatedQuery(req): ValidatedQuery<GetSystemSettingRequest>,
) -> ApiResponse {
    let ctx = DbContext::new();
    match state.settings.get(&ctx, req.id).await {
        Ok(setting) => ApiResponse::success(setting),
        Err(e) => e.into(),
    }
}

/// GET /api/protected/system-setting/list
pub async fn get_setting_list(
    State(state): State<AppState>,
    ValidatedQuery(req): ValidatedQuery<GetSystemSettingListRequest>,
) -> ApiResponse {
    let ctx = DbContext::new();
    match state.settings.get_list(&ctx, &req).await {
        Ok((settings, total)) => ApiResponse::page_success(settings, total),
        Err(e) => e.into(),
    }
}

/// PUT /api/protected/system-setting
pub async fn update_setting(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<UpdateSystemSettingRequest>,
) -> ApiResponse {
    let ctx = DbContext::new();
    match state.settings.update(&ctx, &req).await {
        Ok(setting) => ApiResponse::success(setting),
        Err(e) => e.into(),
    }
}

/// DELETE /api/protected/system-setting
pub async fn delete_setting(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<DeleteSystemSettingRequest>,
) -> ApiResponse {
    let ctx = DbContext::new();
    match state.settings.delete_batch(&ctx, &req.ids).await {
        Ok(()) => ApiResponse::no_content(),
        Err(e) => e.into(),
    }
}

/// GET /api/protected/system-setting/by-category
pub async fn get_settings_by_category(
    State(state): State<AppState>,
    ValidatedQuery(req): ValidatedQuery<GetSystemSettingByCategoryRequest>,
) -> ApiResponse {
    let ctx = DbContext::new();
    match state.settings.get_by_category(&ctx, &req.category).await {
        Ok(settings) => ApiResponse::success(settings),
        Err(e) => e.into(),
    }
}
