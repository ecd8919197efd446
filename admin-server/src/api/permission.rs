//! Permission management endpoints

use crate::core::state::AppState;
use crate::db::DbContext;
use crate::extract::{ValidatedJson, ValidatedQuery};
use axum::extract::State;
use shared::params::{
    CreatePermissionRequest, CreatePermissionsRequest, DeletePermissionRequest,
    GetPermissionListRequest, GetPermissionRequest, UpdatePermissionRequest,
};
use shared::ApiResponse;

/// POST /api/protected/permission
pub async fn create_permission(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreatePermissionRequest>,
) -> ApiResponse {
    let ctx = DbContext::new();
    match state.permissions.create_permission(&ctx, &req).await {
        Ok(permission) => ApiResponse::success(permission),
        Err(e) => e.into(),
    }
}

/// POST /api/protected/permission/batch
pub async fn create_permission_batch(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreatePermissionsRequest>,
) -> ApiResponse {
    let ctx = DbContext::new();
    match state.permissions.create_permissions(&ctx, &req).await {
        Ok(()) => ApiResponse::success(()),
        Err(e) => e.into(),
    }
}

/// PUT /api/protected/permission
pub async fn update_permission(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<UpdatePermissionRequest>,
) -> ApiResponse {
    let ctx = DbContext::new();
    match state.permissions.update_permission(&ctx, &req).await {
        Ok(permission) => ApiResponse::success(permission),
        Err(e) => e.into(),
    }
}

/// DELETE /api/protected/permission
pub async fn delete_permission(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<DeletePermissionRequest>,
) -> ApiResponse {
    let ctx = DbContext::new();
    match state.permissions.delete_permission_batch(&ctx, &req.ids).await {
        Ok(()) => ApiResponse::no_content(),
        Err(e) => e.into(),
    }
}

/// GET /api/protected/permission
pub async fn get_permission(
    State(state): State<AppState>,
    ValidatedQuery(req): ValidatedQuery<GetPermissionRequest>,
) -> ApiResponse {
    let ctx = DbContext::new();
    match state.permissions.get_permission(&ctx, req.id).await {
        Ok(permission) => ApiResponse::success(permission),
        Err(e) => e.into(),
    }
}

/// GET /api/protected/permission/list
pub async fn get_permission_list(
    State(state): State<AppState>,
    ValidatedQuery(req): ValidatedQuery<GetPermissionListRequest>,
) -> ApiResponse {
    let ctx = DbContext::new();
    match state.permissions.get_permission_list(&ctx, &req).await {
        Ok((permissions, total)) => ApiResponse::page_success(permissions, total),
        Err(e) => e.into(),
    }
}
