//! Role management endpoints

use crate::core::state::AppState;
use crate::db::DbContext;
use crate::extract::{ValidatedJson, ValidatedQuery};
use axum::extract::State;
use shared::params::{
    CreateRoleRequest, CreateRolesRequest, DeleteRoleRequest, GetRoleListRequest,
    GetRolePermissionsRequest, GetRoleRequest, UpdateRoleRequest,
};
use shared::vo::RoleVo;
use shared::ApiResponse;

/// POST /api/protected/role
pub async fn create_role(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateRoleRequest>,
) -> ApiResponse {
    let ctx = DbContext::new();
    match state.permissions.create_role(&ctx, &req).await {
        Ok(role) => ApiResponse::success(role),
        Err(e) => e.into(),
    }
}

/// POST /api/protected/role/batch
pub async fn create_role_batch(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateRolesRequest>,
) -> ApiResponse {
    let ctx = DbContext::new();
    let mut result: Vec<RoleVo> = Vec::with_capacity(req.roles.len());
    for role_req in &req.roles {
        match state.permissions.create_role(&ctx, role_req).await {
            Ok(role) => result.push(role),
            Err(e) => return e.into(),
        }
    }
    ApiResponse::success(result)
}

/// PUT /api/protected/role
pub async fn update_role(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<UpdateRoleRequest>,
) -> ApiResponse {
    let ctx = DbContext::new();
    match state.permissions.update_role(&ctx, &req).await {
        Ok(role) => ApiResponse::success(role),
        Err(e) => e.into(),
    }
}

/// DELETE /api/protected/role
pub async fn delete_role(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<DeleteRoleRequest>,
) -> ApiResponse {
    let ctx = DbContext::new();
    match state.permissions.delete_role_batch(&ctx, &req.ids).await {
        Ok(()) => ApiResponse::no_content(),
        Err(e) => e.into(),
    }
}

/// GET /api/protected/role
pub async fn get_role(
    State(state): State<AppState>,
    ValidatedQuery(req): ValidatedQuery<GetRoleRequest>,
) -> ApiResponse {
    let ctx = DbContext::new();
    match state.permissions.get_role(&ctx, req.id).await {
        Ok(role) => ApiResponse::success(role),
        Err(e) => e.into(),
    }
}

/// GET /api/protected/role/list
pub async fn get_role_list(
    State(state): State<AppState>,
    ValidatedQuery(req): ValidatedQuery<GetRoleListRequest>,
) -> ApiResponse {
    let ctx = DbContext::new();
    match state.permissions.get_role_list(&ctx, &req).await {
        Ok((roles, total)) => ApiResponse::page_success(roles, total),
        Err(e) => e.into(),
    }
}

/// GET /api/protected/role/permission/list
pub async fn get_role_permissions(
    State(state): State<AppState>,
    ValidatedQuery(req): ValidatedQuery<GetRolePermissionsRequest>,
) -> ApiResponse {
    let ctx = DbContext::new();
    match state.permissions.get_role_permissions(&ctx, req.role_id).await {
        Ok(permissions) => ApiResponse::success(permissions),
        Err(e) => e.into(),
    }
}
