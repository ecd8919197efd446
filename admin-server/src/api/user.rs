//! User management endpoints

use crate::auth::jwt::Claims;
use crate::core::state::AppState;
use crate::db::models::User;
use crate::db::{DbContext, Repo};
use crate::extract::{ValidatedJson, ValidatedQuery};
use crate::service::ServiceError;
use axum::extract::State;
use axum::Extension;
use shared::params::{
    AssignRolesRequest, CreateUserRequest, DeleteUserRequest, GetUserListRequest,
    GetUserPermissionsRequest, GetUserRequest, GetUserRolesRequest, UpdateUserRequest,
};
use shared::query::Filterable;
use shared::vo::{UserRoutes, UserVo};
use shared::ApiResponse;

fn user_repo(state: &AppState) -> Repo<User> {
    Repo::new(state.db.clone())
}

/// GET /api/protected/user
pub async fn get_user(
    State(state): State<AppState>,
    ValidatedQuery(req): ValidatedQuery<GetUserRequest>,
) -> ApiResponse {
    let ctx = DbContext::new();
    let query = User {
        id: req.id,
        ..Default::default()
    };
    match user_repo(&state).find(&ctx, &query).await {
        Ok(user) => ApiResponse::success(UserVo::from(&user)),
        Err(e) => ApiResponse::database_error(e),
    }
}

/// POST /api/protected/user
pub async fn create_user(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateUserRequest>,
) -> ApiResponse {
    let ctx = DbContext::new();
    let repo = user_repo(&state);

    let mut user = User {
        username: req.username.clone(),
        password: state.crypter.fingerprint(&req.password),
        email: req.email.clone(),
        phone: req.phone.clone(),
        avatar_url: req.avatar_url.clone(),
        status: req.status,
        ..Default::default()
    };

    let tx_repo = repo.clone();
    let permissions = state.permissions.clone();
    let role_ids = req.role_ids.clone();
    let created: Result<(), ServiceError> = repo
        .transaction(&ctx, |tx_ctx| {
            let user = &mut user;
            async move {
                tx_repo.create(&tx_ctx, user).await?;
                permissions
                    .assign_user_roles(&tx_ctx, user.id, &role_ids)
                    .await
            }
        })
        .await;

    match created {
        Ok(()) => ApiResponse::success(UserVo::from(&user)),
        Err(e) => e.into(),
    }
}

/// PUT /api/protected/user
pub async fn update_user(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<UpdateUserRequest>,
) -> ApiResponse {
    let ctx = DbContext::new();
    let repo = user_repo(&state);

    let mut user = match repo.find_by_id(&ctx, req.id).await {
        Ok(user) => user,
        Err(e) => return ApiResponse::database_error(e),
    };

    if !req.username.is_empty() {
        user.username = req.username.clone();
    }
    if !req.email.is_empty() {
        user.email = req.email.clone();
    }
    if !req.phone.is_empty() {
        user.phone = req.phone.clone();
    }
    if !req.avatar_url.is_empty() {
        user.avatar_url = req.avatar_url.clone();
    }
    if req.status != 0 {
        user.status = req.status;
    }
    user.password = if req.password.is_empty() {
        String::new()
    } else {
        state.crypter.fingerprint(&req.password)
    };

    if let Err(e) = repo.update(&ctx, &user).await {
        return ApiResponse::database_error(e);
    }

    if let Some(role_ids) = &req.role_ids {
        if let Err(e) = state
            .permissions
            .assign_roles(&ctx, user.id, role_ids)
            .await
        {
            return e.into();
        }
    }

    ApiResponse::success(UserVo::from(&user))
}

/// GET /api/protected/user/list
pub async fn get_user_list(
    State(state): State<AppState>,
    ValidatedQuery(req): ValidatedQuery<GetUserListRequest>,
) -> ApiResponse {
    let ctx = DbContext::new();
    match user_repo(&state)
        .find_page(&ctx, req.filters(), req.limit, req.offset)
        .await
    {
        Ok((users, total)) => {
            let vos: Vec<UserVo> = users.iter().map(UserVo::from).collect();
            ApiResponse::page_success(vos, total)
        }
        Err(e) => ApiResponse::database_error(e),
    }
}

/// DELETE /api/protected/user
pub async fn delete_user(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<DeleteUserRequest>,
) -> ApiResponse {
    let ctx = DbContext::new();
    let repo = user_repo(&state);

    let tx_repo = repo.clone();
    let permissions = state.permissions.clone();
    let ids = req.ids.clone();
    let deleted: Result<(), ServiceError> = repo
        .transaction(&ctx, |tx_ctx| async move {
            for &id in &ids {
                // Drop role links first, then the account; caches follow
                permissions.assign_user_roles(&tx_ctx, id, &[]).await?;
                tx_repo.delete_by_id(&tx_ctx, id).await?;
            }
            Ok(())
        })
        .await;

    match deleted {
        Ok(()) => ApiResponse::no_content(),
        Err(e) => e.into(),
    }
}

/// GET /api/protected/user/routes — permission paths of the caller
pub async fn get_user_routes(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResponse {
    let ctx = DbContext::new();
    let user_id: i64 = match claims.identity.parse() {
        Ok(id) => id,
        Err(_) => return ApiResponse::unauthorized("Invalid token"),
    };
    match state.permissions.get_user_permission_paths(&ctx, user_id).await {
        Ok(routes) => ApiResponse::success(UserRoutes {
            username: claims.nice,
            role: claims.rolekey,
            routes,
        }),
        Err(e) => e.into(),
    }
}

/// GET /api/protected/user/current — identity snapshot from the token
pub async fn get_user_current(Extension(claims): Extension<Claims>) -> ApiResponse {
    ApiResponse::success(serde_json::json!({
        "name": claims.nice,
        "userid": claims.identity,
        "access": claims.rolekey,
    }))
}

/// POST /api/protected/user/assign/roles — re-sync a user's role set
pub async fn assign_roles(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<AssignRolesRequest>,
) -> ApiResponse {
    let ctx = DbContext::new();
    if let Err(e) = state
        .permissions
        .assign_roles(&ctx, req.user_id, &req.role_ids)
        .await
    {
        return e.into();
    }

    match state.permissions.get_user_roles(&ctx, req.user_id).await {
        Ok(user) => ApiResponse::success(user),
        Err(e) => e.into(),
    }
}

/// GET /api/protected/user/roles
pub async fn get_user_roles(
    State(state): State<AppState>,
    ValidatedQuery(req): ValidatedQuery<GetUserRolesRequest>,
) -> ApiResponse {
    let ctx = DbContext::new();
    match state
        .permissions
        .get_user_roles_by_flags(&ctx, req.user_id, req.flags)
        .await
    {
        Ok(user) => ApiResponse::success(user),
        Err(e) => e.into(),
    }
}

/// GET /api/protected/user/permissions
pub async fn get_user_permissions(
    State(state): State<AppState>,
    ValidatedQuery(req): ValidatedQuery<GetUserPermissionsRequest>,
) -> ApiResponse {
    let ctx = DbContext::new();
    match state
        .permissions
        .get_user_permissions(&ctx, req.user_id)
        .await
    {
        Ok(permissions) => ApiResponse::success(permissions),
        Err(e) => e.into(),
    }
}
