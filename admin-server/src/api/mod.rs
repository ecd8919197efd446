//! API routes
//!
//! Explicit route tables: method + path + handler. Public routes take the
//! governance layers only; everything under `/api/protected` additionally
//! goes through the bearer auth + RBAC gate.

pub mod auth;
pub mod hello;
pub mod permission;
pub mod role;
pub mod setting;
pub mod user;

use crate::auth::middleware::jwt_middleware;
use crate::core::state::AppState;
use crate::governance::rate_limit::rate_limit_middleware;
use crate::governance::redis_limit::redis_rate_limit_middleware;
use crate::governance::sentinel::sentinel_middleware;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{middleware, Router};
use shared::error::AppError;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

/// Top-level recovery: a panicking handler answers a 500 envelope instead of
/// tearing the connection down. No stack trace leaves the process.
fn handle_panic(err: Box<dyn std::any::Any + Send + 'static>) -> axum::response::Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = detail, "Handler panicked");
    AppError::internal("unexpected server error").into_response()
}

/// Assemble the full application router
pub fn create_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(hello::health))
        .route("/metrics", get(hello::metrics))
        .route("/api/hello", get(hello::hello))
        .route("/api/login", post(auth::login))
        .route("/api/refresh/token", post(auth::refresh_token));

    let protected = Router::new()
        .route("/test", get(auth::protected_probe))
        // Users
        .route(
            "/user",
            get(user::get_user)
                .post(user::create_user)
                .put(user::update_user)
                .delete(user::delete_user),
        )
        .route("/user/list", get(user::get_user_list))
        .route("/user/routes", get(user::get_user_routes))
        .route("/user/current", get(user::get_user_current))
        .route("/user/assign/roles", post(user::assign_roles))
        .route("/user/roles", get(user::get_user_roles))
        .route("/user/permissions", get(user::get_user_permissions))
        // Roles
        .route(
            "/role",
            get(role::get_role)
                .post(role::create_role)
                .put(role::update_role)
                .delete(role::delete_role),
        )
        .route("/role/batch", post(role::create_role_batch))
        .route("/role/list", get(role::get_role_list))
        .route("/role/permission/list", get(role::get_role_permissions))
        // Permissions
        .route(
            "/permission",
            get(permission::get_permission)
                .post(permission::create_permission)
                .put(permission::update_permission)
                .delete(permission::delete_permission),
        )
        .route("/permission/batch", post(permission::create_permission_batch))
        .route("/permission/list", get(permission::get_permission_list))
        // System settings
        .route(
            "/system-setting",
            get(setting::get_setting)
                .post(setting::create_setting)
                .put(setting::update_setting)
                .delete(setting::delete_setting),
        )
        .route("/system-setting/list", get(setting::get_setting_list))
        .route(
            "/system-setting/by-category",
            get(setting::get_settings_by_category),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            jwt_middleware,
        ));

    Router::new()
        .merge(public)
        .nest("/api/protected", protected)
        // Governance wraps everything, outermost first: trace, distributed
        // limit, local limit, policy gate
        .layer(middleware::from_fn_with_state(
            state.clone(),
            sentinel_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            redis_rate_limit_middleware,
        ))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
