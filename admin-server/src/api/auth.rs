//! Authentication endpoints

use crate::auth::jwt::Claims;
use crate::core::state::AppState;
use crate::db::DbContext;
use crate::extract::ValidatedJson;
use axum::extract::State;
use axum::Extension;
use shared::params::{LoginRequest, RefreshTokenRequest};
use shared::vo::LoginResult;
use shared::ApiResponse;

/// POST /api/login
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> ApiResponse {
    let ctx = DbContext::new();
    let token = match state.auth.login(&ctx, &req.username, &req.password).await {
        Ok(token) => token,
        Err(e) => return e.into(),
    };

    // Echo the authority carried by the freshly issued token
    let claims = match state.jwt.parse(&token.access_token) {
        Ok(claims) => claims,
        Err(_) => return ApiResponse::unauthorized("Invalid token"),
    };

    ApiResponse::success(LoginResult {
        token,
        status: "ok".to_string(),
        r#type: "account".to_string(),
        current_authority: claims.rolekey,
    })
}

/// POST /api/refresh/token
pub async fn refresh_token(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RefreshTokenRequest>,
) -> ApiResponse {
    let ctx = DbContext::new();
    match state.auth.refresh_token(&ctx, &req.refresh_token).await {
        Ok(token) => ApiResponse::success(token),
        Err(e) => {
            let rsp: ApiResponse = e.into();
            // Any refresh failure reads as an auth failure to the caller
            if rsp.code == shared::ErrorCode::Unauthorized.code() {
                rsp
            } else {
                ApiResponse::unauthorized(rsp.message)
            }
        }
    }
}

/// GET /api/protected/test — claims echo for smoke testing the gate
pub async fn protected_probe(Extension(claims): Extension<Claims>) -> ApiResponse {
    ApiResponse::success(claims)
}
