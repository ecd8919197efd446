//! Identity service: login, refresh, user-response projection

use super::{PermissionService, ServiceError, ServiceResult};
use crate::auth::jwt::{Jwt, REFRESH_TOKEN_TYPE};
use crate::auth::Crypter;
use crate::db::models::User;
use crate::db::{DbContext, Repo};
use chrono::Utc;
use serde_json::{json, Value};
use shared::params::flags::{INCLUDE_DETAIL, INCLUDE_PERMISSION, INCLUDE_ROLE};
use shared::vo::TokenResponse;
use std::sync::Arc;

/// Role code used when a user has no roles at all
const GUEST_ROLE_CODE: &str = "guest";

pub struct AuthService {
    user_repo: Repo<User>,
    permissions: Arc<PermissionService>,
    jwt: Arc<Jwt>,
    crypter: Arc<Crypter>,
}

impl AuthService {
    pub fn new(
        user_repo: Repo<User>,
        permissions: Arc<PermissionService>,
        jwt: Arc<Jwt>,
        crypter: Arc<Crypter>,
    ) -> Self {
        Self {
            user_repo,
            permissions,
            jwt,
            crypter,
        }
    }

    /// Verify credentials and issue a token pair.
    ///
    /// Unknown username and wrong password are indistinguishable to callers.
    pub async fn login(
        &self,
        ctx: &DbContext,
        username: &str,
        password: &str,
    ) -> ServiceResult<TokenResponse> {
        let query = User {
            username: username.to_string(),
            ..Default::default()
        };
        let user = self.user_repo.find(ctx, &query).await.map_err(|e| {
            tracing::warn!(username, error = %e, "Login failed");
            ServiceError::InvalidCredentials
        })?;

        if !self.crypter.verify(password, &user.password) {
            tracing::warn!(username, "Invalid password");
            return Err(ServiceError::InvalidCredentials);
        }

        let role_code = self.current_role_code(ctx, user.id).await?;
        let pair = self
            .jwt
            .generate(&user.id.to_string(), &user.username, &role_code)?;

        // Record the login; failure here must not break the login itself
        let stamp = User {
            id: user.id,
            last_login_time: Some(Utc::now()),
            ..Default::default()
        };
        if let Err(e) = self.user_repo.update(ctx, &stamp).await {
            tracing::warn!(user_id = user.id, error = %e, "Failed to record last login");
        }

        tracing::info!(username = %user.username, "Login successful");
        Ok(TokenResponse {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            expires_at: pair.expires_at,
        })
    }

    /// Exchange a refresh token for a new pair carrying the user's *current*
    /// highest-priority role, so role revocations take effect on refresh.
    pub async fn refresh_token(
        &self,
        ctx: &DbContext,
        refresh_token: &str,
    ) -> ServiceResult<TokenResponse> {
        if refresh_token.is_empty() {
            return Err(ServiceError::Business("refresh token is required".into()));
        }

        let claims = self.jwt.parse(refresh_token)?;
        if claims.kind != REFRESH_TOKEN_TYPE {
            return Err(ServiceError::Token(
                crate::auth::jwt::JwtError::NotRefreshToken,
            ));
        }

        let user_id: i64 = claims
            .identity
            .parse()
            .map_err(|_| ServiceError::Business("invalid user ID in token".into()))?;

        let role_code = match self.current_role_code(ctx, user_id).await {
            Ok(code) => code,
            Err(e) => {
                tracing::warn!(user_id, error = %e, "Failed to resolve roles for refresh");
                GUEST_ROLE_CODE.to_string()
            }
        };

        let pair = self
            .jwt
            .generate(&claims.identity, &claims.nice, &role_code)?;
        Ok(TokenResponse {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            expires_at: pair.expires_at,
        })
    }

    /// Highest-priority role code (smallest role id), `guest` when roleless
    async fn current_role_code(&self, ctx: &DbContext, user_id: i64) -> ServiceResult<String> {
        let roles = self
            .permissions
            .retrieve_role_vos_by_user_id(ctx, user_id)
            .await?;
        Ok(PermissionService::highest_priority_role(&roles)
            .map(|role| role.code.clone())
            .unwrap_or_else(|| GUEST_ROLE_CODE.to_string()))
    }

    /// Compose a user response; the bit mask picks the included sections.
    /// Unknown bits are ignored.
    pub async fn build_user_response(
        &self,
        ctx: &DbContext,
        user_id: i64,
        flag_bits: i32,
    ) -> ServiceResult<Value> {
        let user = self.user_repo.find_by_id(ctx, user_id).await?;

        let mut response = json!({
            "id": user.id,
            "name": user.username,
        });

        if flag_bits & INCLUDE_ROLE != 0 {
            if let Ok(roles) = self
                .permissions
                .retrieve_role_vos_by_user_id(ctx, user_id)
                .await
            {
                let names: Vec<&str> = roles.iter().map(|role| role.name.as_str()).collect();
                response["roles"] = json!(names);
            }
        }

        if flag_bits & INCLUDE_PERMISSION != 0 {
            if let Ok(permissions) = self.permissions.get_user_permissions(ctx, user_id).await {
                let paths: Vec<String> = permissions
                    .iter()
                    .map(|p| format!("{}:{}", p.method, p.path))
                    .collect();
                response["permissions"] = json!(paths);
            }
        }

        if flag_bits & INCLUDE_DETAIL != 0 {
            response["create_time"] = json!(user.create_time);
            response["update_time"] = json!(user.update_time);
        }

        Ok(response)
    }
}
