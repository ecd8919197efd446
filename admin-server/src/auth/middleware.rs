//! Bearer authentication and permission gate
//!
//! Extracts `Authorization: Bearer <token>`, validates it, injects the
//! [`Claims`] into request extensions and checks the caller's RBAC
//! permission for `method:path`. Missing token, invalid token and permission
//! denial all answer 401 (documented behavior).

use crate::auth::jwt::Claims;
use crate::core::state::AppState;
use crate::db::DbContext;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use shared::error::AppError;

/// Permission gate configuration
#[derive(Debug, Clone)]
pub struct PermissionGateConfig {
    /// `method:path` or bare-path entries exempt from the RBAC check
    pub exclude_paths: Vec<String>,
    /// Disable the RBAC check entirely (token is still required)
    pub enable: bool,
}

impl Default for PermissionGateConfig {
    fn default() -> Self {
        Self {
            exclude_paths: vec![
                "/api/login".to_string(),
                "/api/refresh".to_string(),
                "/api/hello".to_string(),
                "GET:/api/protected/test".to_string(),
                "GET:/api/protected/user/routes".to_string(),
                "GET:/api/protected/user/current".to_string(),
            ],
            enable: true,
        }
    }
}

/// Check a `METHOD:path` pair against the exclusion list.
///
/// Entries may be `METHOD:path`, `*:path` (any method) or a bare path.
fn is_excluded(method_path: &str, exclude_paths: &[String]) -> bool {
    for exclude in exclude_paths {
        if let Some((method, path)) = exclude.split_once(':') {
            if method_path == exclude {
                return true;
            }
            if method == "*" && method_path.ends_with(&format!(":{path}")) {
                return true;
            }
        } else if method_path.ends_with(&format!(":{exclude}")) {
            return true;
        }
    }
    false
}

/// Authentication + authorization middleware for protected routes
pub async fn jwt_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    // 1. Token extraction
    let header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::unauthorized("No token provided"))?;
    let token = header.strip_prefix("Bearer ").unwrap_or(header);

    let claims: Claims = state
        .jwt
        .parse(token)
        .map_err(|e| AppError::unauthorized(format!("Invalid token: {e}")))?;

    // 2. Identity extraction
    let user_id: i64 = claims
        .identity
        .parse()
        .map_err(|_| AppError::unauthorized("Invalid user ID in token"))?;
    req.extensions_mut().insert(claims);

    // 3. Permission check
    if state.gate.enable {
        let method = req.method().as_str().to_uppercase();
        let path = req.uri().path().to_string();
        let method_path = format!("{method}:{path}");

        if !is_excluded(&method_path, &state.gate.exclude_paths) {
            let ctx = DbContext::new();
            match state
                .permissions
                .has_permission(&ctx, user_id, &method, &path)
                .await
            {
                Ok(true) => {}
                Ok(false) => {
                    tracing::warn!(user_id, method, path, "Permission denied");
                    return Err(AppError::unauthorized("Permission denied"));
                }
                Err(e) => {
                    tracing::error!(user_id, method, path, error = %e, "Permission check failed");
                    return Err(AppError::unauthorized("Permission check error"));
                }
            }
        }
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_exclusion() {
        let excludes = vec!["POST:/api/login".to_string()];
        assert!(is_excluded("POST:/api/login", &excludes));
        assert!(!is_excluded("GET:/api/login", &excludes));
    }

    #[test]
    fn test_method_wildcard_exclusion() {
        let excludes = vec!["*:/api/health".to_string()];
        assert!(is_excluded("GET:/api/health", &excludes));
        assert!(is_excluded("POST:/api/health", &excludes));
        assert!(!is_excluded("GET:/api/other", &excludes));
    }

    #[test]
    fn test_bare_path_matches_any_method() {
        let excludes = vec!["/api/login".to_string()];
        assert!(is_excluded("GET:/api/login", &excludes));
        assert!(is_excluded("POST:/api/login", &excludes));
        assert!(!is_excluded("POST:/api/logout", &excludes));
    }
}
