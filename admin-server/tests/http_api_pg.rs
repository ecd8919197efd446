//! End-to-end HTTP tests against a live PostgreSQL.
//!
//! Skipped unless `DATABASE_URL` is set. Each test builds its own state and
//! router and drives it with `tower::ServiceExt::oneshot`.

use admin_server::api::create_router;
use admin_server::core::{AppState, Config};
use admin_server::db::models::{Permission, Role, User};
use admin_server::db::{DbContext, Repo};
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;

async fn test_state(mutate: impl FnOnce(&mut Config)) -> Option<AppState> {
    let url = std::env::var("DATABASE_URL").ok()?;
    let pool = PgPool::connect(&url).await.ok()?;
    let mut config = Config::default();
    // No policy file in the test environment; the gate stays disabled
    config.sentinel_config = String::new();
    mutate(&mut config);
    let state = AppState::with_pool(config, pool).await.ok()?;
    ensure_admin(&state).await;
    Some(state)
}

static SEED: tokio::sync::OnceCell<()> = tokio::sync::OnceCell::const_new();

/// Make sure the admin/ADMIN/wildcard-permission triple exists exactly once
/// per test binary, regardless of what earlier runs already wrote.
async fn ensure_admin(state: &AppState) {
    SEED.get_or_init(|| async {
        let ctx = DbContext::new();
        let user_repo: Repo<User> = Repo::new(state.db.clone());
        if user_repo
            .find(
                &ctx,
                &User {
                    username: "admin".to_string(),
                    ..Default::default()
                },
            )
            .await
            .is_ok()
        {
            return;
        }

        let role_repo: Repo<Role> = Repo::new(state.db.clone());
        let perm_repo: Repo<Permission> = Repo::new(state.db.clone());

        let mut admin = User {
            username: "admin".to_string(),
            password: state.crypter.fingerprint("123456"),
            email: "admin@example.com".to_string(),
            status: 1,
            ..Default::default()
        };
        user_repo.create(&ctx, &mut admin).await.unwrap();

        let mut role = Role {
            name: "Administrator".to_string(),
            code: "ADMIN".to_string(),
            status: 1,
            ..Default::default()
        };
        role_repo.create(&ctx, &mut role).await.unwrap();

        let mut perm = Permission {
            name: "All protected APIs".to_string(),
            code: "api.all".to_string(),
            kind: 3,
            path: "/api/protected/*".to_string(),
            method: "*".to_string(),
            status: 1,
            ..Default::default()
        };
        perm_repo.create(&ctx, &mut perm).await.unwrap();

        state
            .permissions
            .assign_role_permissions(&ctx, role.id, &[perm.id])
            .await
            .unwrap();
        state
            .permissions
            .assign_user_roles(&ctx, admin.id, &[role.id])
            .await
            .unwrap();
    })
    .await;
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn login(router: &Router, username: &str, password: &str) -> Value {
    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/login",
            serde_json::json!({"username": username, "password": password}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

#[tokio::test]
async fn test_login_happy_path() {
    let Some(state) = test_state(|_| {}).await else {
        return;
    };
    let router = create_router(state);

    let body = login(&router, "admin", "123456").await;
    assert_eq!(body["code"], 100_000);
    assert!(!body["data"]["access_token"].as_str().unwrap().is_empty());
    assert_eq!(body["data"]["currentAuthority"], "ADMIN");
    assert_eq!(body["data"]["status"], "ok");
}

#[tokio::test]
async fn test_login_wrong_password() {
    let Some(state) = test_state(|_| {}).await else {
        return;
    };
    let router = create_router(state);

    let body = login(&router, "admin", "bad").await;
    // Handler outcomes ride on HTTP 200; the envelope carries the failure
    assert_eq!(body["code"], 200_003);
    assert!(body["message"].as_str().unwrap().starts_with("Unauthorized"));
    assert_eq!(body["data"], Value::Null);
}

#[tokio::test]
async fn test_wildcard_permission_allows_list() {
    let Some(state) = test_state(|_| {}).await else {
        return;
    };
    let router = create_router(state);

    let body = login(&router, "admin", "123456").await;
    let token = body["data"]["access_token"].as_str().unwrap().to_string();

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/protected/user/list")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["code"], 100_000);
    assert!(body["data"]["records"].is_array());
    assert!(body["data"]["total"].is_number());
}

#[tokio::test]
async fn test_permission_denied_is_401() {
    let Some(state) = test_state(|_| {}).await else {
        return;
    };
    let ctx = DbContext::new();

    // A user whose only permission is GET on the profile endpoint
    let suffix = format!("{}", chrono::Utc::now().timestamp_nanos_opt().unwrap_or(0));
    let user_repo: Repo<User> = Repo::new(state.db.clone());
    let role_repo: Repo<Role> = Repo::new(state.db.clone());
    let perm_repo: Repo<Permission> = Repo::new(state.db.clone());

    let mut user = User {
        username: format!("limited-{suffix}"),
        password: state.crypter.fingerprint("123456"),
        email: format!("limited-{suffix}@example.com"),
        status: 1,
        ..Default::default()
    };
    user_repo.create(&ctx, &mut user).await.unwrap();

    let mut role = Role {
        name: format!("viewer-{suffix}"),
        code: format!("VIEWER-{suffix}"),
        status: 1,
        ..Default::default()
    };
    role_repo.create(&ctx, &mut role).await.unwrap();

    let mut perm = Permission {
        name: format!("profile-{suffix}"),
        code: format!("profile-{suffix}"),
        kind: 3,
        path: "/api/protected/profile".to_string(),
        method: "GET".to_string(),
        status: 1,
        ..Default::default()
    };
    perm_repo.create(&ctx, &mut perm).await.unwrap();

    state
        .permissions
        .assign_role_permissions(&ctx, role.id, &[perm.id])
        .await
        .unwrap();
    state
        .permissions
        .assign_user_roles(&ctx, user.id, &[role.id])
        .await
        .unwrap();

    let token = state
        .jwt
        .generate(&user.id.to_string(), &user.username, &role.code)
        .unwrap()
        .access_token;

    let router = create_router(state);
    let response = router
        .oneshot(json_request_with_auth(
            "DELETE",
            "/api/protected/user",
            serde_json::json!({"ids": [user.id]}),
            &token,
        ))
        .await
        .unwrap();

    // Documented behavior: permission denial answers 401, not 403
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["code"], 200_003);
    assert!(body["message"].as_str().unwrap().contains("Permission denied"));
}

fn json_request_with_auth(method: &str, uri: &str, body: Value, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_missing_token_is_401() {
    let Some(state) = test_state(|_| {}).await else {
        return;
    };
    let router = create_router(state);

    let response = router
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/protected/user/list")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["code"], 200_003);
}

#[tokio::test]
async fn test_refresh_flow() {
    let Some(state) = test_state(|_| {}).await else {
        return;
    };
    let jwt = state.jwt.clone();
    let router = create_router(state);

    let body = login(&router, "admin", "123456").await;
    let refresh = body["data"]["refresh_token"].as_str().unwrap().to_string();
    let original_access = body["data"]["access_token"].as_str().unwrap().to_string();
    let original_identity = jwt.parse(&original_access).unwrap().identity;

    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/refresh/token",
            serde_json::json!({"refresh_token": refresh}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["code"], 100_000);

    let new_access = body["data"]["access_token"].as_str().unwrap();
    let claims = jwt.parse(new_access).unwrap();
    assert_eq!(claims.kind, "access");
    assert_eq!(claims.identity, original_identity);
}

#[tokio::test]
async fn test_refresh_rejects_access_token() {
    let Some(state) = test_state(|_| {}).await else {
        return;
    };
    let router = create_router(state);

    let body = login(&router, "admin", "123456").await;
    let access = body["data"]["access_token"].as_str().unwrap().to_string();

    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/refresh/token",
            serde_json::json!({"refresh_token": access}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["code"], 200_003);
}

#[tokio::test]
async fn test_local_rate_limit_returns_429() {
    let Some(state) = test_state(|config| {
        config.rate_limit.rps = 1;
        config.rate_limit.burst = 2;
    })
    .await
    else {
        return;
    };
    let router = create_router(state);

    let hello = || {
        Request::builder()
            .method("GET")
            .uri("/api/hello")
            .header("x-real-ip", "1.2.3.4")
            .body(Body::empty())
            .unwrap()
    };

    for _ in 0..2 {
        let response = router.clone().oneshot(hello()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = router.clone().oneshot(hello()).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let body = body_json(response).await;
    assert_eq!(body["code"], 300_004);
}

#[tokio::test]
async fn test_hello_and_health_are_public() {
    let Some(state) = test_state(|_| {}).await else {
        return;
    };
    let router = create_router(state);

    for uri in ["/api/hello", "/health"] {
        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn test_build_user_response_flags() {
    let Some(state) = test_state(|_| {}).await else {
        return;
    };
    let ctx = DbContext::new();
    let user_repo: Repo<User> = Repo::new(state.db.clone());
    let admin = user_repo
        .find(
            &ctx,
            &User {
                username: "admin".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    // No flags: identity only
    let bare = state.auth.build_user_response(&ctx, admin.id, 0).await.unwrap();
    assert_eq!(bare["name"], "admin");
    assert!(bare.get("roles").is_none());
    assert!(bare.get("permissions").is_none());

    // Bit 0 roles, bit 1 permission strings, bit 2 timestamps; unknown bits
    // are ignored
    let full = state
        .auth
        .build_user_response(&ctx, admin.id, 0b111 | 0b1000_0000)
        .await
        .unwrap();
    assert!(full["roles"].is_array());
    assert!(full["permissions"].is_array());
    assert!(full.get("create_time").is_some());
    let perms: Vec<String> = full["permissions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p.as_str().unwrap().to_string())
        .collect();
    assert!(perms.iter().any(|p| p.contains(':')));
}

#[tokio::test]
async fn test_user_routes_lists_permission_paths() {
    let Some(state) = test_state(|_| {}).await else {
        return;
    };
    let router = create_router(state);

    let body = login(&router, "admin", "123456").await;
    let token = body["data"]["access_token"].as_str().unwrap().to_string();

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/protected/user/routes")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["code"], 100_000);
    assert_eq!(body["data"]["role"], "ADMIN");
    let routes = body["data"]["routes"].as_array().unwrap();
    assert!(routes
        .iter()
        .any(|r| r.as_str().unwrap() == "*:/api/protected/*"));
}
