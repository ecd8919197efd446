//! Application state
//!
//! The composition root: every engine is constructed once here and shared
//! through `Arc`. Services receive their dependencies by constructor
//! injection; the permission service is injected into the auth service to
//! break the auth ↔ permission cycle.

use crate::auth::middleware::PermissionGateConfig;
use crate::auth::{keyfile, Crypter, Jwt};
use crate::core::config::Config;
use crate::db::models::{Permission, Role, RolePermission, SystemSetting, User, UserRole};
use crate::db::{Db, Repo};
use crate::governance::{IpRateLimiter, RateLimiterConfig, RedisRateLimiter, Sentinel};
use crate::service::{AuthService, InitService, PermissionService, SystemSettingService};
use crate::telemetry;
use metrics_exporter_prometheus::PrometheusHandle;
use shared::AppError;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Shared application state, cheap to clone
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Db,
    pub jwt: Arc<Jwt>,
    pub crypter: Arc<Crypter>,
    pub gate: Arc<PermissionGateConfig>,

    pub auth: Arc<AuthService>,
    pub permissions: Arc<PermissionService>,
    pub settings: Arc<SystemSettingService>,
    pub init: Arc<InitService>,

    pub rate_limiter: Arc<IpRateLimiter>,
    pub redis_limiter: Option<Arc<RedisRateLimiter>>,
    pub sentinel: Arc<Sentinel>,

    pub metrics: PrometheusHandle,
}

impl AppState {
    pub async fn new(config: Config) -> Result<Self, AppError> {
        let pool = crate::db::connect(&config.database).await.map_err(|e| {
            AppError::with_message(shared::ErrorCode::InitFailed, format!("connect db: {e}"))
        })?;
        Self::with_pool(config, pool).await
    }

    /// Build the state over an existing pool (used by tests)
    pub async fn with_pool(config: Config, pool: sqlx::PgPool) -> Result<Self, AppError> {
        crate::db::migrate(&pool).await.map_err(|e| {
            AppError::with_message(shared::ErrorCode::InitFailed, format!("migrate db: {e}"))
        })?;
        let db = Db::new(pool);

        // Crypter key: key file beats inline key beats built-in default
        let crypter = if !config.crypter.key_path.is_empty() {
            let material = keyfile::load_or_generate(Path::new(&config.crypter.key_path))?;
            Crypter::new(&material.aes_key)?
        } else if !config.crypter.key.is_empty() {
            Crypter::new(config.crypter.key.as_bytes())?
        } else {
            Crypter::new(crate::auth::crypter::DEFAULT_CRYPTER_KEY.as_bytes())?
        };
        let crypter = Arc::new(crypter);

        let jwt = Arc::new(
            Jwt::new(
                &config.jwt.secret,
                &config.jwt.access_token_exp,
                &config.jwt.refresh_token_exp,
            )
            .map_err(|e| {
                AppError::with_message(shared::ErrorCode::ConfigError, format!("jwt config: {e}"))
            })?,
        );

        // Repositories
        let user_repo: Repo<User> = Repo::new(db.clone());
        let role_repo: Repo<Role> = Repo::new(db.clone());
        let permission_repo: Repo<Permission> = Repo::new(db.clone());
        let user_role_repo: Repo<UserRole> = Repo::new(db.clone());
        let role_perm_repo: Repo<RolePermission> = Repo::new(db.clone());
        let setting_repo: Repo<SystemSetting> = Repo::new(db.clone());

        // Services
        let permissions = Arc::new(PermissionService::new(
            user_repo.clone(),
            role_repo.clone(),
            permission_repo.clone(),
            user_role_repo,
            role_perm_repo,
        ));
        let auth = Arc::new(AuthService::new(
            user_repo.clone(),
            permissions.clone(),
            jwt.clone(),
            crypter.clone(),
        ));
        let settings = Arc::new(SystemSettingService::new(setting_repo, user_repo.clone()));
        let init = Arc::new(InitService::new(
            user_repo,
            role_repo,
            permission_repo,
            permissions.clone(),
            crypter.clone(),
        ));

        // Governance
        let rate_limiter = Arc::new(IpRateLimiter::new(
            config.rate_limit.rps,
            config.rate_limit.burst,
            RateLimiterConfig {
                refresh_interval: Duration::from_secs(config.rate_limit.refresh_interval_secs),
                expiry_time: Duration::from_secs(config.rate_limit.expiry_secs),
                enable_metrics: config.rate_limit.enable_metrics,
            },
        ));
        let redis_limiter = if config.redis.url.is_empty() {
            None
        } else {
            match RedisRateLimiter::connect(
                &config.redis.url,
                config.redis.rps,
                config.redis.burst,
                &config.redis.key_prefix,
                config.rate_limit.enable_metrics,
            )
            .await
            {
                Ok(limiter) => Some(Arc::new(limiter)),
                Err(e) => {
                    // The distributed limiter is best-effort; the local one
                    // still guards the node
                    tracing::warn!(error = %e, "Redis unavailable, distributed limiter disabled");
                    None
                }
            }
        };
        let sentinel = match Sentinel::new(&config.sentinel_config) {
            Ok(sentinel) => Arc::new(sentinel),
            Err(e) => {
                tracing::warn!(error = %e, "Policy file unavailable, governance gate disabled");
                Arc::new(Sentinel::disabled())
            }
        };

        let metrics = telemetry::init_metrics();

        Ok(Self {
            config: Arc::new(config),
            db,
            jwt,
            crypter,
            gate: Arc::new(PermissionGateConfig::default()),
            auth,
            permissions,
            settings,
            init,
            rate_limiter,
            redis_limiter,
            sentinel,
            metrics,
        })
    }
}
