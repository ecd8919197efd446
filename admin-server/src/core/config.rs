//! Server configuration
//!
//! Loaded from a YAML file; a handful of environment variables override the
//! file (`INSTANCE_ID`, `OTEL_EXPORTER_OTLP_ENDPOINT`,
//! `OTEL_EXPORTER_OTLP_PROTOCOL`, `CRYPTER_KEY_PATH`).

use serde::Deserialize;
use shared::{AppError, ErrorCode};

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub jwt: JwtConfig,
    #[serde(default)]
    pub crypter: CrypterConfig,
    #[serde(default)]
    pub logger: LoggerConfig,
    #[serde(default)]
    pub opentelemetry: OpenTelemetryConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub redis: RedisConfig,
    /// Path to the governance policy file
    #[serde(default = "default_sentinel_config")]
    pub sentinel_config: String,
    #[serde(default)]
    pub tasks: Vec<TaskConfig>,
}

fn default_sentinel_config() -> String {
    "conf/sentinel.yaml".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    8888
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_host")]
    pub host: String,
    #[serde(default = "default_db_port")]
    pub port: u16,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub dbname: String,
    #[serde(default = "default_max_idle")]
    pub max_idle_conns: u32,
    #[serde(default = "default_max_open")]
    pub max_open_conns: u32,
    /// Seconds
    #[serde(default = "default_conn_lifetime")]
    pub conn_max_lifetime: u64,
    #[serde(default)]
    pub show_sql: bool,
}

fn default_db_host() -> String {
    "localhost".to_string()
}

fn default_db_port() -> u16 {
    5432
}

fn default_max_idle() -> u32 {
    10
}

fn default_max_open() -> u32 {
    100
}

fn default_conn_lifetime() -> u64 {
    3600
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: default_db_host(),
            port: default_db_port(),
            user: String::new(),
            password: String::new(),
            dbname: String::new(),
            max_idle_conns: default_max_idle(),
            max_open_conns: default_max_open(),
            conn_max_lifetime: default_conn_lifetime(),
            show_sql: false,
        }
    }
}

impl DatabaseConfig {
    /// PostgreSQL connection URL from the DSN components
    pub fn url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.dbname
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    #[serde(default = "default_jwt_secret")]
    pub secret: String,
    #[serde(default = "default_access_exp")]
    pub access_token_exp: String,
    #[serde(default = "default_refresh_exp")]
    pub refresh_token_exp: String,
}

fn default_jwt_secret() -> String {
    "your-secret-key".to_string()
}

fn default_access_exp() -> String {
    "24h".to_string()
}

fn default_refresh_exp() -> String {
    "30d".to_string()
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: default_jwt_secret(),
            access_token_exp: default_access_exp(),
            refresh_token_exp: default_refresh_exp(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct CrypterConfig {
    /// HMAC key; empty falls back to the built-in default
    #[serde(default)]
    pub key: String,
    /// Optional key file; when set its `aes_key` becomes the HMAC key.
    /// Overridden by `CRYPTER_KEY_PATH`.
    #[serde(default)]
    pub key_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggerConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_true")]
    pub console: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            console: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct OpenTelemetryConfig {
    #[serde(default)]
    pub service: String,
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub protocol: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_rps")]
    pub rps: u32,
    #[serde(default = "default_burst")]
    pub burst: u32,
    /// Janitor interval, seconds
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
    /// Idle expiry, seconds
    #[serde(default = "default_expiry")]
    pub expiry_secs: u64,
    #[serde(default)]
    pub enable_metrics: bool,
}

fn default_rps() -> u32 {
    50
}

fn default_burst() -> u32 {
    100
}

fn default_refresh_interval() -> u64 {
    600
}

fn default_expiry() -> u64 {
    1800
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            rps: default_rps(),
            burst: default_burst(),
            refresh_interval_secs: default_refresh_interval(),
            expiry_secs: default_expiry(),
            enable_metrics: false,
        }
    }
}

/// Distributed limiter; disabled unless a URL is configured
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RedisConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    #[serde(default = "default_rps")]
    pub rps: u32,
    #[serde(default = "default_burst")]
    pub burst: u32,
}

fn default_key_prefix() -> String {
    "ratelimit".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    pub name: String,
    /// Seconds between runs
    pub interval_secs: u64,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Config {
    /// Load the YAML file and apply environment overrides
    pub fn load(path: &str) -> Result<Self, AppError> {
        let data = std::fs::read_to_string(path).map_err(|e| {
            AppError::with_message(ErrorCode::ConfigError, format!("read config {path}: {e}"))
        })?;
        let mut config: Config = serde_yaml::from_str(&data).map_err(|e| {
            AppError::with_message(ErrorCode::ConfigError, format!("parse config {path}: {e}"))
        })?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(instance_id) = std::env::var("INSTANCE_ID") {
            self.opentelemetry.service = instance_id;
        }
        if let Ok(endpoint) = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT") {
            self.opentelemetry.endpoint = endpoint;
        }
        if let Ok(protocol) = std::env::var("OTEL_EXPORTER_OTLP_PROTOCOL") {
            self.opentelemetry.protocol = protocol;
        }
        if let Ok(key_path) = std::env::var("CRYPTER_KEY_PATH") {
            self.crypter.key_path = key_path;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_yaml() {
        let config: Config = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.server.port, 8888);
        assert_eq!(config.jwt.access_token_exp, "24h");
        assert_eq!(config.jwt.refresh_token_exp, "30d");
        assert_eq!(config.rate_limit.refresh_interval_secs, 600);
        assert_eq!(config.rate_limit.expiry_secs, 1800);
        assert!(config.redis.url.is_empty());
    }

    #[test]
    fn test_database_url() {
        let db = DatabaseConfig {
            user: "admin".into(),
            password: "pw".into(),
            host: "db".into(),
            port: 5432,
            dbname: "app".into(),
            ..Default::default()
        };
        assert_eq!(db.url(), "postgres://admin:pw@db:5432/app");
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
server:
  port: 9000
database:
  host: db.internal
  user: svc
  password: secret
  dbname: admin
jwt:
  secret: super-secret
  access_token_exp: 12h
  refresh_token_exp: 2w
logger:
  level: debug
rate_limit:
  rps: 5
  burst: 10
tasks:
  - name: health_task
    interval_secs: 60
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.jwt.access_token_exp, "12h");
        assert_eq!(config.rate_limit.rps, 5);
        assert_eq!(config.tasks.len(), 1);
        assert!(config.tasks[0].enabled);
    }
}
