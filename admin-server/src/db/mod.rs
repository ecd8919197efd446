//! Database access layer
//!
//! - [`repository`] - generic typed repository and transactions
//! - [`models`] - entity definitions and their mapping descriptors

pub mod models;
pub mod repository;

pub use repository::{Db, DbContext, Entity, QueryBuilder, Repo, RepoError};

use crate::core::config::DatabaseConfig;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

/// Open the connection pool described by the configuration
pub async fn connect(cfg: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(cfg.max_open_conns)
        .min_connections(cfg.max_idle_conns.min(cfg.max_open_conns))
        .max_lifetime(Duration::from_secs(cfg.conn_max_lifetime))
        .connect(&cfg.url())
        .await
}

/// Apply pending migrations (schema sync)
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
