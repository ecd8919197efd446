//! Generic repository core
//!
//! A typed repository over PostgreSQL: per-entity mapping descriptors, a
//! chainable query builder, and transactions carried through a request-scoped
//! [`DbContext`] so nested operations join the outer transaction.

mod context;
mod entity;
mod query_builder;
mod repo;
mod sql;
mod value;

pub use context::{Db, DbContext};
pub use entity::{resolve_id_column, Entity};
pub use query_builder::QueryBuilder;
pub use repo::Repo;
pub use value::{decode_row, parse_datetime};

use thiserror::Error;

/// Repository-layer error
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("record not found")]
    RecordNotFound,
    #[error("multiple records found")]
    MultipleRecords,
    #[error("transaction session not found in context")]
    NoTransaction,
    #[error("model must have a valid primary key")]
    MissingKey,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

impl RepoError {
    /// Whether the underlying database reported a unique-constraint violation
    pub fn is_unique_violation(&self) -> bool {
        match self {
            RepoError::Database(sqlx::Error::Database(db)) => db.is_unique_violation(),
            _ => false,
        }
    }
}
