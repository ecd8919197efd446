//! Transaction context
//!
//! A [`DbContext`] is passed through every repository call the way a request
//! context is. When a transaction is open it carries the shared session;
//! operations executed with that context run inside the transaction,
//! operations with an empty context run directly on the pool.

use super::RepoError;
use sqlx::{PgPool, Postgres, Transaction};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Shared transaction session. `None` after commit/rollback consumed it.
type TxHandle = Arc<Mutex<Option<Transaction<'static, Postgres>>>>;

/// Request-scoped database context, cheap to clone.
///
/// A session is not safe for concurrent statements; callers must not issue
/// parallel queries through the same in-transaction context.
#[derive(Clone, Default)]
pub struct DbContext {
    tx: Option<TxHandle>,
}

impl DbContext {
    /// Fresh context with no open transaction
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_transaction(&self) -> bool {
        self.tx.is_some()
    }

    pub(crate) fn tx_handle(&self) -> Option<&TxHandle> {
        self.tx.as_ref()
    }

    fn with_tx(handle: TxHandle) -> Self {
        Self { tx: Some(handle) }
    }
}

/// Connection pool wrapper owning the transaction lifecycle
#[derive(Clone)]
pub struct Db {
    pool: PgPool,
}

impl Db {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Open a transaction and return a context carrying its session.
    ///
    /// Always opens a new session; use [`Db::transaction`] to join an
    /// existing one.
    pub async fn begin(&self, _ctx: &DbContext) -> Result<DbContext, RepoError> {
        let tx = self.pool.begin().await?;
        Ok(DbContext::with_tx(Arc::new(Mutex::new(Some(tx)))))
    }

    /// Commit the transaction carried by `ctx`
    pub async fn commit(&self, ctx: &DbContext) -> Result<(), RepoError> {
        let handle = ctx.tx_handle().ok_or(RepoError::NoTransaction)?;
        let tx = handle
            .lock()
            .await
            .take()
            .ok_or(RepoError::NoTransaction)?;
        tx.commit().await?;
        Ok(())
    }

    /// Roll back the transaction carried by `ctx`
    pub async fn rollback(&self, ctx: &DbContext) -> Result<(), RepoError> {
        let handle = ctx.tx_handle().ok_or(RepoError::NoTransaction)?;
        let tx = handle
            .lock()
            .await
            .take()
            .ok_or(RepoError::NoTransaction)?;
        tx.rollback().await?;
        Ok(())
    }

    /// Run `f` inside a transaction.
    ///
    /// Joins the transaction already carried by `ctx` when there is one
    /// (nested calls commit exactly once, at the outermost level). Otherwise
    /// opens a new transaction, commits on success and rolls back on error.
    /// If the task unwinds mid-flight the un-committed sqlx transaction rolls
    /// back on drop.
    pub async fn transaction<T, E, F, Fut>(&self, ctx: &DbContext, f: F) -> Result<T, E>
    where
        F: FnOnce(DbContext) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<RepoError>,
    {
        if ctx.in_transaction() {
            return f(ctx.clone()).await;
        }

        let tx_ctx = self.begin(ctx).await?;
        match f(tx_ctx.clone()).await {
            Ok(value) => {
                self.commit(&tx_ctx).await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = self.rollback(&tx_ctx).await {
                    tracing::error!(error = %rollback_err, "Rollback failed");
                }
                Err(err)
            }
        }
    }
}
