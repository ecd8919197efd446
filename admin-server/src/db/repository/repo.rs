//! Generic repository over a single entity

use super::context::{Db, DbContext};
use super::entity::Entity;
use super::query_builder::QueryBuilder;
use super::sql::{ident, render_tail, render_where};
use super::value::{bind, bind_as, bind_scalar, decode_row};
use super::RepoError;
use shared::query::{Condition, QueryOption, Value};
use sqlx::postgres::PgRow;
use std::collections::HashMap;
use std::future::Future;
use std::marker::PhantomData;
use std::time::Instant;

/// Record one executed statement on the current tracing span
fn record_db_event(sql: &str, args: &[Value], start: Instant) {
    tracing::debug!(
        target: "db",
        sql,
        args = ?args,
        duration_ms = start.elapsed().as_millis() as u64,
        "db_execute"
    );
}

/// Typed repository. Cheap to clone; all state lives in the pool.
pub struct Repo<T: Entity> {
    db: Db,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Entity> Clone for Repo<T> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: Entity> Repo<T> {
    pub fn new(db: Db) -> Self {
        Self {
            db,
            _marker: PhantomData,
        }
    }

    pub fn db(&self) -> &Db {
        &self.db
    }

    // ==================== Statement execution ====================

    async fn execute_sql(
        &self,
        ctx: &DbContext,
        sql: &str,
        args: &[Value],
    ) -> Result<u64, RepoError> {
        let start = Instant::now();
        let mut query = sqlx::query(sql);
        for value in args {
            query = bind(query, value);
        }
        let result = match ctx.tx_handle() {
            Some(handle) => {
                let mut guard = handle.lock().await;
                let tx = guard.as_mut().ok_or(RepoError::NoTransaction)?;
                query.execute(&mut **tx).await
            }
            None => query.execute(self.db.pool()).await,
        };
        record_db_event(sql, args, start);
        Ok(result?.rows_affected())
    }

    async fn fetch_all_sql(
        &self,
        ctx: &DbContext,
        sql: &str,
        args: &[Value],
    ) -> Result<Vec<T>, RepoError> {
        let start = Instant::now();
        let mut query = sqlx::query_as::<_, T>(sql);
        for value in args {
            query = bind_as(query, value);
        }
        let result = match ctx.tx_handle() {
            Some(handle) => {
                let mut guard = handle.lock().await;
                let tx = guard.as_mut().ok_or(RepoError::NoTransaction)?;
                query.fetch_all(&mut **tx).await
            }
            None => query.fetch_all(self.db.pool()).await,
        };
        record_db_event(sql, args, start);
        Ok(result?)
    }

    async fn fetch_scalar_i64(
        &self,
        ctx: &DbContext,
        sql: &str,
        args: &[Value],
    ) -> Result<i64, RepoError> {
        let start = Instant::now();
        let mut query = sqlx::query_scalar::<_, i64>(sql);
        for value in args {
            query = bind_scalar(query, value);
        }
        let result = match ctx.tx_handle() {
            Some(handle) => {
                let mut guard = handle.lock().await;
                let tx = guard.as_mut().ok_or(RepoError::NoTransaction)?;
                query.fetch_one(&mut **tx).await
            }
            None => query.fetch_one(self.db.pool()).await,
        };
        record_db_event(sql, args, start);
        Ok(result?)
    }

    async fn fetch_rows_sql(
        &self,
        ctx: &DbContext,
        sql: &str,
        args: &[Value],
    ) -> Result<Vec<PgRow>, RepoError> {
        let start = Instant::now();
        let mut query = sqlx::query(sql);
        for value in args {
            query = bind(query, value);
        }
        let result = match ctx.tx_handle() {
            Some(handle) => {
                let mut guard = handle.lock().await;
                let tx = guard.as_mut().ok_or(RepoError::NoTransaction)?;
                query.fetch_all(&mut **tx).await
            }
            None => query.fetch_all(self.db.pool()).await,
        };
        record_db_event(sql, args, start);
        Ok(result?)
    }

    // ==================== CRUD ====================

    /// Insert one record; the generated id is written back into the model.
    pub async fn create(&self, ctx: &DbContext, model: &mut T) -> Result<(), RepoError> {
        let columns = model.insert_columns();
        let names: Vec<String> = columns.iter().map(|(name, _)| ident(name)).collect();
        let placeholders: Vec<String> = (1..=columns.len()).map(|n| format!("${n}")).collect();
        let args: Vec<Value> = columns.into_iter().map(|(_, value)| value).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            ident(T::TABLE),
            names.join(", "),
            placeholders.join(", "),
            ident(&T::id_column()),
        );
        let id = self.fetch_scalar_i64(ctx, &sql, &args).await?;
        model.set_id(id);
        Ok(())
    }

    /// Update the record located by the model's primary key; only non-zero
    /// fields are written.
    pub async fn update(&self, ctx: &DbContext, model: &T) -> Result<(), RepoError> {
        if model.id() == 0 {
            return Err(RepoError::MissingKey);
        }
        let columns = model.update_columns();
        if columns.is_empty() {
            return Ok(());
        }
        let mut args: Vec<Value> = Vec::with_capacity(columns.len() + 1);
        let mut sets = Vec::with_capacity(columns.len());
        for (name, value) in columns {
            args.push(value);
            sets.push(format!("{} = ${}", ident(name), args.len()));
        }
        args.push(Value::I64(model.id()));
        let sql = format!(
            "UPDATE {} SET {} WHERE {} = ${}",
            ident(T::TABLE),
            sets.join(", "),
            ident(&T::id_column()),
            args.len(),
        );
        self.execute_sql(ctx, &sql, &args).await?;
        Ok(())
    }

    /// Update non-zero fields of `model` on every row matching `opts`
    pub async fn update_by_option(
        &self,
        ctx: &DbContext,
        model: &T,
        opts: &QueryOption,
    ) -> Result<(), RepoError> {
        let columns = model.update_columns();
        if columns.is_empty() {
            return Ok(());
        }
        let mut args: Vec<Value> = Vec::new();
        let mut sets = Vec::with_capacity(columns.len());
        for (name, value) in columns {
            args.push(value);
            sets.push(format!("{} = ${}", ident(name), args.len()));
        }
        let where_sql = render_where(&opts.filters, &mut args);
        let sql = format!(
            "UPDATE {} SET {}{}",
            ident(T::TABLE),
            sets.join(", "),
            where_sql,
        );
        self.execute_sql(ctx, &sql, &args).await?;
        Ok(())
    }

    /// Delete by example: every non-zero field of the model is a condition
    pub async fn delete(&self, ctx: &DbContext, model: &T) -> Result<(), RepoError> {
        let filters = model.filter_conditions();
        if filters.is_empty() {
            return Err(RepoError::MissingKey);
        }
        let mut args = Vec::new();
        let where_sql = render_where(&filters, &mut args);
        let sql = format!("DELETE FROM {}{}", ident(T::TABLE), where_sql);
        self.execute_sql(ctx, &sql, &args).await?;
        Ok(())
    }

    pub async fn delete_by_id(&self, ctx: &DbContext, id: i64) -> Result<(), RepoError> {
        let sql = format!(
            "DELETE FROM {} WHERE {} = $1",
            ident(T::TABLE),
            ident(&T::id_column()),
        );
        self.execute_sql(ctx, &sql, &[Value::I64(id)]).await?;
        Ok(())
    }

    pub async fn delete_by_option(
        &self,
        ctx: &DbContext,
        opts: &QueryOption,
    ) -> Result<(), RepoError> {
        let mut args = Vec::new();
        let where_sql = render_where(&opts.filters, &mut args);
        let sql = format!("DELETE FROM {}{}", ident(T::TABLE), where_sql);
        self.execute_sql(ctx, &sql, &args).await?;
        Ok(())
    }

    // ==================== Lookup ====================

    /// Find exactly one record matching the model's non-zero fields
    pub async fn find(&self, ctx: &DbContext, model: &T) -> Result<T, RepoError> {
        let opts = QueryOption {
            filters: model.filter_conditions(),
            limit: 2,
            ..Default::default()
        };
        self.expect_single(self.query_by_option(ctx, &opts).await?)
    }

    pub async fn find_by_id(&self, ctx: &DbContext, id: i64) -> Result<T, RepoError> {
        self.find_by_key(ctx, &T::id_column(), Value::I64(id)).await
    }

    /// Find exactly one record where `key = value`
    pub async fn find_by_key(
        &self,
        ctx: &DbContext,
        key: &str,
        value: impl Into<Value>,
    ) -> Result<T, RepoError> {
        let opts = QueryOption {
            filters: vec![Condition::new(key, shared::query::Op::Eq, value)],
            limit: 2,
            ..Default::default()
        };
        self.expect_single(self.query_by_option(ctx, &opts).await?)
    }

    fn expect_single(&self, mut rows: Vec<T>) -> Result<T, RepoError> {
        match rows.len() {
            0 => Err(RepoError::RecordNotFound),
            1 => Ok(rows.remove(0)),
            _ => Err(RepoError::MultipleRecords),
        }
    }

    /// All records matching the model's non-zero fields
    pub async fn find_all(&self, ctx: &DbContext, model: &T) -> Result<Vec<T>, RepoError> {
        let opts = QueryOption {
            filters: model.filter_conditions(),
            ..Default::default()
        };
        self.query_by_option(ctx, &opts).await
    }

    /// Page of records matching `filters`, with the total count
    pub async fn find_page(
        &self,
        ctx: &DbContext,
        filters: Vec<Condition>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<T>, i64), RepoError> {
        let opts = QueryOption {
            filters,
            limit,
            offset,
            ..Default::default()
        };
        let rows = self.query_by_option(ctx, &opts).await?;
        let total = self.count_by_option(ctx, &opts.filters).await?;
        Ok((rows, total))
    }

    /// Unfiltered page with explicit ordering
    pub async fn find_page_sorted(
        &self,
        ctx: &DbContext,
        limit: i64,
        offset: i64,
        order_by: &str,
    ) -> Result<(Vec<T>, i64), RepoError> {
        let opts = QueryOption {
            order_by: Some(order_by.to_string()),
            limit,
            offset,
            ..Default::default()
        };
        let rows = self.query_by_option(ctx, &opts).await?;
        let total = self.count_by_option(ctx, &[]).await?;
        Ok((rows, total))
    }

    pub(crate) async fn query_by_option(
        &self,
        ctx: &DbContext,
        opts: &QueryOption,
    ) -> Result<Vec<T>, RepoError> {
        let mut args = Vec::new();
        let tail = render_tail(opts, &mut args);
        let sql = format!("SELECT * FROM {}{}", ident(T::TABLE), tail);
        self.fetch_all_sql(ctx, &sql, &args).await
    }

    pub(crate) async fn count_by_option(
        &self,
        ctx: &DbContext,
        filters: &[Condition],
    ) -> Result<i64, RepoError> {
        let mut args = Vec::new();
        let where_sql = render_where(filters, &mut args);
        let sql = format!("SELECT COUNT(*) FROM {}{}", ident(T::TABLE), where_sql);
        self.fetch_scalar_i64(ctx, &sql, &args).await
    }

    // ==================== Batch ====================

    /// Insert every model inside one transaction (joins an outer one)
    pub async fn batch_create(&self, ctx: &DbContext, models: &mut [T]) -> Result<(), RepoError> {
        self.db
            .transaction::<_, RepoError, _, _>(ctx, |tx_ctx| async move {
                for model in models.iter_mut() {
                    self.create(&tx_ctx, model).await?;
                }
                Ok(())
            })
            .await
    }

    /// Update every model by primary key inside one transaction
    pub async fn batch_update(&self, ctx: &DbContext, models: &[T]) -> Result<(), RepoError> {
        self.db
            .transaction::<_, RepoError, _, _>(ctx, |tx_ctx| async move {
                for model in models {
                    self.update(&tx_ctx, model).await?;
                }
                Ok(())
            })
            .await
    }

    /// Delete every model by example inside one transaction
    pub async fn batch_delete(&self, ctx: &DbContext, models: &[T]) -> Result<(), RepoError> {
        self.db
            .transaction::<_, RepoError, _, _>(ctx, |tx_ctx| async move {
                for model in models {
                    self.delete(&tx_ctx, model).await?;
                }
                Ok(())
            })
            .await
    }

    // ==================== Raw SQL ====================

    /// Execute a statement, returning the affected row count
    pub async fn exec(&self, ctx: &DbContext, sql: &str, args: &[Value]) -> Result<u64, RepoError> {
        self.execute_sql(ctx, sql, args).await
    }

    /// Run a custom SELECT decoded into the entity type
    pub async fn query(
        &self,
        ctx: &DbContext,
        sql: &str,
        args: &[Value],
    ) -> Result<Vec<T>, RepoError> {
        self.fetch_all_sql(ctx, sql, args).await
    }

    /// Run a custom SELECT decoded into weakly-typed column maps
    pub async fn query_rows(
        &self,
        ctx: &DbContext,
        sql: &str,
        args: &[Value],
    ) -> Result<Vec<HashMap<String, Value>>, RepoError> {
        let rows = self.fetch_rows_sql(ctx, sql, args).await?;
        Ok(rows.iter().map(decode_row).collect())
    }

    // ==================== Query builder / transactions ====================

    pub fn query_builder(&self) -> QueryBuilder<'_, T> {
        QueryBuilder::new(self)
    }

    pub async fn begin(&self, ctx: &DbContext) -> Result<DbContext, RepoError> {
        self.db.begin(ctx).await
    }

    pub async fn commit(&self, ctx: &DbContext) -> Result<(), RepoError> {
        self.db.commit(ctx).await
    }

    pub async fn rollback(&self, ctx: &DbContext) -> Result<(), RepoError> {
        self.db.rollback(ctx).await
    }

    /// See [`Db::transaction`]
    pub async fn transaction<R, E, F, Fut>(&self, ctx: &DbContext, f: F) -> Result<R, E>
    where
        F: FnOnce(DbContext) -> Fut,
        Fut: Future<Output = Result<R, E>>,
        E: From<RepoError>,
    {
        self.db.transaction(ctx, f).await
    }
}
