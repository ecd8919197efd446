//! Chainable query builder

use super::context::DbContext;
use super::entity::Entity;
use super::repo::Repo;
use super::RepoError;
use shared::query::{Condition, Op, QueryOption, Value};

/// Chainable filter assembler bound to a repository.
///
/// ```ignore
/// let roles = repo
///     .query_builder()
///     .eq("status", 1)
///     .order_by("id ASC")
///     .find(&ctx)
///     .await?;
/// ```
pub struct QueryBuilder<'a, T: Entity> {
    repo: &'a Repo<T>,
    conditions: Vec<Condition>,
    order_by: Option<String>,
    limit: i64,
    offset: i64,
    lock: Option<&'static str>,
}

impl<'a, T: Entity> QueryBuilder<'a, T> {
    pub(crate) fn new(repo: &'a Repo<T>) -> Self {
        Self {
            repo,
            conditions: Vec::new(),
            order_by: None,
            limit: 0,
            offset: 0,
            lock: None,
        }
    }

    fn push(mut self, field: &str, op: Op, value: Value) -> Self {
        self.conditions.push(Condition::new(field, op, value));
        self
    }

    pub fn eq(self, field: &str, value: impl Into<Value>) -> Self {
        self.push(field, Op::Eq, value.into())
    }

    pub fn ne(self, field: &str, value: impl Into<Value>) -> Self {
        self.push(field, Op::Ne, value.into())
    }

    pub fn gt(self, field: &str, value: impl Into<Value>) -> Self {
        self.push(field, Op::Gt, value.into())
    }

    pub fn lt(self, field: &str, value: impl Into<Value>) -> Self {
        self.push(field, Op::Lt, value.into())
    }

    pub fn ge(self, field: &str, value: impl Into<Value>) -> Self {
        self.push(field, Op::Ge, value.into())
    }

    pub fn le(self, field: &str, value: impl Into<Value>) -> Self {
        self.push(field, Op::Le, value.into())
    }

    pub fn like(self, field: &str, value: impl Into<Value>) -> Self {
        self.push(field, Op::Like, value.into())
    }

    pub fn starts_with(self, field: &str, value: impl Into<Value>) -> Self {
        self.push(field, Op::StartsWith, value.into())
    }

    pub fn ends_with(self, field: &str, value: impl Into<Value>) -> Self {
        self.push(field, Op::EndsWith, value.into())
    }

    pub fn is_in(self, field: &str, values: impl Into<Value>) -> Self {
        self.push(field, Op::In, values.into())
    }

    pub fn not_in(self, field: &str, values: impl Into<Value>) -> Self {
        self.push(field, Op::NotIn, values.into())
    }

    pub fn is_null(self, field: &str) -> Self {
        self.push(field, Op::Null, Value::Null)
    }

    pub fn is_not_null(self, field: &str) -> Self {
        self.push(field, Op::NotNull, Value::Null)
    }

    pub fn order_by(mut self, fields: &str) -> Self {
        self.order_by = Some(fields.to_string());
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }

    /// Add a `FOR UPDATE` row lock
    pub fn for_update(mut self) -> Self {
        self.lock = Some("FOR UPDATE");
        self
    }

    /// The assembled options, in case a caller wants to hand them elsewhere
    pub fn options(&self) -> QueryOption {
        QueryOption {
            filters: self.conditions.clone(),
            order_by: self.order_by.clone(),
            limit: self.limit,
            offset: self.offset,
            lock: self.lock,
        }
    }

    /// Execute and return all matching rows
    pub async fn find(self, ctx: &DbContext) -> Result<Vec<T>, RepoError> {
        let opts = self.options();
        self.repo.query_by_option(ctx, &opts).await
    }

    /// Execute and return the first matching row
    pub async fn first(mut self, ctx: &DbContext) -> Result<T, RepoError> {
        self.limit = 1;
        let opts = self.options();
        let mut rows = self.repo.query_by_option(ctx, &opts).await?;
        if rows.is_empty() {
            return Err(RepoError::RecordNotFound);
        }
        Ok(rows.remove(0))
    }

    /// Count matching rows (ignores limit/offset)
    pub async fn count(self, ctx: &DbContext) -> Result<i64, RepoError> {
        self.repo.count_by_option(ctx, &self.conditions).await
    }

    /// Delete matching rows
    pub async fn delete(self, ctx: &DbContext) -> Result<(), RepoError> {
        let opts = self.options();
        self.repo.delete_by_option(ctx, &opts).await
    }
}
