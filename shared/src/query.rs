//! Query and filter primitives
//!
//! The repository layer consumes these; request DTOs produce them through
//! [`Filterable`]. Keeping them here lets DTOs declare their own filter
//! mapping without depending on the database crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Condition operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Op {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
    /// `LIKE %value%`
    Like,
    /// `LIKE value%`
    StartsWith,
    /// `LIKE %value`
    EndsWith,
    In,
    NotIn,
    /// `IS NULL`
    Null,
    /// `IS NOT NULL`
    NotNull,
}

/// A weakly-typed bind value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    I64(i64),
    F64(f64),
    Text(String),
    DateTime(DateTime<Utc>),
    List(Vec<Value>),
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::I64(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::I64(v as i64)
    }
}

impl From<u8> for Value {
    fn from(v: u8) -> Self {
        Value::I64(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::F64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::DateTime(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

/// One WHERE condition: `field op value`
#[derive(Debug, Clone)]
pub struct Condition {
    pub field: String,
    pub op: Op,
    pub value: Value,
}

impl Condition {
    pub fn new(field: impl Into<String>, op: Op, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, Op::Eq, value)
    }
}

/// Assembled query options: ordered filters plus order/limit/offset/lock
#[derive(Debug, Clone, Default)]
pub struct QueryOption {
    pub filters: Vec<Condition>,
    pub order_by: Option<String>,
    pub limit: i64,
    pub offset: i64,
    /// Row lock clause, e.g. `FOR UPDATE`
    pub lock: Option<&'static str>,
}

/// Explicit filter descriptor for list-request DTOs.
///
/// The mapping each implementation writes out by hand — column name, operator,
/// skip-on-zero — replaces struct-tag reflection.
pub trait Filterable {
    fn filters(&self) -> Vec<Condition>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_conversions() {
        assert_eq!(Value::from(5i64), Value::I64(5));
        assert_eq!(Value::from("x"), Value::Text("x".into()));
        assert_eq!(
            Value::from(vec![1i64, 2]),
            Value::List(vec![Value::I64(1), Value::I64(2)])
        );
    }

    #[test]
    fn test_condition_builder() {
        let c = Condition::eq("username", "admin");
        assert_eq!(c.field, "username");
        assert_eq!(c.op, Op::Eq);
        assert_eq!(c.value, Value::Text("admin".into()));
    }
}
