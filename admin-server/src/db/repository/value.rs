//! Bind-value helpers and weakly-typed row decoding

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use shared::query::Value;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::{Query, QueryAs, QueryScalar};
use sqlx::{Column, Postgres, Row};
use std::collections::HashMap;

/// Bind one [`Value`] onto a plain query
pub(crate) fn bind<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: &'q Value,
) -> Query<'q, Postgres, PgArguments> {
    match value {
        Value::Null => query.bind(Option::<String>::None),
        Value::Bool(v) => query.bind(*v),
        Value::I64(v) => query.bind(*v),
        Value::F64(v) => query.bind(*v),
        Value::Text(v) => query.bind(v.as_str()),
        Value::DateTime(v) => query.bind(*v),
        // Lists are expanded into scalars by the SQL renderer
        Value::List(_) => query,
    }
}

/// Bind one [`Value`] onto a typed query
pub(crate) fn bind_as<'q, T>(
    query: QueryAs<'q, Postgres, T, PgArguments>,
    value: &'q Value,
) -> QueryAs<'q, Postgres, T, PgArguments> {
    match value {
        Value::Null => query.bind(Option::<String>::None),
        Value::Bool(v) => query.bind(*v),
        Value::I64(v) => query.bind(*v),
        Value::F64(v) => query.bind(*v),
        Value::Text(v) => query.bind(v.as_str()),
        Value::DateTime(v) => query.bind(*v),
        Value::List(_) => query,
    }
}

/// Bind one [`Value`] onto a scalar query
pub(crate) fn bind_scalar<'q, T>(
    query: QueryScalar<'q, Postgres, T, PgArguments>,
    value: &'q Value,
) -> QueryScalar<'q, Postgres, T, PgArguments> {
    match value {
        Value::Null => query.bind(Option::<String>::None),
        Value::Bool(v) => query.bind(*v),
        Value::I64(v) => query.bind(*v),
        Value::F64(v) => query.bind(*v),
        Value::Text(v) => query.bind(v.as_str()),
        Value::DateTime(v) => query.bind(*v),
        Value::List(_) => query,
    }
}

/// Decode a raw row into a weakly-typed column map.
///
/// Types are probed in order; anything unrecognized falls back to its text
/// rendition so callers can coerce with [`parse_datetime`] and friends.
pub fn decode_row(row: &PgRow) -> HashMap<String, Value> {
    let mut out = HashMap::with_capacity(row.columns().len());
    for (idx, column) in row.columns().iter().enumerate() {
        out.insert(column.name().to_string(), decode_column(row, idx));
    }
    out
}

fn decode_column(row: &PgRow, idx: usize) -> Value {
    if let Ok(v) = row.try_get::<Option<i64>, _>(idx) {
        return v.map(Value::I64).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<i32>, _>(idx) {
        return v.map(|n| Value::I64(n as i64)).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<i16>, _>(idx) {
        return v.map(|n| Value::I64(n as i64)).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(idx) {
        return v.map(Value::F64).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<bool>, _>(idx) {
        return v.map(Value::Bool).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<DateTime<Utc>>, _>(idx) {
        return v.map(Value::DateTime).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<NaiveDateTime>, _>(idx) {
        return v
            .map(|n| Value::DateTime(Utc.from_utc_datetime(&n)))
            .unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<String>, _>(idx) {
        return v.map(Value::Text).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<Vec<u8>>, _>(idx) {
        return v
            .map(|bytes| Value::Text(String::from_utf8_lossy(&bytes).into_owned()))
            .unwrap_or(Value::Null);
    }
    Value::Null
}

/// Datetime layouts tried in declaration order
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y",
];

/// Parse a datetime string of unknown layout.
///
/// Tries RFC 3339, then the space- and slash-separated layouts (EU before
/// US), finally a numeric epoch in seconds or milliseconds.
pub fn parse_datetime(input: &str) -> Option<DateTime<Utc>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(Utc.from_utc_datetime(&dt));
        }
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?));
        }
    }

    // Numeric epoch: seconds first, milliseconds for values past year ~33658
    if let Ok(epoch) = trimmed.parse::<i64>() {
        if epoch.abs() < 1_000_000_000_000 {
            return Utc.timestamp_opt(epoch, 0).single();
        }
        return Utc.timestamp_millis_opt(epoch).single();
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_parse_rfc3339() {
        let dt = parse_datetime("2025-03-01T12:30:00Z").unwrap();
        assert_eq!(dt.year(), 2025);
        assert_eq!(dt.month(), 3);
    }

    #[test]
    fn test_parse_space_separated() {
        let dt = parse_datetime("2025-03-01 12:30:00").unwrap();
        assert_eq!(dt.day(), 1);
    }

    #[test]
    fn test_parse_date_only() {
        let dt = parse_datetime("2025-03-01").unwrap();
        assert_eq!(dt.month(), 3);
        let dt = parse_datetime("2025/03/01").unwrap();
        assert_eq!(dt.month(), 3);
    }

    #[test]
    fn test_eu_layout_wins_over_us() {
        // 02/03 is ambiguous; the EU layout is tried first
        let dt = parse_datetime("02/03/2025").unwrap();
        assert_eq!(dt.day(), 2);
        assert_eq!(dt.month(), 3);
    }

    #[test]
    fn test_parse_epoch_seconds_and_millis() {
        let dt = parse_datetime("1700000000").unwrap();
        assert_eq!(dt.year(), 2023);
        let dt = parse_datetime("1700000000000").unwrap();
        assert_eq!(dt.year(), 2023);
    }

    #[test]
    fn test_garbage_is_none() {
        assert!(parse_datetime("").is_none());
        assert!(parse_datetime("not a date").is_none());
    }
}
