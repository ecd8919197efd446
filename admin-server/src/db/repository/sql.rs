//! SQL rendering for query options
//!
//! Produces PostgreSQL statements with `$n` placeholders. Condition values
//! are pushed onto the args vector in render order; `in`/`notin` lists are
//! expanded element by element so the bind list never contains a list value.

use shared::query::{Condition, Op, QueryOption, Value};

/// Quote an identifier. All identifiers are internal, quoting only guards
/// against reserved words (`user`, `key`, ...).
pub(crate) fn ident(name: &str) -> String {
    format!("\"{}\"", name)
}

fn text_of(value: &Value) -> String {
    match value {
        Value::Text(s) => s.clone(),
        Value::I64(i) => i.to_string(),
        Value::F64(f) => f.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::DateTime(dt) => dt.to_rfc3339(),
        Value::Null => String::new(),
        Value::List(_) => String::new(),
    }
}

/// Render one condition, appending its bind values to `args`.
/// Returns `None` for ill-formed conditions, which are skipped.
fn render_condition(cond: &Condition, args: &mut Vec<Value>) -> Option<String> {
    let field = ident(&cond.field);
    let clause = match cond.op {
        Op::Eq | Op::Ne | Op::Gt | Op::Lt | Op::Ge | Op::Le => {
            let op = match cond.op {
                Op::Eq => "=",
                Op::Ne => "!=",
                Op::Gt => ">",
                Op::Lt => "<",
                Op::Ge => ">=",
                _ => "<=",
            };
            args.push(cond.value.clone());
            format!("{field} {op} ${}", args.len())
        }
        Op::Like => {
            args.push(Value::Text(format!("%{}%", text_of(&cond.value))));
            format!("{field} LIKE ${}", args.len())
        }
        Op::StartsWith => {
            args.push(Value::Text(format!("{}%", text_of(&cond.value))));
            format!("{field} LIKE ${}", args.len())
        }
        Op::EndsWith => {
            args.push(Value::Text(format!("%{}", text_of(&cond.value))));
            format!("{field} LIKE ${}", args.len())
        }
        Op::In | Op::NotIn => {
            let items: Vec<Value> = match &cond.value {
                Value::List(items) => items.clone(),
                // A scalar is treated as a one-element sequence
                other => vec![other.clone()],
            };
            if items.is_empty() {
                // Empty IN matches nothing; empty NOT IN excludes nothing
                return Some(if cond.op == Op::In {
                    "FALSE".to_string()
                } else {
                    "TRUE".to_string()
                });
            }
            let mut placeholders = Vec::with_capacity(items.len());
            for item in items {
                args.push(item);
                placeholders.push(format!("${}", args.len()));
            }
            let keyword = if cond.op == Op::In { "IN" } else { "NOT IN" };
            format!("{field} {keyword} ({})", placeholders.join(", "))
        }
        Op::Null => format!("{field} IS NULL"),
        Op::NotNull => format!("{field} IS NOT NULL"),
    };
    Some(clause)
}

/// Render ` WHERE ...` (empty string when there are no usable conditions)
pub(crate) fn render_where(filters: &[Condition], args: &mut Vec<Value>) -> String {
    let clauses: Vec<String> = filters
        .iter()
        .filter_map(|cond| render_condition(cond, args))
        .collect();
    if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    }
}

/// Render the tail of a SELECT: where / order by / limit / offset / lock
pub(crate) fn render_tail(opts: &QueryOption, args: &mut Vec<Value>) -> String {
    let mut sql = render_where(&opts.filters, args);
    if let Some(order_by) = &opts.order_by {
        sql.push_str(&format!(" ORDER BY {order_by}"));
    }
    if opts.limit > 0 {
        sql.push_str(&format!(" LIMIT {}", opts.limit));
        if opts.offset > 0 {
            sql.push_str(&format!(" OFFSET {}", opts.offset));
        }
    }
    if let Some(lock) = opts.lock {
        sql.push_str(&format!(" {lock}"));
    }
    sql
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::query::Condition;

    #[test]
    fn test_eq_condition() {
        let mut args = Vec::new();
        let sql = render_where(&[Condition::eq("username", "admin")], &mut args);
        assert_eq!(sql, " WHERE \"username\" = $1");
        assert_eq!(args, vec![Value::Text("admin".into())]);
    }

    #[test]
    fn test_like_wrapping() {
        let mut args = Vec::new();
        let conds = vec![
            Condition::new("name", Op::Like, "ad"),
            Condition::new("code", Op::StartsWith, "AD"),
            Condition::new("path", Op::EndsWith, "/list"),
        ];
        let sql = render_where(&conds, &mut args);
        assert_eq!(
            sql,
            " WHERE \"name\" LIKE $1 AND \"code\" LIKE $2 AND \"path\" LIKE $3"
        );
        assert_eq!(
            args,
            vec![
                Value::Text("%ad%".into()),
                Value::Text("AD%".into()),
                Value::Text("%/list".into()),
            ]
        );
    }

    #[test]
    fn test_in_expansion() {
        let mut args = Vec::new();
        let sql = render_where(
            &[Condition::new("id", Op::In, vec![1i64, 2, 3])],
            &mut args,
        );
        assert_eq!(sql, " WHERE \"id\" IN ($1, $2, $3)");
        assert_eq!(args.len(), 3);
    }

    #[test]
    fn test_empty_in_matches_nothing() {
        let mut args = Vec::new();
        let sql = render_where(
            &[Condition::new("id", Op::In, Value::List(vec![]))],
            &mut args,
        );
        assert_eq!(sql, " WHERE FALSE");
        assert!(args.is_empty());

        let sql = render_where(
            &[Condition::new("id", Op::NotIn, Value::List(vec![]))],
            &mut args,
        );
        assert_eq!(sql, " WHERE TRUE");
    }

    #[test]
    fn test_scalar_in_treated_as_single_element() {
        let mut args = Vec::new();
        let sql = render_where(&[Condition::new("role_id", Op::In, 7i64)], &mut args);
        assert_eq!(sql, " WHERE \"role_id\" IN ($1)");
        assert_eq!(args, vec![Value::I64(7)]);
    }

    #[test]
    fn test_null_ops_take_no_args() {
        let mut args = Vec::new();
        let conds = vec![
            Condition::new("parent_id", Op::Null, Value::Null),
            Condition::new("path", Op::NotNull, Value::Null),
        ];
        let sql = render_where(&conds, &mut args);
        assert_eq!(sql, " WHERE \"parent_id\" IS NULL AND \"path\" IS NOT NULL");
        assert!(args.is_empty());
    }

    #[test]
    fn test_tail_with_order_limit_lock() {
        let mut args = Vec::new();
        let opts = QueryOption {
            filters: vec![Condition::eq("status", 1i64)],
            order_by: Some("id DESC".into()),
            limit: 10,
            offset: 20,
            lock: Some("FOR UPDATE"),
        };
        let sql = render_tail(&opts, &mut args);
        assert_eq!(
            sql,
            " WHERE \"status\" = $1 ORDER BY id DESC LIMIT 10 OFFSET 20 FOR UPDATE"
        );
    }

    #[test]
    fn test_placeholder_numbering_across_conditions() {
        let mut args = Vec::new();
        let conds = vec![
            Condition::eq("user_id", 5i64),
            Condition::new("role_id", Op::In, vec![1i64, 2]),
        ];
        let sql = render_where(&conds, &mut args);
        assert_eq!(sql, " WHERE \"user_id\" = $1 AND \"role_id\" IN ($2, $3)");
        assert_eq!(args.len(), 3);
    }
}
