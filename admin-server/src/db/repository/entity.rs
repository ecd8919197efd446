//! Per-entity mapping descriptor

use shared::query::{Condition, Value};
use shared::util::{last_camel_segment, to_snake_case};
use sqlx::postgres::PgRow;

/// Resolve an entity's primary-key column from its type name and declared
/// columns. Candidates, in priority order: `id`, `<entity>_id`, `<last
/// camel segment>_id` (so `SalesOpportunity` also answers to
/// `opportunity_id`). Returns the first candidate present in the column
/// list.
pub fn resolve_id_column(type_name: &str, columns: &[&str]) -> Option<String> {
    let candidates = [
        "id".to_string(),
        format!("{}_id", to_snake_case(type_name)),
        format!("{}_id", to_snake_case(last_camel_segment(type_name))),
    ];
    candidates
        .into_iter()
        .find(|candidate| columns.contains(&candidate.as_str()))
}

/// Mapping descriptor a type must provide to be stored through [`super::Repo`].
///
/// Each implementation spells out its table and column lists by hand; the
/// descriptor is the single place where model fields and database columns
/// meet. The primary-key column is resolved from [`Entity::COLUMNS`] at
/// call time, not hand-picked per entity.
pub trait Entity: for<'r> sqlx::FromRow<'r, PgRow> + Unpin + Send + Sync {
    /// Table name (rendered quoted, so reserved words are fine)
    const TABLE: &'static str;

    /// Type name, used for primary-key resolution
    const NAME: &'static str;

    /// Column names, declaration order
    const COLUMNS: &'static [&'static str];

    /// Primary-key column, resolved via [`resolve_id_column`]. Every entity
    /// here carries an `id` column, so the fallback never fires in practice.
    fn id_column() -> String {
        resolve_id_column(Self::NAME, Self::COLUMNS).unwrap_or_else(|| "id".to_string())
    }

    /// Primary key value, 0 when unset
    fn id(&self) -> i64;

    /// Store the generated primary key after insert
    fn set_id(&mut self, id: i64);

    /// Columns written on insert. Generated columns (id, defaults the
    /// database fills) are omitted.
    fn insert_columns(&self) -> Vec<(&'static str, Value)>;

    /// Columns written on update: non-zero fields only, never the id.
    fn update_columns(&self) -> Vec<(&'static str, Value)>;

    /// Equality conditions built from non-zero fields, used by
    /// find/find_all/delete-by-example.
    fn filter_conditions(&self) -> Vec<Condition>;
}
