//! Statement helpers and single-column rows.

use sea_orm::{DatabaseBackend, FromQueryResult, Statement, Value};

/// Build a MySQL statement with positional values.
pub(crate) fn statement<I>(sql: &str, values: I) -> Statement
where
    I: IntoIterator<Item = Value>,
{
    Statement::from_sql_and_values(DatabaseBackend::MySql, sql, values)
}

/// A single text column aliased `value`.
#[derive(Debug, FromQueryResult)]
pub(crate) struct TextRow {
    pub value: Option<String>,
}

/// A single integer column aliased `total`.
#[derive(Debug, FromQueryResult)]
pub(crate) struct CountRow {
    pub total: Option<i64>,
}

impl CountRow {
    pub(crate) fn get(row: Option<Self>) -> i64 {
        row.and_then(|r| r.total).unwrap_or(0)
    }
}

/// Non-null, non-empty text values.
pub(crate) fn texts(rows: Vec<TextRow>) -> Vec<String> {
    rows.into_iter()
        .filter_map(|r| r.value)
        .filter(|v| !v.is_empty())
        .collect()
}
