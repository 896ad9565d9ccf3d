//! Error types for the database layer.

use strata_core::SchemaError;

/// Failure reported by a [`Driver`](crate::driver::Driver).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DriverError {
    /// The statement referenced a table the database does not have.
    #[error("table '{table}' doesn't exist: {message}")]
    TableNotFound { table: String, message: String },
    /// Any other execution failure.
    #[error("{message}")]
    Failed { message: String },
}

/// Errors surfaced by [`Database`](crate::Database).
///
/// Every execution failure carries the statement that caused it.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("error while executing query: {message}\nfor SQL: {sql}")]
    Execution { message: String, sql: String },
    #[error("warning while executing query '{level} ({code}): {message}'\nfor SQL: {sql}")]
    Warning {
        level: String,
        code: u32,
        message: String,
        sql: String,
    },
    #[error("table '{table}' not found{}\nfor SQL: {sql}", hint_suffix(.hint.as_deref()))]
    TableNotFound {
        table: String,
        sql: String,
        hint: Option<String>,
    },
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

fn hint_suffix(hint: Option<&str>) -> String {
    hint.map(|h| format!(" ({h})")).unwrap_or_default()
}

impl DbError {
    /// The statement text attached to an execution failure.
    #[must_use]
    pub fn sql(&self) -> Option<&str> {
        match self {
            DbError::Execution { sql, .. }
            | DbError::Warning { sql, .. }
            | DbError::TableNotFound { sql, .. } => Some(sql),
            DbError::Schema(_) => None,
        }
    }
}
