//! The seam between the cache layer and an actual database connection.

use strata_core::Row;

use crate::error::DriverError;

/// A diagnostic the database attached to an otherwise successful statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    /// `Note`, `Warning` or `Error`.
    pub level: String,
    pub code: u32,
    pub message: String,
}

impl Warning {
    #[must_use]
    pub fn new(level: impl Into<String>, code: u32, message: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            code,
            message: message.into(),
        }
    }

    /// Notes are informational and never fail a statement.
    #[must_use]
    pub fn is_note(&self) -> bool {
        self.level.eq_ignore_ascii_case("note")
    }
}

/// Outcome of one executed statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatementResult {
    /// `Some` when the statement produced a result set, even an empty one.
    pub rows: Option<Vec<Row>>,
    pub warnings: Vec<Warning>,
}

impl StatementResult {
    /// A statement that returned a result set.
    #[must_use]
    pub fn rows(rows: Vec<Row>) -> Self {
        Self {
            rows: Some(rows),
            warnings: Vec::new(),
        }
    }

    /// A statement without a result set (DDL, DML).
    #[must_use]
    pub fn done() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_warning(mut self, warning: Warning) -> Self {
        self.warnings.push(warning);
        self
    }

    /// First warning that is not a note.
    #[must_use]
    pub fn first_problem(&self) -> Option<&Warning> {
        self.warnings.iter().find(|w| !w.is_note())
    }
}

/// Executes SQL text against a database.
///
/// Implementations report a missing table as [`DriverError::TableNotFound`]
/// so the caller can provision it and retry.
pub trait Driver {
    /// Runs one statement.
    ///
    /// # Errors
    ///
    /// Any failure reported by the database.
    fn execute(&mut self, sql: &str) -> Result<StatementResult, DriverError>;
}

impl<D: Driver + ?Sized> Driver for Box<D> {
    fn execute(&mut self, sql: &str) -> Result<StatementResult, DriverError> {
        (**self).execute(sql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notes_are_not_problems() {
        let result = StatementResult::done()
            .with_warning(Warning::new("Note", 1051, "Unknown table"))
            .with_warning(Warning::new("Warning", 1265, "Data truncated"));
        let problem = result.first_problem().unwrap();
        assert_eq!(problem.code, 1265);

        let quiet = StatementResult::done().with_warning(Warning::new("NOTE", 1, "fine"));
        assert!(quiet.first_problem().is_none());
    }

    #[test]
    fn empty_result_set_differs_from_no_result_set() {
        assert_eq!(StatementResult::rows(Vec::new()).rows, Some(Vec::new()));
        assert_eq!(StatementResult::done().rows, None);
    }
}
