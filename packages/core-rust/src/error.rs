//! Errors raised by the schema engine.

/// Errors from parsing, mutating, or validating schema definitions.
///
/// `Adjusted` is special: the mutation that produced it has already been
/// applied together with a safe fallback, and the error only reports what
/// was changed behind the caller's back.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("cannot parse '{fragment}': expected {expected}")]
    Parse { fragment: String, expected: String },

    #[error("unknown data type '{type_token}' from SQL '{line}'")]
    UnknownFieldType { type_token: String, line: String },

    #[error("unknown index type in SQL '{line}'")]
    UnknownIndexType { line: String },

    #[error("unrecognised SQL line type: '{line}'")]
    UnrecognisedLine { line: String },

    #[error("problem(s) setting {setting} on field '{field}': {}", .problems.join("; "))]
    Adjusted {
        field: String,
        setting: &'static str,
        problems: Vec<String>,
    },

    #[error("cannot set {setting} on '{target}': {reason}")]
    Rejected {
        target: String,
        setting: &'static str,
        reason: String,
    },

    #[error("attempting to create a table definition without a name")]
    EmptyTableName,

    #[error("field name '{field}' already exists in table '{table}'")]
    DuplicateField { table: String, field: String },

    #[error("index name '{index}' already exists in table '{table}'")]
    DuplicateIndex { table: String, index: String },

    #[error("table '{table}' already has a primary key")]
    DuplicatePrimaryKey { table: String },

    #[error("field name '{field}' in index '{index}' not found in table '{table}'; add fields before indexes")]
    IndexFieldMissing {
        table: String,
        index: String,
        field: String,
    },

    #[error("field '{field}' missing from the data given while validating table '{table}'")]
    MissingField { table: String, field: String },

    #[error("{variant} '{field}' doesn't accept '{value}'; expecting something like '{example}'")]
    InvalidValue {
        variant: &'static str,
        field: String,
        value: String,
        example: String,
    },

    #[error("unknown column(s) {} while validating table '{table}'", .columns.join(", "))]
    UnknownColumns { table: String, columns: Vec<String> },

    #[error("cannot serialize {what}: {reason}")]
    Serialize { what: String, reason: String },
}

impl SchemaError {
    pub(crate) fn parse(fragment: &str, expected: impl Into<String>) -> Self {
        SchemaError::Parse {
            fragment: fragment.to_string(),
            expected: expected.into(),
        }
    }

    pub(crate) fn adjusted(field: &str, setting: &'static str, problems: Vec<String>) -> Self {
        SchemaError::Adjusted {
            field: field.to_string(),
            setting,
            problems,
        }
    }

    pub(crate) fn rejected(target: &str, setting: &'static str, reason: impl Into<String>) -> Self {
        SchemaError::Rejected {
            target: target.to_string(),
            setting,
            reason: reason.into(),
        }
    }

    /// Returns `true` if the error only reports an applied adjustment.
    #[must_use]
    pub fn is_adjustment(&self) -> bool {
        matches!(self, SchemaError::Adjusted { .. })
    }
}

/// Collects adjustment messages during a mutation and turns them into a
/// single [`SchemaError::Adjusted`] at the end.
#[derive(Debug, Default)]
pub(crate) struct Problems(Vec<String>);

impl Problems {
    pub(crate) fn push(&mut self, problem: impl Into<String>) {
        self.0.push(problem.into());
    }

    pub(crate) fn absorb(&mut self, result: Result<(), SchemaError>) -> Result<(), SchemaError> {
        match result {
            Ok(()) => Ok(()),
            Err(SchemaError::Adjusted { problems, .. }) => {
                self.0.extend(problems);
                Ok(())
            }
            Err(other) => Err(other),
        }
    }

    pub(crate) fn finish(self, field: &str, setting: &'static str) -> Result<(), SchemaError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(SchemaError::adjusted(field, setting, self.0))
        }
    }
}
