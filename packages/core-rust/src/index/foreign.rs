use once_cell::sync::Lazy;
use regex::Regex;

use super::IndexDefinition;
use crate::error::SchemaError;
use crate::sql::{identifier_list, quote_identifier, Cursor};

static SNIFF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:CONSTRAINT\b|FOREIGN\s+KEY\b)").expect("valid foreign key sniff regex")
});

pub(super) fn sniff(line: &str) -> bool {
    SNIFF.is_match(line)
}

/// What the database does to referencing rows when the referenced row
/// changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferentialAction {
    Restrict,
    Cascade,
    SetNull,
    NoAction,
}

impl ReferentialAction {
    #[must_use]
    pub fn as_sql(self) -> &'static str {
        match self {
            ReferentialAction::Restrict => "RESTRICT",
            ReferentialAction::Cascade => "CASCADE",
            ReferentialAction::SetNull => "SET NULL",
            ReferentialAction::NoAction => "NO ACTION",
        }
    }

    fn parse(cursor: &mut Cursor<'_>) -> Result<Self, SchemaError> {
        if cursor.eat_keyword("RESTRICT") {
            Ok(ReferentialAction::Restrict)
        } else if cursor.eat_keyword("CASCADE") {
            Ok(ReferentialAction::Cascade)
        } else if cursor.eat_keywords(&["SET", "NULL"]) {
            Ok(ReferentialAction::SetNull)
        } else if cursor.eat_keywords(&["NO", "ACTION"]) {
            Ok(ReferentialAction::NoAction)
        } else {
            Err(SchemaError::parse(
                cursor.rest(),
                "RESTRICT, CASCADE, SET NULL or NO ACTION",
            ))
        }
    }
}

/// The referencing side of a foreign key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyRef {
    constraint: Option<String>,
    table: String,
    fields: Vec<String>,
    on_delete: Option<ReferentialAction>,
    on_update: Option<ReferentialAction>,
}

impl ForeignKeyRef {
    #[must_use]
    pub fn new(table: impl Into<String>, fields: Vec<String>) -> Self {
        Self {
            constraint: None,
            table: table.into(),
            fields,
            on_delete: None,
            on_update: None,
        }
    }

    #[must_use]
    pub fn with_constraint(mut self, constraint: impl Into<String>) -> Self {
        self.constraint = Some(constraint.into());
        self
    }

    #[must_use]
    pub fn on_delete(mut self, action: ReferentialAction) -> Self {
        self.on_delete = Some(action);
        self
    }

    #[must_use]
    pub fn on_update(mut self, action: ReferentialAction) -> Self {
        self.on_update = Some(action);
        self
    }

    #[must_use]
    pub fn constraint(&self) -> Option<&str> {
        self.constraint.as_deref()
    }

    /// Referenced table.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Referenced fields, in order.
    #[must_use]
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    #[must_use]
    pub fn delete_action(&self) -> Option<ReferentialAction> {
        self.on_delete
    }

    #[must_use]
    pub fn update_action(&self) -> Option<ReferentialAction> {
        self.on_update
    }

    pub(super) fn render(&self, named: &str, columns: &str) -> String {
        let mut sql = String::new();
        if let Some(constraint) = &self.constraint {
            sql.push_str("CONSTRAINT ");
            sql.push_str(&quote_identifier(constraint));
            sql.push(' ');
        }
        sql.push_str(&format!(
            "FOREIGN KEY{named} {columns} REFERENCES {} {}",
            quote_identifier(&self.table),
            identifier_list(&self.fields)
        ));
        if let Some(action) = self.on_delete {
            sql.push_str(" ON DELETE ");
            sql.push_str(action.as_sql());
        }
        if let Some(action) = self.on_update {
            sql.push_str(" ON UPDATE ");
            sql.push_str(action.as_sql());
        }
        sql
    }
}

/// `[CONSTRAINT `c` ]FOREIGN KEY[ `name`] (`a`,...) REFERENCES `t` (`b`,...)
/// [ON DELETE action] [ON UPDATE action]`.
pub(super) fn parse(cursor: &mut Cursor<'_>) -> Result<IndexDefinition, SchemaError> {
    let constraint = if cursor.eat_keyword("CONSTRAINT") {
        Some(cursor.expect_identifier("constraint name")?)
    } else {
        None
    };
    cursor.expect_keywords(&["FOREIGN", "KEY"])?;
    let name = cursor.eat_identifier()?;
    let fields = cursor.expect_identifier_list("local field list")?;
    cursor.expect_keywords(&["REFERENCES"])?;
    let table = cursor.expect_identifier("referenced table name")?;
    let foreign_fields = cursor.expect_identifier_list("referenced field list")?;

    let mut reference = ForeignKeyRef::new(table, foreign_fields);
    reference.constraint = constraint;
    if cursor.eat_keywords(&["ON", "DELETE"]) {
        reference.on_delete = Some(ReferentialAction::parse(cursor)?);
    }
    if cursor.eat_keywords(&["ON", "UPDATE"]) {
        reference.on_update = Some(ReferentialAction::parse(cursor)?);
    }
    Ok(IndexDefinition::foreign(name, fields, reference))
}
