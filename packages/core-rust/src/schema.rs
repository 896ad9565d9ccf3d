//! Table definitions: ordered fields and indexes under a table name, with
//! whole-statement `CREATE TABLE` parsing and serialization and per-row
//! validation.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::SchemaError;
use crate::field::FieldDefinition;
use crate::index::IndexDefinition;
use crate::sql::{quote_identifier, Cursor};
use crate::types::{Row, Value};

static INDEX_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:PRIMARY|UNIQUE|FOREIGN|CONSTRAINT|KEY|INDEX)\b").expect("valid index line regex")
});

/// Schema of one table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableDefinition {
    name: String,
    fields: Vec<FieldDefinition>,
    indexes: Vec<IndexDefinition>,
    allow_existing: bool,
    options: Option<String>,
}

impl TableDefinition {
    /// Creates an empty definition.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::EmptyTableName`] for an empty name.
    pub fn new(name: impl Into<String>) -> Result<Self, SchemaError> {
        let name = name.into();
        if name.is_empty() {
            return Err(SchemaError::EmptyTableName);
        }
        Ok(Self {
            name,
            fields: Vec::new(),
            indexes: Vec::new(),
            allow_existing: false,
            options: None,
        })
    }

    /// Parses a `CREATE TABLE` statement with one field or index per line.
    ///
    /// # Errors
    ///
    /// Fails on a malformed header or closing line, an unrecognised body
    /// line, or any field/index error.
    pub fn parse(ddl: &str) -> Result<Self, SchemaError> {
        Self::parse_with_prefix(ddl, "")
    }

    /// Like [`parse`](Self::parse), stripping `prefix` from the table name.
    ///
    /// # Errors
    ///
    /// See [`parse`](Self::parse).
    pub fn parse_with_prefix(ddl: &str, prefix: &str) -> Result<Self, SchemaError> {
        let mut lines = ddl.lines().map(str::trim).filter(|line| !line.is_empty());

        let header = lines
            .next()
            .ok_or_else(|| SchemaError::parse(ddl, "CREATE TABLE"))?;
        let mut cursor = Cursor::new(header);
        cursor.expect_keywords(&["CREATE", "TABLE"])?;
        let allow_existing = cursor.eat_keywords(&["IF", "NOT", "EXISTS"]);
        let full_name = cursor.expect_identifier("backtick-quoted table name")?;
        cursor.expect_char('(', "opening parenthesis")?;
        if !cursor.is_empty() {
            return Err(SchemaError::parse(cursor.rest(), "line break after opening parenthesis"));
        }

        let name = if prefix.is_empty() {
            full_name.as_str()
        } else {
            full_name.strip_prefix(prefix).unwrap_or(&full_name)
        };
        let mut table = Self::new(name)?;
        table.allow_existing = allow_existing;

        let body: Vec<&str> = lines.collect();
        let (closing, middle) = body
            .split_last()
            .ok_or_else(|| SchemaError::parse(header, "closing parenthesis line"))?;
        let options = closing
            .strip_prefix(')')
            .ok_or_else(|| SchemaError::parse(closing, "closing parenthesis"))?
            .trim();
        if !options.is_empty() {
            table.options = Some(options.to_string());
        }

        for raw in middle {
            let line = raw.strip_suffix(',').unwrap_or(raw).trim_end();
            if line.is_empty() {
                continue;
            }
            if line.starts_with('`') {
                table.add_field(FieldDefinition::parse(line)?)?;
            } else if INDEX_LINE.is_match(line) {
                table.add_index(IndexDefinition::parse(line)?)?;
            } else {
                return Err(SchemaError::UnrecognisedLine {
                    line: line.to_string(),
                });
            }
        }
        tracing::debug!(
            table = %table.name,
            fields = table.fields.len(),
            indexes = table.indexes.len(),
            "parsed table definition"
        );
        Ok(table)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name() == name)
    }

    /// Mutable access for adjusting a field in place.
    pub fn field_mut(&mut self, name: &str) -> Option<&mut FieldDefinition> {
        self.fields.iter_mut().find(|f| f.name() == name)
    }

    #[must_use]
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(FieldDefinition::name).collect()
    }

    #[must_use]
    pub fn indexes(&self) -> &[IndexDefinition] {
        &self.indexes
    }

    #[must_use]
    pub fn primary_key(&self) -> Option<&IndexDefinition> {
        self.indexes.iter().find(|i| i.is_primary())
    }

    /// Table options that followed the closing parenthesis in parsed DDL.
    #[must_use]
    pub fn options(&self) -> Option<&str> {
        self.options.as_deref()
    }

    #[must_use]
    pub fn allow_existing(&self) -> bool {
        self.allow_existing
    }

    /// Toggles `IF NOT EXISTS` on serialization.
    pub fn set_allow_existing(&mut self, allow: bool) {
        self.allow_existing = allow;
    }

    /// # Errors
    ///
    /// Fails if a field with the same name exists.
    pub fn add_field(&mut self, field: FieldDefinition) -> Result<&mut Self, SchemaError> {
        if self.field(field.name()).is_some() {
            return Err(SchemaError::DuplicateField {
                table: self.name.clone(),
                field: field.name().to_string(),
            });
        }
        self.fields.push(field);
        Ok(self)
    }

    /// # Errors
    ///
    /// Fails when a member field does not exist yet, the name clashes with
    /// another index, or a second primary key is added.
    pub fn add_index(&mut self, index: IndexDefinition) -> Result<&mut Self, SchemaError> {
        let label = index.name().unwrap_or("PRIMARY").to_string();
        if index.fields().is_empty() {
            return Err(SchemaError::rejected(
                &label,
                "fields",
                "an index needs at least one field",
            ));
        }
        if let Some(missing) = index.fields().iter().find(|f| self.field(f).is_none()) {
            return Err(SchemaError::IndexFieldMissing {
                table: self.name.clone(),
                index: label,
                field: missing.clone(),
            });
        }
        if let Some(name) = index.name() {
            if self.indexes.iter().any(|i| i.name() == Some(name)) {
                return Err(SchemaError::DuplicateIndex {
                    table: self.name.clone(),
                    index: name.to_string(),
                });
            }
        }
        if index.is_primary() && self.primary_key().is_some() {
            return Err(SchemaError::DuplicatePrimaryKey {
                table: self.name.clone(),
            });
        }
        self.indexes.push(index);
        Ok(self)
    }

    /// Renders the `CREATE TABLE` statement.
    ///
    /// # Errors
    ///
    /// Fails for a table without fields or with an unnamed field.
    pub fn serialize(&self) -> Result<String, SchemaError> {
        self.serialize_with_prefix("")
    }

    /// Like [`serialize`](Self::serialize), prepending `prefix` to the table
    /// name.
    ///
    /// # Errors
    ///
    /// See [`serialize`](Self::serialize).
    pub fn serialize_with_prefix(&self, prefix: &str) -> Result<String, SchemaError> {
        if self.fields.is_empty() {
            return Err(SchemaError::Serialize {
                what: format!("table '{}'", self.name),
                reason: "a table needs at least one field".to_string(),
            });
        }
        if self.fields.iter().any(|f| f.name().is_empty()) {
            return Err(SchemaError::Serialize {
                what: format!("table '{}'", self.name),
                reason: "every field needs a name".to_string(),
            });
        }
        let lines: Vec<String> = self
            .fields
            .iter()
            .map(FieldDefinition::serialize)
            .chain(self.indexes.iter().map(IndexDefinition::serialize))
            .collect();
        Ok(format!(
            "CREATE TABLE {}{} (\n  {}\n)",
            if self.allow_existing { "IF NOT EXISTS " } else { "" },
            quote_identifier(&format!("{prefix}{}", self.name)),
            lines.join(",\n  ")
        ))
    }

    /// Checks a row against the table and returns it completed with
    /// defaults for missing non-nullable fields.
    ///
    /// Auto-increment fields may be omitted; the database assigns them.
    ///
    /// # Errors
    ///
    /// [`SchemaError::MissingField`] for an absent non-nullable field with
    /// no default, [`SchemaError::InvalidValue`] for a value the field
    /// rejects, and [`SchemaError::UnknownColumns`] for keys that are not
    /// fields of this table.
    pub fn validate(&self, row: &Row) -> Result<Row, SchemaError> {
        let mut completed = Row::new();
        for field in &self.fields {
            let name = field.name();
            match row.get(name).filter(|v| !v.is_null()) {
                Some(value) => {
                    if !field.is_valid_value(value) {
                        return Err(SchemaError::InvalidValue {
                            variant: field.variant_name(),
                            field: name.to_string(),
                            value: value.to_string(),
                            example: field.example_value().to_string(),
                        });
                    }
                    completed.insert(name.to_string(), value.clone());
                }
                None if field.is_nullable() || field.extra() == Some("auto_increment") => {
                    if row.contains_key(name) {
                        completed.insert(name.to_string(), Value::Null);
                    }
                }
                None => match field.default_value() {
                    Some(default) => {
                        completed.insert(name.to_string(), default.clone());
                    }
                    None => {
                        return Err(SchemaError::MissingField {
                            table: self.name.clone(),
                            field: name.to_string(),
                        })
                    }
                },
            }
        }

        let unknown: Vec<String> = row
            .keys()
            .filter(|key| self.field(key).is_none())
            .cloned()
            .collect();
        if !unknown.is_empty() {
            return Err(SchemaError::UnknownColumns {
                table: self.name.clone(),
                columns: unknown,
            });
        }
        Ok(completed)
    }

    /// Runs each field's repair over the row. Values that cannot be
    /// repaired, and keys that are not fields, are left as they were.
    #[must_use]
    pub fn repair(&self, row: &Row) -> Row {
        row.iter()
            .map(|(key, value)| {
                let repaired = self
                    .field(key)
                    .and_then(|field| field.repair(value))
                    .unwrap_or_else(|| value.clone());
                (key.clone(), repaired)
            })
            .collect()
    }
}
