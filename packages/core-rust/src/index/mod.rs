//! Index definitions: primary keys, foreign keys, and plain or unique keys.
//!
//! Index lines are routed through [`INDEX_VARIANTS`] the same way field
//! lines go through the field registry: the first variant whose sniff
//! matches the line parses it.

mod foreign;
mod key;
mod primary;

pub use foreign::{ForeignKeyRef, ReferentialAction};
pub use key::KeyKeyword;

use crate::error::SchemaError;
use crate::sql::{identifier_list, quote_identifier, Cursor};

/// Variant of an index and its variant-specific settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexKind {
    /// Secondary index, written with whichever keyword the DDL used.
    Key { keyword: KeyKeyword },
    Primary,
    Foreign(ForeignKeyRef),
}

/// One index of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDefinition {
    name: Option<String>,
    fields: Vec<String>,
    unique: bool,
    kind: IndexKind,
}

fn dedup(fields: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for field in fields {
        if !out.contains(&field) {
            out.push(field);
        }
    }
    out
}

impl IndexDefinition {
    /// Plain `KEY`.
    #[must_use]
    pub fn key(name: Option<String>, fields: impl IntoIterator<Item = String>) -> Self {
        Self {
            name,
            fields: dedup(fields),
            unique: false,
            kind: IndexKind::Key {
                keyword: KeyKeyword::Key,
            },
        }
    }

    /// `UNIQUE KEY`.
    #[must_use]
    pub fn unique(name: Option<String>, fields: impl IntoIterator<Item = String>) -> Self {
        let mut index = Self::key(name, fields);
        index.unique = true;
        index
    }

    #[must_use]
    pub fn primary(fields: impl IntoIterator<Item = String>) -> Self {
        Self {
            name: None,
            fields: dedup(fields),
            unique: true,
            kind: IndexKind::Primary,
        }
    }

    #[must_use]
    pub fn foreign(
        name: Option<String>,
        fields: impl IntoIterator<Item = String>,
        reference: ForeignKeyRef,
    ) -> Self {
        Self {
            name,
            fields: dedup(fields),
            unique: false,
            kind: IndexKind::Foreign(reference),
        }
    }

    /// Parses one index line of a `CREATE TABLE` body.
    ///
    /// # Errors
    ///
    /// Fails when no variant recognises the line, a required clause is
    /// missing, or text remains after the index.
    pub fn parse(line: &str) -> Result<Self, SchemaError> {
        let variant = IndexVariant::claim(line).ok_or_else(|| SchemaError::UnknownIndexType {
            line: line.to_string(),
        })?;
        let (index, rest) = variant.parse(line)?;
        if !rest.trim().is_empty() {
            return Err(SchemaError::parse(rest, "end of index definition"));
        }
        Ok(index)
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[must_use]
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    #[must_use]
    pub fn kind(&self) -> &IndexKind {
        &self.kind
    }

    #[must_use]
    pub fn is_unique(&self) -> bool {
        self.unique
    }

    #[must_use]
    pub fn is_primary(&self) -> bool {
        matches!(self.kind, IndexKind::Primary)
    }

    #[must_use]
    pub fn foreign_key(&self) -> Option<&ForeignKeyRef> {
        match &self.kind {
            IndexKind::Foreign(reference) => Some(reference),
            _ => None,
        }
    }

    fn label(&self) -> String {
        self.name.clone().unwrap_or_else(|| match self.kind {
            IndexKind::Primary => "PRIMARY".to_string(),
            _ => format!("({})", self.fields.join(",")),
        })
    }

    /// # Errors
    ///
    /// Primary keys cannot be named.
    pub fn set_name(&mut self, name: Option<String>) -> Result<(), SchemaError> {
        if self.is_primary() && name.is_some() {
            return Err(SchemaError::rejected(
                &self.label(),
                "name",
                "primary keys cannot be named",
            ));
        }
        self.name = name;
        Ok(())
    }

    /// # Errors
    ///
    /// Primary keys are always unique; foreign keys are never unique.
    pub fn set_unique(&mut self, unique: bool) -> Result<(), SchemaError> {
        match (&self.kind, unique) {
            (IndexKind::Primary, false) => Err(SchemaError::rejected(
                &self.label(),
                "unique",
                "primary keys are always unique",
            )),
            (IndexKind::Foreign(_), true) => Err(SchemaError::rejected(
                &self.label(),
                "unique",
                "foreign keys cannot be unique",
            )),
            _ => {
                self.unique = unique;
                Ok(())
            }
        }
    }

    /// Promotes an unnamed key to the primary key; demoting is refused.
    ///
    /// # Errors
    ///
    /// Rejected for `false` on a primary key, `true` on a foreign key, and
    /// `true` on a named key.
    pub fn set_primary(&mut self, primary: bool) -> Result<(), SchemaError> {
        match (&self.kind, primary) {
            (IndexKind::Primary, true) | (IndexKind::Key { .. } | IndexKind::Foreign(_), false) => {
                Ok(())
            }
            (IndexKind::Primary, false) => Err(SchemaError::rejected(
                &self.label(),
                "primary",
                "a primary key cannot be demoted",
            )),
            (IndexKind::Foreign(_), true) => Err(SchemaError::rejected(
                &self.label(),
                "primary",
                "foreign keys cannot be primary keys",
            )),
            (IndexKind::Key { .. }, true) if self.name.is_some() => Err(SchemaError::rejected(
                &self.label(),
                "primary",
                "primary keys cannot be named; clear the name first",
            )),
            (IndexKind::Key { .. }, true) => {
                self.kind = IndexKind::Primary;
                self.unique = true;
                Ok(())
            }
        }
    }

    /// Appends a member field, ignoring duplicates.
    pub fn add_field(&mut self, field: impl Into<String>) {
        let field = field.into();
        if !self.fields.contains(&field) {
            self.fields.push(field);
        }
    }

    pub fn set_fields(&mut self, fields: impl IntoIterator<Item = String>) {
        self.fields = dedup(fields);
    }

    /// Renders the index as one line of a `CREATE TABLE` body.
    #[must_use]
    pub fn serialize(&self) -> String {
        let columns = identifier_list(&self.fields);
        let named = self
            .name
            .as_deref()
            .map(|n| format!(" {}", quote_identifier(n)))
            .unwrap_or_default();
        match &self.kind {
            IndexKind::Primary => format!("PRIMARY KEY {columns}"),
            IndexKind::Key { keyword } => format!(
                "{}{}{named} {columns}",
                if self.unique { "UNIQUE " } else { "" },
                keyword.as_sql()
            ),
            IndexKind::Foreign(reference) => reference.render(&named, &columns),
        }
    }
}

/// Registry entry for one index variant.
pub struct IndexVariant {
    pub name: &'static str,
    sniff: fn(&str) -> bool,
    parse: fn(&mut Cursor<'_>) -> Result<IndexDefinition, SchemaError>,
}

impl std::fmt::Debug for IndexVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexVariant").field("name", &self.name).finish()
    }
}

/// Index variants in priority order.
pub static INDEX_VARIANTS: [IndexVariant; 3] = [
    IndexVariant {
        name: "PrimaryKeyDefinition",
        sniff: primary::sniff,
        parse: primary::parse,
    },
    IndexVariant {
        name: "ForeignKeyDefinition",
        sniff: foreign::sniff,
        parse: foreign::parse,
    },
    IndexVariant {
        name: "KeyDefinition",
        sniff: key::sniff,
        parse: key::parse,
    },
];

impl IndexVariant {
    #[must_use]
    pub fn matches(&self, line: &str) -> bool {
        (self.sniff)(line.trim_start())
    }

    #[must_use]
    pub fn claim(line: &str) -> Option<&'static IndexVariant> {
        INDEX_VARIANTS.iter().find(|v| v.matches(line))
    }

    /// Parses an index line and returns it with any unconsumed input.
    ///
    /// # Errors
    ///
    /// Fails naming the first missing clause.
    pub fn parse<'a>(&self, line: &'a str) -> Result<(IndexDefinition, &'a str), SchemaError> {
        let mut cursor = Cursor::new(line);
        let index = (self.parse)(&mut cursor)?;
        tracing::trace!(variant = self.name, fields = ?index.fields, "parsed index definition");
        Ok((index, cursor.rest()))
    }
}
