use once_cell::sync::Lazy;
use regex::Regex;

use super::{IndexDefinition, IndexKind};
use crate::error::SchemaError;
use crate::sql::Cursor;

static SNIFF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:UNIQUE\s+)?(?:KEY|INDEX)\b").expect("valid key sniff regex")
});

/// Keyword a secondary index was declared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyKeyword {
    #[default]
    Key,
    Index,
}

impl KeyKeyword {
    #[must_use]
    pub fn as_sql(self) -> &'static str {
        match self {
            KeyKeyword::Key => "KEY",
            KeyKeyword::Index => "INDEX",
        }
    }
}

pub(super) fn sniff(line: &str) -> bool {
    SNIFF.is_match(line)
}

/// `[UNIQUE ](KEY|INDEX)[ `name`] (`a`,...)`.
pub(super) fn parse(cursor: &mut Cursor<'_>) -> Result<IndexDefinition, SchemaError> {
    let unique = cursor.eat_keyword("UNIQUE");
    let keyword = if cursor.eat_keyword("KEY") {
        KeyKeyword::Key
    } else if cursor.eat_keyword("INDEX") {
        KeyKeyword::Index
    } else {
        return Err(SchemaError::parse(cursor.rest(), "KEY or INDEX"));
    };
    let name = cursor.eat_identifier()?;
    let fields = cursor.expect_identifier_list("key field list")?;

    let mut index = IndexDefinition::key(name, fields);
    index.unique = unique;
    index.kind = IndexKind::Key { keyword };
    Ok(index)
}
