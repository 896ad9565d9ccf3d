use once_cell::sync::Lazy;
use regex::Regex;

use super::IndexDefinition;
use crate::error::SchemaError;
use crate::sql::Cursor;

static SNIFF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^PRIMARY\s+KEY\b").expect("valid primary key sniff regex"));

pub(super) fn sniff(line: &str) -> bool {
    SNIFF.is_match(line)
}

/// `PRIMARY KEY (`a`,...)`. Primary keys carry no name.
pub(super) fn parse(cursor: &mut Cursor<'_>) -> Result<IndexDefinition, SchemaError> {
    cursor.expect_keywords(&["PRIMARY", "KEY"])?;
    if cursor.rest().starts_with('`') {
        return Err(SchemaError::parse(
            cursor.rest(),
            "field list (primary keys are never named)",
        ));
    }
    let fields = cursor.expect_identifier_list("primary key field list")?;
    Ok(IndexDefinition::primary(fields))
}
