use once_cell::sync::Lazy;
use regex::Regex;

use super::{ColumnRules, FieldKind, FieldType};
use crate::error::SchemaError;
use crate::sql::Cursor;
use crate::types::Value;

static SNIFF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^date\b").expect("valid date sniff regex"));

static DATE_VALUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:(?:\d{4}|\d{2})\D\d{1,2}\D\d{1,2}(?: \d{1,2}\D\d{1,2}\D\d{1,2})?|\d{14}|\d{12}|\d{8}|\d{6}|NOW\(\)|CURRENT_DATE)$",
    )
    .expect("valid date value regex")
});

pub(super) fn sniff(details: &str) -> bool {
    SNIFF.is_match(details)
}

pub(super) fn parse_type(cursor: &mut Cursor<'_>) -> Result<FieldKind, SchemaError> {
    if cursor.eat_keyword("date") {
        Ok(FieldKind::Date(DateField))
    } else {
        Err(SchemaError::parse(cursor.rest(), "date"))
    }
}

fn date_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Int(i) if *i >= 0 => Some(i.to_string()),
        _ => None,
    }
}

/// `date` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateField;

impl DateField {
    pub const VARIANT: &'static str = "DateFieldDefinition";
}

impl ColumnRules for DateField {
    fn type_sql(&self) -> String {
        "date".to_string()
    }

    fn field_type(&self) -> FieldType {
        FieldType::Date
    }

    fn is_valid(&self, value: &Value) -> bool {
        date_text(value).is_some_and(|text| DATE_VALUE.is_match(&text))
    }

    fn repair(&self, value: &Value) -> Option<Value> {
        let text = date_text(value)?;
        let trimmed = text.trim();
        DATE_VALUE
            .is_match(trimmed)
            .then(|| Value::String(trimmed.to_string()))
    }

    fn example_value(&self) -> Value {
        Value::from("2000-12-31")
    }
}
