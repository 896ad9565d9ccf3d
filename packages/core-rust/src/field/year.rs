use once_cell::sync::Lazy;
use regex::Regex;

use super::{ColumnRules, FieldKind, FieldType};
use crate::error::SchemaError;
use crate::sql::Cursor;
use crate::types::Value;

static SNIFF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^year\b").expect("valid year sniff regex"));

static YEAR_VALUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:\d{1,2}|\d{4}|NOW\(\)|CURRENT_DATE)$").expect("valid year value regex")
});

pub(super) fn sniff(details: &str) -> bool {
    SNIFF.is_match(details)
}

pub(super) fn parse_type(cursor: &mut Cursor<'_>) -> Result<FieldKind, SchemaError> {
    if !cursor.eat_keyword("year") {
        return Err(SchemaError::parse(cursor.rest(), "year"));
    }
    let width = match cursor.eat_type_args()? {
        Some((width @ (2 | 4), None)) => Some(width),
        Some(_) => return Err(SchemaError::parse(cursor.rest(), "year width of 2 or 4")),
        None => None,
    };
    Ok(FieldKind::Year(YearField { width }))
}

fn year_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Int(i) if *i >= 0 => Some(i.to_string()),
        _ => None,
    }
}

/// `year` column, optionally with an explicit display width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearField {
    width: Option<u32>,
}

impl Default for YearField {
    fn default() -> Self {
        Self { width: Some(4) }
    }
}

impl YearField {
    pub const VARIANT: &'static str = "YearFieldDefinition";

    #[must_use]
    pub fn width(&self) -> Option<u32> {
        self.width
    }

    pub(super) fn set_width(&mut self, width: Option<u32>) -> Result<(), String> {
        match width {
            None | Some(2 | 4) => {
                self.width = width;
                Ok(())
            }
            Some(other) => Err(format!("year widths must be 2 or 4; given {other}")),
        }
    }
}

impl ColumnRules for YearField {
    fn type_sql(&self) -> String {
        match self.width {
            Some(width) => format!("year({width})"),
            None => "year".to_string(),
        }
    }

    fn field_type(&self) -> FieldType {
        FieldType::Year
    }

    fn is_valid(&self, value: &Value) -> bool {
        year_text(value).is_some_and(|text| YEAR_VALUE.is_match(&text))
    }

    fn repair(&self, value: &Value) -> Option<Value> {
        let text = year_text(value)?;
        let trimmed = text.trim();
        YEAR_VALUE
            .is_match(trimmed)
            .then(|| Value::String(trimmed.to_string()))
    }

    fn example_value(&self) -> Value {
        Value::from("2000")
    }
}
