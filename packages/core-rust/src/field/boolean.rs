use once_cell::sync::Lazy;
use regex::Regex;

use super::{ColumnRules, FieldKind, FieldType};
use crate::error::SchemaError;
use crate::sql::Cursor;
use crate::types::Value;

static SNIFF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^bool(?:ean)?\b").expect("valid boolean sniff regex"));

static KEYWORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:(?:tiny|small|medium|big)?int(?:eger)?|bool(?:ean)?)$")
        .expect("valid boolean keyword regex")
});

pub(super) fn sniff(details: &str) -> bool {
    SNIFF.is_match(details)
}

pub(super) fn parse_type(cursor: &mut Cursor<'_>) -> Result<FieldKind, SchemaError> {
    let start = cursor.rest();
    let keyword = cursor
        .eat_word()
        .filter(|word| KEYWORD.is_match(word))
        .ok_or_else(|| SchemaError::parse(start, "integer type keyword"))?;
    let width = match cursor.eat_type_args()? {
        Some((width, None)) => Some(width),
        Some((_, Some(_))) => {
            return Err(SchemaError::parse(start, "boolean width without decimal places"))
        }
        None => None,
    };
    if !cursor.eat_keyword("UNSIGNED") {
        return Err(SchemaError::parse(cursor.rest(), "UNSIGNED"));
    }
    Ok(FieldKind::Boolean(BooleanField {
        keyword: Some(keyword.to_string()),
        width,
    }))
}

/// Unsigned single-digit flag column storing `0` or `1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BooleanField {
    keyword: Option<String>,
    width: Option<u32>,
}

impl Default for BooleanField {
    fn default() -> Self {
        Self {
            keyword: None,
            width: Some(1),
        }
    }
}

impl BooleanField {
    pub const VARIANT: &'static str = "BooleanFieldDefinition";

    #[must_use]
    pub fn width(&self) -> Option<u32> {
        self.width
    }

    pub(super) fn set_width(&mut self, width: Option<u32>) -> Result<(), String> {
        match width {
            Some(1) | None => {
                self.width = width;
                Ok(())
            }
            Some(other) => Err(format!("boolean field widths must be exactly 1; given {other}")),
        }
    }
}

impl ColumnRules for BooleanField {
    fn type_sql(&self) -> String {
        let keyword = self.keyword.as_deref().unwrap_or("tinyint");
        match self.width {
            Some(width) => format!("{keyword}({width}) unsigned"),
            None => format!("{keyword} unsigned"),
        }
    }

    fn field_type(&self) -> FieldType {
        FieldType::Boolean
    }

    fn is_valid(&self, value: &Value) -> bool {
        match value {
            Value::Bool(_) => true,
            Value::Int(i) => *i == 0 || *i == 1,
            Value::String(s) => {
                matches!(s.as_str(), "0" | "1")
                    || s.eq_ignore_ascii_case("true")
                    || s.eq_ignore_ascii_case("false")
            }
            _ => false,
        }
    }

    fn repair(&self, value: &Value) -> Option<Value> {
        let truthy = match value {
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "y" | "on" => true,
                "0" | "false" | "no" | "n" | "off" | "" => false,
                other => other.parse::<f64>().ok()? != 0.0,
            },
            _ => return None,
        };
        Some(Value::Int(i64::from(truthy)))
    }

    fn example_value(&self) -> Value {
        Value::Int(1)
    }
}
