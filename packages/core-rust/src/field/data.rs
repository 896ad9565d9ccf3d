use once_cell::sync::Lazy;
use regex::Regex;

use super::{sample_text, ColumnRules, FieldKind, FieldType};
use crate::error::{Problems, SchemaError};
use crate::sql::Cursor;
use crate::types::Value;

static SNIFF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:(?:tiny|medium|long)?blob|(?:var)?binary)\b").expect("valid data sniff regex")
});

/// Length given to a `varbinary` column converted from an unbounded one.
const DEFAULT_VARBINARY_LENGTH: u32 = 255;

pub(super) fn sniff(details: &str) -> bool {
    SNIFF.is_match(details)
}

pub(super) fn parse_type(cursor: &mut Cursor<'_>) -> Result<FieldKind, SchemaError> {
    let start = cursor.rest();
    let keyword = cursor
        .eat_word()
        .filter(|word| sniff(word))
        .ok_or_else(|| SchemaError::parse(start, "blob or binary type keyword"))?;
    let length = match cursor.eat_type_args()? {
        Some((0, _)) => return Err(SchemaError::parse(start, "positive data length")),
        Some((length, None)) => Some(length),
        Some((_, Some(_))) => return Err(SchemaError::parse(start, "data length without precision")),
        None => None,
    };
    if length.is_none() && keyword.eq_ignore_ascii_case("varbinary") {
        return Err(SchemaError::parse(cursor.rest(), "varbinary length"));
    }
    Ok(FieldKind::Data(DataField {
        keyword: keyword.to_string(),
        length,
    }))
}

/// Binary column: the `blob` family, `binary(n)` or `varbinary(n)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataField {
    keyword: String,
    length: Option<u32>,
}

impl Default for DataField {
    fn default() -> Self {
        Self {
            keyword: "blob".to_string(),
            length: None,
        }
    }
}

impl DataField {
    pub const VARIANT: &'static str = "DataFieldDefinition";

    /// Maximum bytes, `None` for the keyword's own limit.
    #[must_use]
    pub fn length(&self) -> Option<u32> {
        self.length
    }

    #[must_use]
    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    #[must_use]
    pub fn is_fixed_width(&self) -> bool {
        self.keyword.eq_ignore_ascii_case("binary")
    }

    pub(super) fn set_length(&mut self, length: Option<u32>) -> Result<(), String> {
        match length {
            Some(0) => Err("data lengths must be positive, or unset".to_string()),
            None if self.keyword.eq_ignore_ascii_case("varbinary") => {
                Err("varbinary fields need a length".to_string())
            }
            _ => {
                self.length = length;
                Ok(())
            }
        }
    }

    pub(super) fn set_fixed_width(&mut self, fixed: bool, problems: &mut Problems) {
        if fixed {
            self.keyword = "binary".to_string();
        } else if self.is_fixed_width() {
            self.keyword = "varbinary".to_string();
            if self.length.is_none() {
                self.length = Some(DEFAULT_VARBINARY_LENGTH);
                problems.push(format!(
                    "variable width binary fields need a length - length is now {DEFAULT_VARBINARY_LENGTH}"
                ));
            }
        }
    }

    fn fits(&self, bytes: usize) -> bool {
        self.length.map_or(true, |l| bytes <= l as usize)
    }
}

impl ColumnRules for DataField {
    fn type_sql(&self) -> String {
        match self.length {
            Some(length) => format!("{}({length})", self.keyword),
            None => self.keyword.clone(),
        }
    }

    fn field_type(&self) -> FieldType {
        if self.is_fixed_width() {
            FieldType::FixedBlob
        } else {
            FieldType::Blob
        }
    }

    fn is_valid(&self, value: &Value) -> bool {
        match value {
            Value::Bytes(b) => self.fits(b.len()),
            Value::String(s) => self.fits(s.len()),
            _ => false,
        }
    }

    fn default_ok(&self, value: &Value) -> bool {
        matches!(value, Value::String(s) if self.fits(s.len()))
    }

    fn repair(&self, value: &Value) -> Option<Value> {
        let mut bytes = match value {
            Value::Bytes(b) => b.clone(),
            Value::String(s) => s.clone().into_bytes(),
            Value::Bool(_) | Value::Int(_) | Value::Float(_) => value.to_string().into_bytes(),
            _ => return None,
        };
        if let Some(length) = self.length {
            bytes.truncate(length as usize);
        }
        Some(Value::Bytes(bytes))
    }

    fn example_value(&self) -> Value {
        let len = self.length.map_or(12, |l| (l as usize).min(12));
        Value::String(sample_text(len))
    }
}
