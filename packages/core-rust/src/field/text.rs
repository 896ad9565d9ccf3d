use once_cell::sync::Lazy;
use regex::Regex;

use super::{sample_text, ColumnRules, FieldKind, FieldType};
use crate::error::{Problems, SchemaError};
use crate::sql::Cursor;
use crate::types::Value;

/// Longest fixed-width text column.
pub const MAX_FIXED_LENGTH: u32 = 254;
/// Longest bounded text column; anything longer becomes unlimited.
pub const MAX_LENGTH: u32 = 32767;

static SNIFF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:(?:var)?char|(?:tiny|medium|long)?text)\b").expect("valid text sniff regex")
});

pub(super) fn sniff(details: &str) -> bool {
    SNIFF.is_match(details)
}

pub(super) fn parse_type(cursor: &mut Cursor<'_>) -> Result<FieldKind, SchemaError> {
    let start = cursor.rest();
    let keyword = cursor
        .eat_word()
        .filter(|word| sniff(word))
        .ok_or_else(|| SchemaError::parse(start, "text type keyword"))?;
    let lower = keyword.to_ascii_lowercase();

    let field = match lower.as_str() {
        "char" | "varchar" => {
            let length = match cursor.eat_type_args()? {
                Some((0, _)) => return Err(SchemaError::parse(start, "positive text length")),
                Some((length, None)) => length,
                Some((_, Some(_))) => {
                    return Err(SchemaError::parse(start, "text length without precision"))
                }
                None if lower == "char" => 1,
                None => return Err(SchemaError::parse(cursor.rest(), "varchar length")),
            };
            TextField {
                length: Some(length),
                fixed_width: lower == "char",
                keyword: None,
            }
        }
        _ => TextField {
            length: None,
            fixed_width: false,
            keyword: Some(keyword.to_string()),
        },
    };
    Ok(FieldKind::Text(field))
}

/// Character column: `char(n)`, `varchar(n)` or the unlimited `text` family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextField {
    length: Option<u32>,
    fixed_width: bool,
    keyword: Option<String>,
}

impl Default for TextField {
    fn default() -> Self {
        Self {
            length: Some(64),
            fixed_width: false,
            keyword: None,
        }
    }
}

impl TextField {
    pub const VARIANT: &'static str = "TextFieldDefinition";

    /// Maximum characters, `None` for unlimited.
    #[must_use]
    pub fn length(&self) -> Option<u32> {
        self.length
    }

    #[must_use]
    pub fn is_fixed_width(&self) -> bool {
        self.fixed_width
    }

    fn drop_fixed_width_if_too_long(&mut self, problems: &mut Problems) {
        if self.fixed_width && self.length.map_or(true, |l| l > MAX_FIXED_LENGTH) {
            self.fixed_width = false;
            problems.push(format!(
                "cannot set a text field to be both fixed width and over {MAX_FIXED_LENGTH} characters - field is now variable width"
            ));
        }
    }

    pub(super) fn set_length(
        &mut self,
        length: Option<u32>,
        problems: &mut Problems,
    ) -> Result<(), String> {
        match length {
            Some(0) => {
                return Err("text lengths must be positive, or unset for unlimited".to_string())
            }
            Some(l) if l > MAX_LENGTH => {
                self.length = None;
                problems.push(format!(
                    "cannot set length greater than {MAX_LENGTH} on a text field - field length is now unlimited"
                ));
            }
            _ => self.length = length,
        }
        self.keyword = None;
        self.drop_fixed_width_if_too_long(problems);
        Ok(())
    }

    pub(super) fn set_fixed_width(&mut self, fixed: bool, problems: &mut Problems) {
        self.fixed_width = fixed;
        self.keyword = None;
        self.drop_fixed_width_if_too_long(problems);
    }
}

impl ColumnRules for TextField {
    fn type_sql(&self) -> String {
        match (&self.keyword, self.length) {
            (Some(keyword), None) => keyword.clone(),
            (_, None) => "text".to_string(),
            (_, Some(length)) if self.fixed_width => format!("char({length})"),
            (_, Some(length)) => format!("varchar({length})"),
        }
    }

    fn field_type(&self) -> FieldType {
        if self.fixed_width {
            FieldType::FixedText
        } else {
            FieldType::VariableText
        }
    }

    fn is_valid(&self, value: &Value) -> bool {
        let Value::String(s) = value else {
            return false;
        };
        let Some(length) = self.length else {
            return true;
        };
        let count = s.chars().count();
        if self.fixed_width {
            count == length as usize
        } else {
            count <= length as usize
        }
    }

    fn default_ok(&self, value: &Value) -> bool {
        match (value, self.length) {
            (Value::String(_), None) => true,
            (Value::String(s), Some(length)) => s.chars().count() <= length as usize,
            _ => false,
        }
    }

    fn repair(&self, value: &Value) -> Option<Value> {
        let mut text = match value {
            Value::String(s) => s.clone(),
            Value::Bool(_) | Value::Int(_) | Value::Float(_) => value.to_string(),
            Value::Bytes(b) => String::from_utf8(b.clone()).ok()?,
            _ => return None,
        };
        if let Some(length) = self.length {
            let length = length as usize;
            if let Some((cut, _)) = text.char_indices().nth(length) {
                text.truncate(cut);
            }
            if self.fixed_width {
                let missing = length.saturating_sub(text.chars().count());
                text.extend(std::iter::repeat(' ').take(missing));
            }
        }
        Some(Value::String(text))
    }

    fn example_value(&self) -> Value {
        let len = match self.length {
            Some(length) if self.fixed_width => length.min(MAX_FIXED_LENGTH) as usize,
            Some(length) => (length as usize).min(12),
            None => 12,
        };
        Value::String(sample_text(len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldDefinition;

    #[test]
    fn type_forms() {
        let mut field = FieldDefinition::text("t");
        assert_eq!(field.type_sql(), "varchar(64)");
        field.set_fixed_width(true).unwrap();
        assert_eq!(field.type_sql(), "char(64)");
        field.set_length(None).unwrap_err();
        assert_eq!(field.type_sql(), "text");
    }

    #[test]
    fn fixed_width_over_limit_becomes_variable() {
        let mut field = FieldDefinition::text("t");
        field.set_fixed_width(true).unwrap();
        let err = field.set_length(Some(300)).unwrap_err();
        assert!(err.is_adjustment());
        let text = field.as_text().unwrap();
        assert!(!text.is_fixed_width());
        assert_eq!(text.length(), Some(300));
    }

    #[test]
    fn overlong_length_becomes_unlimited() {
        let mut field = FieldDefinition::text("t");
        assert!(field.set_length(Some(40_000)).unwrap_err().is_adjustment());
        assert_eq!(field.as_text().unwrap().length(), None);
        assert!(matches!(
            field.set_length(Some(0)),
            Err(SchemaError::Rejected { .. })
        ));
    }

    #[test]
    fn text_family_keyword_round_trips() {
        let line = "`Body` mediumtext NOT NULL COMMENT ''";
        let field = FieldDefinition::parse(line).unwrap();
        assert_eq!(field.as_text().unwrap().length(), None);
        assert_eq!(field.serialize(), "`Body` mediumtext NOT NULL COMMENT ''");
    }

    #[test]
    fn example_of_wide_char_column_is_bounded() {
        let field = FieldDefinition::parse("`C` char(4000000000) NULL COMMENT ''").unwrap();
        let Value::String(example) = field.example_value() else {
            panic!("text example should be a string");
        };
        assert_eq!(example.chars().count(), MAX_FIXED_LENGTH as usize);
    }

    #[test]
    fn varchar_requires_length() {
        assert!(FieldDefinition::parse("`A` varchar NOT NULL COMMENT ''").is_err());
    }

    #[test]
    fn fixed_width_values_must_be_exact() {
        let mut field = FieldDefinition::text("code");
        field.set_length(Some(3)).unwrap();
        field.set_fixed_width(true).unwrap();
        assert!(field.is_valid_value(&Value::from("abc")));
        assert!(!field.is_valid_value(&Value::from("ab")));
        assert_eq!(field.repair(&Value::from("ab")), Some(Value::from("ab ")));
        assert_eq!(field.repair(&Value::from("abcdef")), Some(Value::from("abc")));
        assert_eq!(field.repair(&Value::Int(7)), Some(Value::from("7  ")));
    }

    #[test]
    fn non_string_default_is_unset() {
        let mut field = FieldDefinition::text("t");
        assert!(field.set_default(Some(Value::Int(3))).unwrap_err().is_adjustment());
        assert_eq!(field.default_value(), None);
        field.set_default(Some(Value::from("x"))).unwrap();
    }
}
