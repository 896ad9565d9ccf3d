use std::fmt::Write as _;

use once_cell::sync::Lazy;
use regex::Regex;

use super::{ColumnRules, FieldKind, FieldType};
use crate::error::{Problems, SchemaError};
use crate::sql::Cursor;
use crate::types::Value;

static SNIFF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:(?:tiny|small|medium|big)?int(?:eger)?|real|double|float|decimal|numeric)\b")
        .expect("valid number sniff regex")
});

static INTEGER_KEYWORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:tiny|small|medium|big)?int(?:eger)?$").expect("valid integer keyword regex")
});

static NUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?\d+(?:\.\d+)?$").expect("valid numeric regex"));

/// Widest integer display width.
pub const MAX_INTEGER_LENGTH: u32 = 255;
/// Most digits in a decimal column.
pub const MAX_DECIMAL_LENGTH: u32 = 65;

fn max_length(integer: bool) -> u32 {
    if integer {
        MAX_INTEGER_LENGTH
    } else {
        MAX_DECIMAL_LENGTH
    }
}

pub(super) fn sniff(details: &str) -> bool {
    SNIFF.is_match(details)
}

pub(super) fn parse_type(cursor: &mut Cursor<'_>) -> Result<FieldKind, SchemaError> {
    let start = cursor.rest();
    let keyword = cursor
        .eat_word()
        .filter(|word| sniff(word))
        .ok_or_else(|| SchemaError::parse(start, "numeric type keyword"))?;
    let integer = INTEGER_KEYWORD.is_match(keyword);

    let mut field = NumberField {
        length: None,
        integer,
        keyword: Some(keyword.to_string()),
        ..NumberField::default()
    };
    if let Some((length, precision)) = cursor.eat_type_args()? {
        if length > max_length(integer) {
            let expected = if integer {
                "length of at most 255"
            } else {
                "length of at most 65"
            };
            return Err(SchemaError::parse(start, expected));
        }
        field.length = Some(length);
        if let Some(decimals) = precision {
            if integer {
                return Err(SchemaError::parse(start, "integer type without decimal places"));
            }
            if decimals >= length {
                return Err(SchemaError::parse(start, "decimal places smaller than the length"));
            }
            field.decimals = Some(decimals);
        }
    }
    if cursor.eat_keyword("UNSIGNED") {
        field.signed = false;
    }
    if cursor.eat_keyword("ZEROFILL") {
        field.zerofill = true;
    }
    Ok(FieldKind::Number(field))
}

/// Textual form of a numeric value, or `None` if the value is not a number.
fn numeric_text(value: &Value) -> Option<String> {
    match value {
        Value::Int(i) => Some(i.to_string()),
        Value::Float(f) if f.is_finite() => Some(f.to_string()),
        Value::String(s) if NUMERIC.is_match(s) => Some(s.clone()),
        _ => None,
    }
}

fn is_negative(text: &str) -> bool {
    text.starts_with('-') && text.chars().any(|c| matches!(c, '1'..='9'))
}

/// Integer or decimal column.
///
/// `keyword` holds the type word read from DDL (`bigint`, `double`, ...) so
/// it serializes back unchanged; any width, decimal or integer-ness change
/// drops it in favour of the computed keyword.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberField {
    length: Option<u32>,
    decimals: Option<u32>,
    integer: bool,
    signed: bool,
    zerofill: bool,
    auto_increment: bool,
    keyword: Option<String>,
}

impl Default for NumberField {
    fn default() -> Self {
        Self {
            length: Some(10),
            decimals: None,
            integer: true,
            signed: true,
            zerofill: false,
            auto_increment: false,
            keyword: None,
        }
    }
}

impl NumberField {
    pub const VARIANT: &'static str = "NumberFieldDefinition";

    /// Maximum number of digits, `None` for unlimited.
    #[must_use]
    pub fn length(&self) -> Option<u32> {
        self.length
    }

    #[must_use]
    pub fn decimals(&self) -> Option<u32> {
        self.decimals
    }

    #[must_use]
    pub fn is_integer(&self) -> bool {
        self.integer
    }

    #[must_use]
    pub fn is_signed(&self) -> bool {
        self.signed
    }

    #[must_use]
    pub fn is_zerofill(&self) -> bool {
        self.zerofill
    }

    #[must_use]
    pub fn is_auto_increment(&self) -> bool {
        self.auto_increment
    }

    fn int_keyword(&self) -> &'static str {
        match self.length {
            Some(0..=2) => "tinyint",
            Some(3..=4) => "smallint",
            Some(5..=6) => "mediumint",
            Some(7..=9) => "int",
            _ => "bigint",
        }
    }

    fn keyword(&self) -> &str {
        match &self.keyword {
            Some(keyword) => keyword,
            None if self.integer => self.int_keyword(),
            None if self.decimals.is_none() => "float",
            None => "decimal",
        }
    }

    fn fits(&self, text: &str) -> bool {
        let digits = text.chars().filter(char::is_ascii_digit).count();
        let within = self
            .length
            .map_or(true, |length| digits <= length as usize);
        within && (self.signed || !is_negative(text))
    }

    pub(super) fn set_length(
        &mut self,
        length: Option<u32>,
        problems: &mut Problems,
    ) -> Result<(), String> {
        if length == Some(0) {
            return Err("number lengths must be positive, or unset for unlimited".to_string());
        }
        if let Some(length) = length.filter(|&l| l > max_length(self.integer)) {
            return Err(format!(
                "number lengths are at most {}; {length} given",
                max_length(self.integer)
            ));
        }
        if let (Some(length), Some(decimals)) = (length, self.decimals) {
            if decimals >= length {
                self.decimals = None;
                problems.push(format!(
                    "decimal places ({decimals}) must be smaller than the length ({length}); decimal places reset"
                ));
            }
        }
        self.length = length;
        self.keyword = None;
        Ok(())
    }

    pub(super) fn set_decimals(
        &mut self,
        decimals: Option<u32>,
        problems: &mut Problems,
    ) -> Result<(), String> {
        if let Some(places) = decimals {
            match self.length {
                None => return Err("decimal places need a fixed length".to_string()),
                Some(length) if places >= length => {
                    return Err(format!(
                        "decimal places must be smaller than the total length ({length}); {places} given"
                    ))
                }
                Some(_) => {}
            }
            if self.integer {
                self.integer = false;
                problems.push("integers cannot have decimal places - field is now decimal");
                if self.auto_increment {
                    self.auto_increment = false;
                    problems.push(
                        "auto increment fields must be integers; field is no longer auto incrementing",
                    );
                }
            }
        }
        self.decimals = decimals;
        self.keyword = None;
        Ok(())
    }

    pub(super) fn set_integer(&mut self, integer: bool, problems: &mut Problems) {
        if integer {
            if self.decimals.take().is_some() {
                self.keyword = None;
                problems.push("integers must not have any decimal places; decimal places reset");
            }
        } else if self.auto_increment {
            self.auto_increment = false;
            problems.push(
                "auto increment fields must be integers; field is no longer auto incrementing",
            );
        }
        if integer != self.integer {
            self.keyword = None;
        }
        self.integer = integer;
    }

    pub(super) fn set_signed(&mut self, signed: bool) {
        self.signed = signed;
    }

    pub(super) fn set_zerofill(&mut self, zerofill: bool) {
        self.zerofill = zerofill;
    }

    pub(super) fn set_auto_increment(&mut self, auto_increment: bool, problems: &mut Problems) {
        if auto_increment && !self.integer {
            self.integer = true;
            self.decimals = None;
            self.keyword = None;
            problems.push("auto increment number fields must be integers only - field is now an integer");
        }
        self.auto_increment = auto_increment;
    }

    /// Turns an integer field into a float/decimal one when the proposed
    /// default is an otherwise acceptable fractional number.
    pub(super) fn promote_for_default(&mut self, value: &Value, problems: &mut Problems) {
        if !self.integer {
            return;
        }
        let Some(text) = numeric_text(value) else {
            return;
        };
        if !text.contains('.') || !self.fits(&text) {
            return;
        }
        self.integer = false;
        self.keyword = None;
        if self.auto_increment {
            self.auto_increment = false;
            problems.push(
                "auto increment fields must be integers; field is no longer auto incrementing",
            );
        }
        let now = if self.decimals.is_some() { "decimal" } else { "float" };
        problems.push(format!(
            "default value '{text}' is not an integer - number field is now {now}"
        ));
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    fn round(&self, value: f64) -> Value {
        if self.integer {
            return Value::Int(value.round() as i64);
        }
        match self.decimals {
            Some(places) => {
                let scale = 10f64.powi(places as i32);
                Value::Float((value * scale).round() / scale)
            }
            None => Value::Float(value),
        }
    }
}

impl ColumnRules for NumberField {
    fn type_sql(&self) -> String {
        let mut sql = self.keyword().to_string();
        if let Some(length) = self.length {
            let _ = write!(sql, "({length}");
            if let Some(decimals) = self.decimals {
                let _ = write!(sql, ",{decimals}");
            }
            sql.push(')');
        }
        if !self.signed {
            sql.push_str(" unsigned");
        }
        if self.zerofill {
            sql.push_str(" zerofill");
        }
        sql
    }

    fn field_type(&self) -> FieldType {
        match (self.integer, self.decimals) {
            (true, _) => FieldType::Integer,
            (false, None) => FieldType::Float,
            (false, Some(_)) => FieldType::Decimal,
        }
    }

    fn is_valid(&self, value: &Value) -> bool {
        let Some(text) = numeric_text(value) else {
            return false;
        };
        if !self.fits(&text) {
            return false;
        }
        match text.split_once('.') {
            None => true,
            Some((_, fraction)) => {
                !self.integer
                    && self
                        .decimals
                        .map_or(true, |places| fraction.len() <= places as usize)
            }
        }
    }

    fn repair(&self, value: &Value) -> Option<Value> {
        let candidate = match value {
            Value::Bool(b) => Value::Int(i64::from(*b)),
            Value::Int(_) => value.clone(),
            Value::Float(f) if f.is_finite() => self.round(*f),
            Value::String(s) => {
                let trimmed = s.trim();
                if !NUMERIC.is_match(trimmed) {
                    return None;
                }
                match trimmed.parse::<i64>() {
                    Ok(i) => Value::Int(i),
                    Err(_) => self.round(trimmed.parse::<f64>().ok()?),
                }
            }
            _ => return None,
        };
        Some(candidate).filter(|v| self.is_valid(v))
    }

    fn example_value(&self) -> Value {
        let length = self.length.unwrap_or(3).min(MAX_INTEGER_LENGTH) as usize;
        let places = self.decimals.unwrap_or(0) as usize;
        let mut sample = String::new();
        if self.signed {
            sample.push('-');
        }
        for i in 0..length {
            if places > 0 && i == length - places {
                sample.push('.');
            }
            sample.push(char::from(b'0' + ((i + 1) % 10) as u8));
        }
        Value::String(sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldDefinition;

    fn number(length: u32) -> FieldDefinition {
        let mut field = FieldDefinition::number("n");
        field.set_length(Some(length)).unwrap();
        field
    }

    #[test]
    fn keyword_follows_width() {
        let cases = [(1, "tinyint"), (2, "tinyint"), (4, "smallint"), (6, "mediumint"), (9, "int"), (18, "bigint"), (30, "bigint")];
        for (length, keyword) in cases {
            assert_eq!(number(length).type_sql(), format!("{keyword}({length})"));
        }
    }

    #[test]
    fn parsed_keyword_survives_until_width_changes() {
        let mut field = FieldDefinition::parse("`n` int(11) unsigned NOT NULL COMMENT ''").unwrap();
        assert_eq!(field.type_sql(), "int(11) unsigned");
        field.set_signed(true).unwrap();
        assert_eq!(field.type_sql(), "int(11)");
        field.set_length(Some(4)).unwrap();
        assert_eq!(field.type_sql(), "smallint(4)");
    }

    #[test]
    fn decimal_types_parse() {
        let field = FieldDefinition::parse("`p` decimal(10,2) unsigned zerofill NOT NULL DEFAULT '1.50' COMMENT ''").unwrap();
        let number = field.as_number().unwrap();
        assert!(!number.is_integer());
        assert_eq!(number.decimals(), Some(2));
        assert!(number.is_zerofill());
        assert_eq!(field.field_type(), FieldType::Decimal);
        assert_eq!(field.type_sql(), "decimal(10,2) unsigned zerofill");
    }

    #[test]
    fn integer_with_precision_fails_to_parse() {
        assert!(FieldDefinition::parse("`n` int(10,2) NULL COMMENT ''").is_err());
    }

    #[test]
    fn validation_rules() {
        let mut field = number(4);
        assert!(field.is_valid_value(&Value::Int(1234)));
        assert!(!field.is_valid_value(&Value::Int(12345)));
        assert!(field.is_valid_value(&Value::Int(-12)));
        assert!(!field.is_valid_value(&Value::from("1.5")));
        assert!(!field.is_valid_value(&Value::from("abc")));
        field.set_signed(false).unwrap();
        assert!(!field.is_valid_value(&Value::Int(-12)));
        assert!(field.is_valid_value(&Value::from("-0")));
    }

    #[test]
    fn decimals_limit_fraction_digits() {
        let mut field = number(6);
        let err = field.set_decimals(Some(2)).unwrap_err();
        assert!(err.is_adjustment());
        assert!(field.is_valid_value(&Value::Float(12.25)));
        assert!(!field.is_valid_value(&Value::Float(12.125)));
        assert_eq!(field.repair(&Value::Float(12.125)), Some(Value::Float(12.13)));
    }

    #[test]
    fn decimals_must_be_smaller_than_length() {
        let mut field = number(4);
        let err = field.set_decimals(Some(4)).unwrap_err();
        assert!(matches!(err, SchemaError::Rejected { setting: "decimals", .. }));
        assert!(field.as_number().unwrap().is_integer());
    }

    #[test]
    fn auto_increment_forces_integer() {
        let mut field = number(8);
        let _ = field.set_decimals(Some(2));
        let err = field.set_auto_increment(true).unwrap_err();
        assert!(err.is_adjustment());
        let n = field.as_number().unwrap();
        assert!(n.is_integer());
        assert_eq!(n.decimals(), None);
        assert_eq!(field.extra(), Some("auto_increment"));
    }

    #[test]
    fn leaving_integer_drops_auto_increment() {
        let mut field = number(8);
        field.set_auto_increment(true).unwrap();
        let err = field.set_integer(false).unwrap_err();
        assert!(err.is_adjustment());
        assert_eq!(field.extra(), None);
        assert_eq!(field.type_sql(), "float(8)");
    }

    #[test]
    fn negative_default_on_unsigned_is_unset() {
        let mut field = number(5);
        field.set_signed(false).unwrap();
        assert!(field.set_default(Some(Value::Int(-3))).unwrap_err().is_adjustment());
        assert_eq!(field.default_value(), None);
    }

    #[test]
    fn repair_coerces() {
        let field = number(5);
        assert_eq!(field.repair(&Value::Bool(true)), Some(Value::Int(1)));
        assert_eq!(field.repair(&Value::from(" 42 ")), Some(Value::Int(42)));
        assert_eq!(field.repair(&Value::Float(2.6)), Some(Value::Int(3)));
        assert_eq!(field.repair(&Value::from("nope")), None);
        assert_eq!(field.repair(&Value::Int(123_456)), None);
    }

    #[test]
    fn oversized_widths_are_rejected() {
        let err = FieldDefinition::parse("`n` int(4000000000) NULL COMMENT ''").unwrap_err();
        assert!(err.to_string().contains("at most 255"));
        assert!(FieldDefinition::parse("`n` int(255) NULL COMMENT ''").is_ok());
        assert!(FieldDefinition::parse("`p` decimal(66,2) NULL COMMENT ''").is_err());

        let mut field = number(10);
        let err = field.set_length(Some(4_000_000_000)).unwrap_err();
        assert!(matches!(err, SchemaError::Rejected { setting: "length", .. }));
        assert_eq!(field.as_number().unwrap().length(), Some(10));
    }

    #[test]
    fn example_value_places_decimal_point() {
        let mut field = number(6);
        let _ = field.set_decimals(Some(2));
        assert_eq!(field.example_value(), Value::from("-1234.56"));
    }
}
