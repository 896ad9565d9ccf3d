//! Column definitions.
//!
//! A [`FieldDefinition`] is one column of a table: its name, nullability,
//! default, comment, and a [`FieldKind`] carrying the type-specific rules.
//! Raw DDL fragments are routed to a kind through [`FIELD_VARIANTS`], an
//! ordered registry: a variant whose own `~~VariantName~~` tag appears in the
//! fragment claims it first, otherwise the first syntactic match wins.

mod boolean;
mod data;
mod date;
mod number;
mod text;
mod year;

pub use boolean::BooleanField;
pub use data::DataField;
pub use date::DateField;
pub use number::NumberField;
pub use text::TextField;
pub use year::YearField;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Problems, SchemaError};
use crate::sql::{quote_identifier, quote_literal, Cursor};
use crate::types::Value;

/// Root of every variant's lineage. A tag naming it is treated as the
/// field's own tag.
const LINEAGE_ROOT: &str = "FieldDefinition";

static VARIANT_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"~~([A-Za-z0-9_]*FieldDefinition)~~").expect("valid tag regex")
});

/// Semantic column type, independent of the exact SQL keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Boolean,
    Integer,
    Float,
    Decimal,
    FixedText,
    VariableText,
    Blob,
    FixedBlob,
    Date,
    Year,
}

/// Type-specific rules shared by every variant.
trait ColumnRules {
    fn type_sql(&self) -> String;
    fn field_type(&self) -> FieldType;
    /// Checks a non-null value.
    fn is_valid(&self, value: &Value) -> bool;
    /// Best-effort coercion of a non-null value that failed `is_valid`.
    fn repair(&self, value: &Value) -> Option<Value>;
    fn example_value(&self) -> Value;
    fn default_ok(&self, value: &Value) -> bool {
        self.is_valid(value)
    }
}

/// The variant of a field and its type-specific settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Number(NumberField),
    Boolean(BooleanField),
    Text(TextField),
    Data(DataField),
    Date(DateField),
    Year(YearField),
}

impl FieldKind {
    /// Registry name of the variant, as used in comment tags.
    #[must_use]
    pub fn variant_name(&self) -> &'static str {
        match self {
            FieldKind::Number(_) => NumberField::VARIANT,
            FieldKind::Boolean(_) => BooleanField::VARIANT,
            FieldKind::Text(_) => TextField::VARIANT,
            FieldKind::Data(_) => DataField::VARIANT,
            FieldKind::Date(_) => DateField::VARIANT,
            FieldKind::Year(_) => YearField::VARIANT,
        }
    }

    fn rules(&self) -> &dyn ColumnRules {
        match self {
            FieldKind::Number(f) => f,
            FieldKind::Boolean(f) => f,
            FieldKind::Text(f) => f,
            FieldKind::Data(f) => f,
            FieldKind::Date(f) => f,
            FieldKind::Year(f) => f,
        }
    }

    /// Boolean renders as an integer column, so without its tag it would
    /// be read back as a Number.
    fn always_tagged(&self) -> bool {
        matches!(self, FieldKind::Boolean(_))
    }
}

/// Free-text comment plus the remembered position of the variant tag.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldComment {
    text: String,
    tag_at: Option<usize>,
}

impl FieldComment {
    fn tagged() -> Self {
        Self {
            text: String::new(),
            tag_at: Some(0),
        }
    }

    /// Comment text without the field's own tag.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Byte offset in [`text`](Self::text) where the tag is re-embedded.
    #[must_use]
    pub fn tag_at(&self) -> Option<usize> {
        self.tag_at
    }

    fn assign(&mut self, raw: &str, variant: &str, always_tagged: bool) {
        let mut own = None;
        let mut foreign = false;
        for caps in VARIANT_TAG.captures_iter(raw) {
            let class = &caps[1];
            if class == variant || class == LINEAGE_ROOT {
                own = caps.get(0);
                break;
            }
            foreign = true;
        }

        let was_tagged = self.tag_at.is_some();
        match own {
            Some(m) => {
                self.text = format!("{}{}", &raw[..m.start()], &raw[m.end()..]);
                self.tag_at = Some(m.start());
            }
            None => {
                self.text = raw.to_string();
                self.tag_at = if always_tagged || (was_tagged && !foreign) {
                    Some(raw.len())
                } else {
                    None
                };
            }
        }
    }

    fn render(&self, variant: &str) -> String {
        match self.tag_at {
            Some(at) => {
                let at = at.min(self.text.len());
                format!("{}~~{variant}~~{}", &self.text[..at], &self.text[at..])
            }
            None => self.text.clone(),
        }
    }
}

/// One column of a table definition.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDefinition {
    name: String,
    nullable: bool,
    default: Option<Value>,
    comment: FieldComment,
    kind: FieldKind,
}

impl FieldDefinition {
    fn with_kind(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            nullable: true,
            default: None,
            comment: FieldComment::tagged(),
            kind,
        }
    }

    /// Field as produced by DDL parsing: tagged only if the DDL says so.
    fn untagged(name: &str, kind: FieldKind) -> Self {
        let mut field = Self::with_kind(name, kind);
        if !field.kind.always_tagged() {
            field.comment.tag_at = None;
        }
        field
    }

    /// Signed `int(10)`-style integer column.
    #[must_use]
    pub fn number(name: impl Into<String>) -> Self {
        Self::with_kind(name, FieldKind::Number(NumberField::default()))
    }

    /// `tinyint(1) unsigned` flag column defaulting to `0`.
    #[must_use]
    pub fn boolean(name: impl Into<String>) -> Self {
        let mut field = Self::with_kind(name, FieldKind::Boolean(BooleanField::default()));
        field.default = Some(Value::Int(0));
        field
    }

    /// `varchar(64)` column.
    #[must_use]
    pub fn text(name: impl Into<String>) -> Self {
        Self::with_kind(name, FieldKind::Text(TextField::default()))
    }

    /// `blob` column.
    #[must_use]
    pub fn data(name: impl Into<String>) -> Self {
        Self::with_kind(name, FieldKind::Data(DataField::default()))
    }

    #[must_use]
    pub fn date(name: impl Into<String>) -> Self {
        Self::with_kind(name, FieldKind::Date(DateField))
    }

    #[must_use]
    pub fn year(name: impl Into<String>) -> Self {
        Self::with_kind(name, FieldKind::Year(YearField::default()))
    }

    /// Parses one field line of a `CREATE TABLE` statement, for example
    /// `` `ID` int(10) unsigned NOT NULL AUTO_INCREMENT COMMENT '' ``.
    ///
    /// # Errors
    ///
    /// Fails when the name is not backtick-quoted, no variant claims the
    /// line, a clause is malformed, or text remains after the comment.
    pub fn parse(line: &str) -> Result<Self, SchemaError> {
        let mut cursor = Cursor::new(line);
        let name = cursor.expect_identifier("backtick-quoted field name")?;
        let details = cursor.rest();
        let variant =
            FieldVariant::claim(details).ok_or_else(|| SchemaError::UnknownFieldType {
                type_token: details
                    .split_whitespace()
                    .next()
                    .unwrap_or_default()
                    .to_string(),
                line: line.to_string(),
            })?;
        let (field, rest) = variant.parse(&name, details)?;
        if !rest.trim().is_empty() {
            return Err(SchemaError::parse(rest, "end of field definition"));
        }
        tracing::trace!(field = %field.name, variant = variant.name, "parsed field definition");
        Ok(field)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    #[must_use]
    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    #[must_use]
    pub fn variant_name(&self) -> &'static str {
        self.kind.variant_name()
    }

    #[must_use]
    pub fn field_type(&self) -> FieldType {
        self.kind.rules().field_type()
    }

    /// SQL type clause, e.g. `int(10) unsigned`.
    #[must_use]
    pub fn type_sql(&self) -> String {
        self.kind.rules().type_sql()
    }

    #[must_use]
    pub fn as_number(&self) -> Option<&NumberField> {
        match &self.kind {
            FieldKind::Number(n) => Some(n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&TextField> {
        match &self.kind {
            FieldKind::Text(t) => Some(t),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn set_nullable(&mut self, nullable: bool) {
        self.nullable = nullable;
    }

    #[must_use]
    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Extra column attributes, `"auto_increment"` when set.
    #[must_use]
    pub fn extra(&self) -> Option<&'static str> {
        match &self.kind {
            FieldKind::Number(n) if n.is_auto_increment() => Some("auto_increment"),
            _ => None,
        }
    }

    #[must_use]
    pub fn comment(&self) -> &FieldComment {
        &self.comment
    }

    /// Comment exactly as it is written to DDL, tag included.
    #[must_use]
    pub fn rendered_comment(&self) -> String {
        self.comment.render(self.kind.variant_name())
    }

    /// Replaces the comment. A tag naming this field's variant (or the
    /// `FieldDefinition` root) is lifted out and its position remembered; a
    /// tag naming another variant stays in the text.
    pub fn set_comment(&mut self, comment: &str) {
        let variant = self.kind.variant_name();
        let always = self.kind.always_tagged();
        self.comment.assign(comment, variant, always);
    }

    /// Sets or clears the default.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Adjusted`] when the value forced a change: an
    /// unacceptable value leaves the default unset, and a fractional value on
    /// an integer column turns the column into a float/decimal column.
    pub fn set_default(&mut self, value: Option<Value>) -> Result<(), SchemaError> {
        let mut problems = Problems::default();
        self.default = match value {
            None | Some(Value::Null) => None,
            Some(value) => {
                if let FieldKind::Number(number) = &mut self.kind {
                    number.promote_for_default(&value, &mut problems);
                }
                if self.kind.rules().default_ok(&value) {
                    Some(value)
                } else {
                    problems.push(format!(
                        "'{value}' is not a valid default for a {} - default is now unset",
                        self.kind.variant_name()
                    ));
                    None
                }
            }
        };
        problems.finish(&self.name, "default")
    }

    /// Sets the display width or character/byte length.
    ///
    /// # Errors
    ///
    /// [`SchemaError::Rejected`] when the variant has no such setting or the
    /// value is out of range; [`SchemaError::Adjusted`] when related settings
    /// had to change.
    pub fn set_length(&mut self, length: Option<u32>) -> Result<(), SchemaError> {
        self.mutate("length", |kind, problems| match kind {
            FieldKind::Number(n) => n.set_length(length, problems),
            FieldKind::Boolean(b) => b.set_width(length),
            FieldKind::Text(t) => t.set_length(length, problems),
            FieldKind::Data(d) => d.set_length(length),
            FieldKind::Year(y) => y.set_width(length),
            FieldKind::Date(_) => Err("date fields have no length".to_string()),
        })
    }

    /// Sets the number of decimal places on a Number field.
    ///
    /// # Errors
    ///
    /// Rejected unless the field is a Number with a length greater than
    /// `decimals`; adjusted when an integer field becomes decimal.
    pub fn set_decimals(&mut self, decimals: Option<u32>) -> Result<(), SchemaError> {
        self.mutate("decimals", |kind, problems| match kind {
            FieldKind::Number(n) => n.set_decimals(decimals, problems),
            _ => Err("only number fields have decimal places".to_string()),
        })
    }

    /// # Errors
    ///
    /// Rejected on non-Number fields; adjusted when auto-increment or
    /// decimal places had to be dropped.
    pub fn set_integer(&mut self, integer: bool) -> Result<(), SchemaError> {
        self.mutate("integer", |kind, problems| match kind {
            FieldKind::Number(n) => {
                n.set_integer(integer, problems);
                Ok(())
            }
            _ => Err("only number fields can switch between integer and decimal".to_string()),
        })
    }

    /// # Errors
    ///
    /// Rejected on non-numeric fields and for `true` on Boolean fields.
    pub fn set_signed(&mut self, signed: bool) -> Result<(), SchemaError> {
        self.mutate("signed", |kind, _| match kind {
            FieldKind::Number(n) => {
                n.set_signed(signed);
                Ok(())
            }
            FieldKind::Boolean(_) if !signed => Ok(()),
            FieldKind::Boolean(_) => Err("boolean fields must be unsigned".to_string()),
            _ => Err("only number fields can be signed".to_string()),
        })
    }

    /// # Errors
    ///
    /// Rejected on non-Number fields.
    pub fn set_zerofill(&mut self, zerofill: bool) -> Result<(), SchemaError> {
        self.mutate("zerofill", |kind, _| match kind {
            FieldKind::Number(n) => {
                n.set_zerofill(zerofill);
                Ok(())
            }
            _ => Err("only number fields can be zero-filled".to_string()),
        })
    }

    /// # Errors
    ///
    /// Rejected when enabling on a non-Number field; adjusted when a
    /// float/decimal field had to become an integer.
    pub fn set_auto_increment(&mut self, auto_increment: bool) -> Result<(), SchemaError> {
        self.mutate("auto_increment", |kind, problems| match kind {
            FieldKind::Number(n) => {
                n.set_auto_increment(auto_increment, problems);
                Ok(())
            }
            _ if !auto_increment => Ok(()),
            _ => Err("only number fields can auto increment".to_string()),
        })
    }

    /// # Errors
    ///
    /// Rejected on fields other than Text and Data; adjusted when the
    /// length rules out fixed width.
    pub fn set_fixed_width(&mut self, fixed: bool) -> Result<(), SchemaError> {
        self.mutate("fixed_width", |kind, problems| match kind {
            FieldKind::Text(t) => {
                t.set_fixed_width(fixed, problems);
                Ok(())
            }
            FieldKind::Data(d) => {
                d.set_fixed_width(fixed, problems);
                Ok(())
            }
            _ => Err("only text and data fields have a fixed width setting".to_string()),
        })
    }

    fn mutate<F>(&mut self, setting: &'static str, apply: F) -> Result<(), SchemaError>
    where
        F: FnOnce(&mut FieldKind, &mut Problems) -> Result<(), String>,
    {
        let mut problems = Problems::default();
        apply(&mut self.kind, &mut problems)
            .map_err(|reason| SchemaError::rejected(&self.name, setting, reason))?;
        if let Some(default) = &self.default {
            if !self.kind.rules().default_ok(default) {
                problems.push(format!(
                    "default '{default}' no longer fits the field - default is now unset"
                ));
                self.default = None;
            }
        }
        problems.finish(&self.name, setting)
    }

    /// Returns `true` if `value` may be stored in this column.
    #[must_use]
    pub fn is_valid_value(&self, value: &Value) -> bool {
        match value {
            Value::Null => self.nullable,
            other => self.kind.rules().is_valid(other),
        }
    }

    /// Attempts to coerce `value` into something this column accepts.
    /// Returns `None` if the value cannot be repaired.
    #[must_use]
    pub fn repair(&self, value: &Value) -> Option<Value> {
        if self.is_valid_value(value) {
            return Some(value.clone());
        }
        let repaired = match value {
            Value::Null => self.default.clone(),
            other => self.kind.rules().repair(other),
        };
        repaired.filter(|v| self.is_valid_value(v))
    }

    /// A legal sample value, used in validation messages.
    #[must_use]
    pub fn example_value(&self) -> Value {
        self.kind.rules().example_value()
    }

    /// Renders the field as one line of a `CREATE TABLE` body.
    #[must_use]
    pub fn serialize(&self) -> String {
        let mut sql = format!(
            "{} {} {}NULL",
            quote_identifier(&self.name),
            self.type_sql(),
            if self.nullable { "" } else { "NOT " }
        );
        if let Some(literal) = self.default.as_ref().and_then(Value::to_sql_literal) {
            sql.push_str(" DEFAULT ");
            sql.push_str(&quote_literal(&literal));
        }
        if self.extra() == Some("auto_increment") {
            sql.push_str(" AUTO_INCREMENT");
        }
        sql.push_str(" COMMENT ");
        sql.push_str(&quote_literal(&self.rendered_comment()));
        sql
    }
}

/// Registry entry for one field variant.
pub struct FieldVariant {
    /// Variant name used in `~~Name~~` comment tags.
    pub name: &'static str,
    sniff: fn(&str) -> bool,
    parse_type: fn(&mut Cursor<'_>) -> Result<FieldKind, SchemaError>,
}

impl std::fmt::Debug for FieldVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldVariant").field("name", &self.name).finish()
    }
}

/// Field variants in priority order.
pub static FIELD_VARIANTS: [FieldVariant; 6] = [
    FieldVariant {
        name: NumberField::VARIANT,
        sniff: number::sniff,
        parse_type: number::parse_type,
    },
    FieldVariant {
        name: BooleanField::VARIANT,
        sniff: boolean::sniff,
        parse_type: boolean::parse_type,
    },
    FieldVariant {
        name: TextField::VARIANT,
        sniff: text::sniff,
        parse_type: text::parse_type,
    },
    FieldVariant {
        name: DataField::VARIANT,
        sniff: data::sniff,
        parse_type: data::parse_type,
    },
    FieldVariant {
        name: DateField::VARIANT,
        sniff: date::sniff,
        parse_type: date::parse_type,
    },
    FieldVariant {
        name: YearField::VARIANT,
        sniff: year::sniff,
        parse_type: year::parse_type,
    },
];

impl FieldVariant {
    fn carries_tag(&self, fragment: &str) -> bool {
        fragment.contains(&format!("~~{}~~", self.name))
    }

    /// Returns `true` if this variant recognises the fragment (everything
    /// after the field name), either by tag or by its type keyword.
    #[must_use]
    pub fn matches(&self, fragment: &str) -> bool {
        self.carries_tag(fragment) || (self.sniff)(fragment.trim_start())
    }

    /// Picks the variant that owns `fragment`.
    #[must_use]
    pub fn claim(fragment: &str) -> Option<&'static FieldVariant> {
        FIELD_VARIANTS
            .iter()
            .find(|v| v.carries_tag(fragment))
            .or_else(|| {
                let trimmed = fragment.trim_start();
                FIELD_VARIANTS.iter().find(|v| (v.sniff)(trimmed))
            })
    }

    /// Parses the fragment after the field name and returns the field plus
    /// any unconsumed input.
    ///
    /// # Errors
    ///
    /// Fails when a required token is missing or a setting is refused.
    pub fn parse<'a>(
        &self,
        name: &str,
        fragment: &'a str,
    ) -> Result<(FieldDefinition, &'a str), SchemaError> {
        let mut cursor = Cursor::new(fragment);
        let kind = (self.parse_type)(&mut cursor)?;
        let mut field = FieldDefinition::untagged(name, kind);

        if cursor.eat_keywords(&["NOT", "NULL"]) {
            field.nullable = false;
        } else if cursor.eat_keyword("NULL") {
            field.nullable = true;
        }
        if cursor.eat_keyword("DEFAULT") && !cursor.eat_keyword("NULL") {
            let text = cursor.expect_literal("quoted default value")?;
            field.set_default(Some(Value::String(text)))?;
        }
        if cursor.eat_keyword("AUTO_INCREMENT") {
            field.set_auto_increment(true)?;
        }
        if cursor.eat_keyword("COMMENT") {
            let text = cursor.expect_literal("quoted comment")?;
            field.set_comment(&text);
        }
        Ok((field, cursor.rest()))
    }
}

/// Shared `a1#a1#...` sample used by the text-like variants.
fn sample_text(len: usize) -> String {
    "a1#".chars().cycle().take(len).collect()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn user_id_line_round_trips() {
        let line = "`UserID` bigint(10) NOT NULL AUTO_INCREMENT COMMENT 'Custom Comment ~~NumberFieldDefinition~~'";
        let field = FieldDefinition::parse(line).unwrap();
        assert_eq!(field.name(), "UserID");
        assert_eq!(field.comment().text(), "Custom Comment ");
        assert_eq!(field.extra(), Some("auto_increment"));
        assert!(!field.is_nullable());
        assert_eq!(field.serialize(), line);
    }

    #[test]
    fn programmatic_number_renders_tag_only_comment() {
        let field = FieldDefinition::number("Count");
        assert_eq!(
            field.serialize(),
            "`Count` bigint(10) NULL COMMENT '~~NumberFieldDefinition~~'"
        );
    }

    #[test]
    fn fractional_default_promotes_integer_field() {
        let mut field = FieldDefinition::number("Price");
        let err = field.set_default(Some(Value::Float(3.5))).unwrap_err();
        assert!(err.is_adjustment());
        let number = field.as_number().unwrap();
        assert!(!number.is_integer());
        assert_eq!(field.field_type(), FieldType::Float);
        assert_eq!(field.default_value(), Some(&Value::Float(3.5)));
        assert!(err.to_string().contains("float"));
    }

    #[test]
    fn non_numeric_default_is_unset() {
        let mut field = FieldDefinition::number("Count");
        let err = field.set_default(Some(Value::from("abc"))).unwrap_err();
        assert!(err.is_adjustment());
        assert_eq!(field.default_value(), None);
    }

    #[test]
    fn tag_claims_before_sniffing() {
        let fragment = "tinyint(1) unsigned NOT NULL DEFAULT '0' COMMENT '~~BooleanFieldDefinition~~'";
        assert_eq!(FieldVariant::claim(fragment).unwrap().name, BooleanField::VARIANT);
        let plain = "tinyint(1) unsigned NOT NULL DEFAULT '0' COMMENT ''";
        assert_eq!(FieldVariant::claim(plain).unwrap().name, NumberField::VARIANT);
    }

    #[test]
    fn foreign_tag_stays_in_comment() {
        let line = "`Email` varchar(120) NOT NULL COMMENT 'contact ~~EmailFieldDefinition~~'";
        let field = FieldDefinition::parse(line).unwrap();
        assert_eq!(field.variant_name(), TextField::VARIANT);
        assert_eq!(field.comment().tag_at(), None);
        assert_eq!(field.comment().text(), "contact ~~EmailFieldDefinition~~");
        assert_eq!(field.serialize(), line);
    }

    #[test]
    fn lineage_tag_is_replaced_by_own_tag() {
        let mut field = FieldDefinition::text("Name");
        field.set_comment("note ~~FieldDefinition~~");
        assert_eq!(field.rendered_comment(), "note ~~TextFieldDefinition~~");
    }

    #[test]
    fn untagged_comment_moves_tag_to_end_on_programmatic_fields() {
        let mut field = FieldDefinition::date("Born");
        field.set_comment("birthday");
        assert_eq!(field.rendered_comment(), "birthday~~DateFieldDefinition~~");
    }

    #[test]
    fn unknown_type_fails() {
        let err = FieldDefinition::parse("`Where` geometry NOT NULL COMMENT ''").unwrap_err();
        assert!(matches!(err, SchemaError::UnknownFieldType { ref type_token, .. } if type_token == "geometry"));
    }

    #[test]
    fn trailing_garbage_fails() {
        let err = FieldDefinition::parse("`A` int(10) NULL COMMENT '' CHARACTER SET utf8").unwrap_err();
        assert!(matches!(err, SchemaError::Parse { .. }));
    }

    #[test]
    fn auto_increment_on_text_is_rejected() {
        let err = FieldDefinition::parse("`A` varchar(10) NOT NULL AUTO_INCREMENT COMMENT ''")
            .unwrap_err();
        assert!(matches!(err, SchemaError::Rejected { setting: "auto_increment", .. }));
    }

    #[test]
    fn null_is_valid_only_for_nullable_fields() {
        let mut field = FieldDefinition::text("Name");
        assert!(field.is_valid_value(&Value::Null));
        field.set_nullable(false);
        assert!(!field.is_valid_value(&Value::Null));
        assert_eq!(field.repair(&Value::Null), None);
        field.set_default(Some(Value::from("anon"))).unwrap();
        assert_eq!(field.repair(&Value::Null), Some(Value::from("anon")));
    }

    #[test]
    fn shrinking_text_length_drops_oversized_default() {
        let mut field = FieldDefinition::text("Code");
        field.set_default(Some(Value::from("ABCDEFGH"))).unwrap();
        let err = field.set_length(Some(4)).unwrap_err();
        assert!(err.is_adjustment());
        assert_eq!(field.default_value(), None);
    }

    #[test]
    fn every_example_value_is_valid() {
        let fields = [
            FieldDefinition::number("n"),
            FieldDefinition::boolean("b"),
            FieldDefinition::text("t"),
            FieldDefinition::data("d"),
            FieldDefinition::date("dt"),
            FieldDefinition::year("y"),
        ];
        for field in &fields {
            assert!(
                field.is_valid_value(&field.example_value()),
                "{} rejects its own example",
                field.variant_name()
            );
        }
    }

    fn arb_value() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(Value::Int),
            (-1.0e6f64..1.0e6).prop_map(Value::Float),
            "[ -~]{0,80}".prop_map(Value::String),
            "-?[0-9]{1,12}(\\.[0-9]{1,4})?".prop_map(Value::String),
            proptest::collection::vec(any::<u8>(), 0..40).prop_map(Value::Bytes),
        ]
    }

    fn arb_field() -> impl Strategy<Value = FieldDefinition> {
        (0usize..6, 1u32..300, any::<bool>(), any::<bool>()).prop_map(|(pick, len, flag, nullable)| {
            let mut field = match pick {
                0 => FieldDefinition::number("f"),
                1 => FieldDefinition::boolean("f"),
                2 => FieldDefinition::text("f"),
                3 => FieldDefinition::data("f"),
                4 => FieldDefinition::date("f"),
                _ => FieldDefinition::year("f"),
            };
            match pick {
                0 => {
                    let _ = field.set_length(Some(len % 20 + 1));
                    let _ = field.set_signed(flag);
                }
                2 => {
                    let _ = field.set_length(Some(len));
                    let _ = field.set_fixed_width(flag);
                }
                3 => {
                    let _ = field.set_length(Some(len));
                }
                _ => {}
            }
            field.set_nullable(nullable);
            field
        })
    }

    proptest! {
        #[test]
        fn repaired_values_are_valid(field in arb_field(), value in arb_value()) {
            if let Some(repaired) = field.repair(&value) {
                prop_assert!(field.is_valid_value(&repaired));
                prop_assert_eq!(field.repair(&repaired), Some(repaired));
            }
        }

        #[test]
        fn serialized_fields_parse_back_identically(field in arb_field(), comment in "[ -~]{0,30}") {
            let mut field = field;
            field.set_comment(&comment);
            let sql = field.serialize();
            let parsed = FieldDefinition::parse(&sql).unwrap();
            prop_assert_eq!(parsed.variant_name(), field.variant_name());
            prop_assert_eq!(parsed.serialize(), sql);
        }

        #[test]
        fn claim_is_deterministic(fragment in "(int|tinyint|varchar|char|blob|date|year|text)(\\([0-9]{1,3}\\))? [ -~]{0,20}") {
            let first = FieldVariant::claim(&fragment).map(|v| v.name);
            let second = FieldVariant::claim(&fragment).map(|v| v.name);
            prop_assert_eq!(first, second);
            if let Some(name) = first {
                let earliest = FIELD_VARIANTS.iter().find(|v| v.matches(&fragment)).map(|v| v.name);
                let tagged = FIELD_VARIANTS.iter().any(|v| v.carries_tag(&fragment));
                if !tagged {
                    prop_assert_eq!(Some(name), earliest);
                }
            }
        }
    }
}
