//! Strata Core — value model, field/index/table definitions, and the
//! MySQL-style DDL they parse from and serialize to.

pub mod clock;
pub mod error;
pub mod field;
pub mod index;
pub mod schema;
pub mod sql;
pub mod types;

pub use clock::{ClockSource, ManualClock, SystemClock};
pub use error::SchemaError;
pub use field::{FieldComment, FieldDefinition, FieldKind, FieldType, FieldVariant, FIELD_VARIANTS};
pub use index::{
    ForeignKeyRef, IndexDefinition, IndexKind, IndexVariant, KeyKeyword, ReferentialAction,
    INDEX_VARIANTS,
};
pub use schema::TableDefinition;
pub use types::{Row, Value};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registries_are_in_priority_order() {
        let fields: Vec<&str> = FIELD_VARIANTS.iter().map(|v| v.name).collect();
        assert_eq!(fields[0], "NumberFieldDefinition");
        assert_eq!(fields.len(), 6);
        let indexes: Vec<&str> = INDEX_VARIANTS.iter().map(|v| v.name).collect();
        assert_eq!(
            indexes,
            vec!["PrimaryKeyDefinition", "ForeignKeyDefinition", "KeyDefinition"]
        );
    }
}
