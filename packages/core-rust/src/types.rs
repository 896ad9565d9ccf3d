use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A single result or input row: column name to cell value.
///
/// Uses `BTreeMap` so rows compare, print, and serialize deterministically.
pub type Row = BTreeMap<String, Value>;

/// Generic runtime value type for table cells.
///
/// Supports all JSON-compatible types plus binary data. Rows returned by a
/// driver, rows validated against a `TableDefinition`, and field defaults are
/// all expressed in terms of `Value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// SQL/JSON null.
    Null,
    /// Boolean.
    Bool(bool),
    /// Signed 64-bit integer.
    Int(i64),
    /// 64-bit IEEE 754 floating point.
    Float(f64),
    /// UTF-8 text.
    String(String),
    /// Binary data (not directly representable in JSON).
    Bytes(Vec<u8>),
    /// Ordered sequence of values.
    Array(Vec<Value>),
    /// Nested object with deterministic key order.
    Map(BTreeMap<String, Value>),
}

/// Fixed per-value overhead used by [`Value::estimated_size`].
const VALUE_OVERHEAD: u64 = std::mem::size_of::<Value>() as u64;

impl Value {
    /// Returns `true` for [`Value::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the string slice if this is a [`Value::String`].
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Estimated heap cost of this value in bytes, including nested values.
    ///
    /// Not exact: it counts payload bytes plus a fixed per-value overhead,
    /// which is enough to weigh cached result sets against each other.
    #[must_use]
    pub fn estimated_size(&self) -> u64 {
        let payload = match self {
            Value::Null | Value::Bool(_) | Value::Int(_) | Value::Float(_) => 0,
            Value::String(s) => s.len() as u64,
            Value::Bytes(b) => b.len() as u64,
            Value::Array(items) => items.iter().map(Value::estimated_size).sum(),
            Value::Map(map) => map
                .iter()
                .map(|(k, v)| k.len() as u64 + v.estimated_size())
                .sum(),
        };
        VALUE_OVERHEAD + payload
    }

    /// Renders the value the way it appears inside a quoted DDL literal.
    ///
    /// Returns `None` for values that have no scalar SQL form (arrays, maps,
    /// and non-UTF-8 bytes).
    #[must_use]
    pub fn to_sql_literal(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
            Value::Int(i) => Some(i.to_string()),
            Value::Float(f) => Some(f.to_string()),
            Value::String(s) => Some(s.clone()),
            Value::Bytes(b) => String::from_utf8(b.clone()).ok(),
            Value::Array(_) | Value::Map(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Value::Array(_) | Value::Map(_) => {
                let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
                f.write_str(&json)
            }
            other => match other.to_sql_literal() {
                Some(s) => f.write_str(&s),
                None => Err(fmt::Error),
            },
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimated_size_grows_with_payload() {
        let short = Value::from("ab");
        let long = Value::from("abcdefghij");
        assert!(long.estimated_size() > short.estimated_size());
        assert_eq!(long.estimated_size() - short.estimated_size(), 8);
    }

    #[test]
    fn estimated_size_counts_nested_map_keys() {
        let mut inner = BTreeMap::new();
        inner.insert("name".to_string(), Value::from("x"));
        let map = Value::Map(inner);
        assert_eq!(map.estimated_size(), VALUE_OVERHEAD * 2 + 4 + 1);
    }

    #[test]
    fn sql_literal_forms() {
        assert_eq!(Value::Int(-3).to_sql_literal().as_deref(), Some("-3"));
        assert_eq!(Value::Float(3.5).to_sql_literal().as_deref(), Some("3.5"));
        assert_eq!(Value::Bool(true).to_sql_literal().as_deref(), Some("1"));
        assert_eq!(Value::Null.to_sql_literal(), None);
        assert_eq!(Value::Array(vec![]).to_sql_literal(), None);
    }

    #[test]
    fn json_rows_deserialize_untagged() {
        let row: Row = serde_json::from_str(r#"{"ID": 7, "Name": "ann", "Score": 1.5, "Gone": null}"#)
            .expect("valid row json");
        assert_eq!(row["ID"], Value::Int(7));
        assert_eq!(row["Name"], Value::from("ann"));
        assert_eq!(row["Score"], Value::Float(1.5));
        assert!(row["Gone"].is_null());
    }
}
