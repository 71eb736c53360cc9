//! Column values exchanged with the relational store.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

/// Key holding the value list inside a structured (multivalued) column.
pub const STRUCTURED_KEY: &str = "v";

/// A single relational column value.
///
/// Timestamps travel as text in `YYYY-MM-DD HH:MM:SS[.fff]` form; the
/// drivers cast them to the column type on write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RdbmValue {
    /// SQL NULL.
    Null,

    /// Integer column (also used for boolean-like SMALLINT flags).
    Int(i64),

    /// Text, varchar and timestamp columns.
    Text(String),

    /// JSON document (structured/multivalued columns and raw JSON).
    Json(JsonValue),
}

impl RdbmValue {
    /// Empty structured container `{"v": []}`.
    pub fn empty_structured() -> Self {
        RdbmValue::Json(json!({ STRUCTURED_KEY: [] }))
    }

    /// Structured container holding `values` in order.
    pub fn structured<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: Vec<JsonValue> = values
            .into_iter()
            .map(|v| JsonValue::String(v.into()))
            .collect();
        RdbmValue::Json(json!({ STRUCTURED_KEY: values }))
    }

    /// Check if this value is NULL.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, RdbmValue::Null)
    }

    /// Borrow the text content, if this is a text value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            RdbmValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Integer content, if this is an integer value.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            RdbmValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Borrow the JSON document, if this is a JSON value.
    pub fn as_json(&self) -> Option<&JsonValue> {
        match self {
            RdbmValue::Json(v) => Some(v),
            _ => None,
        }
    }

    /// Items of a structured container, or `None` if this is not one.
    pub fn structured_items(&self) -> Option<&Vec<JsonValue>> {
        self.as_json()?.get(STRUCTURED_KEY)?.as_array()
    }

    /// Convert into a JSON value for display or serialization.
    pub fn to_json(&self) -> JsonValue {
        match self {
            RdbmValue::Null => JsonValue::Null,
            RdbmValue::Int(v) => JsonValue::from(*v),
            RdbmValue::Text(s) => JsonValue::String(s.clone()),
            RdbmValue::Json(v) => v.clone(),
        }
    }
}

impl fmt::Display for RdbmValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RdbmValue::Null => f.write_str("NULL"),
            RdbmValue::Int(v) => write!(f, "{}", v),
            RdbmValue::Text(s) => f.write_str(s),
            RdbmValue::Json(v) => write!(f, "{}", v),
        }
    }
}

impl From<&str> for RdbmValue {
    fn from(v: &str) -> Self {
        RdbmValue::Text(v.to_string())
    }
}

impl From<String> for RdbmValue {
    fn from(v: String) -> Self {
        RdbmValue::Text(v)
    }
}

impl From<i64> for RdbmValue {
    fn from(v: i64) -> Self {
        RdbmValue::Int(v)
    }
}

impl From<JsonValue> for RdbmValue {
    fn from(v: JsonValue) -> Self {
        RdbmValue::Json(v)
    }
}
