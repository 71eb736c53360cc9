//! Reflected table metadata and row values.
//!
//! Every directory object class maps to one table. Rows carry three fixed
//! columns: `dn` (unique across the store), `doc_id` (the leaf RDN value)
//! and `objectClass` (the owning table's name).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::value::RdbmValue;

/// Column holding the entry's distinguished name.
pub const DN_COLUMN: &str = "dn";
/// Column holding the leaf RDN value.
pub const DOC_ID_COLUMN: &str = "doc_id";
/// Column holding the object class (= table name).
pub const OBJECT_CLASS_COLUMN: &str = "objectClass";

/// How a column's values are converted from directory strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// SMALLINT flag fed from truthy strings.
    Boolean,
    /// Base-10 integer.
    Integer,
    /// Timestamp from generalized time.
    Timestamp,
    /// Schemaless `{"v": [...]}` container.
    Structured,
    /// Anything else, stored verbatim.
    Text,
}

impl ColumnKind {
    /// Classify a type token from the mapping tables or a reflected column
    /// type. Matching is case-insensitive.
    pub fn from_type_token(token: &str) -> Self {
        match token.trim().to_uppercase().as_str() {
            "SMALLINT" => ColumnKind::Boolean,
            "INT" | "INTEGER" => ColumnKind::Integer,
            "DATETIME(3)" | "DATETIME" | "TIMESTAMP" | "TIMESTAMP WITHOUT TIME ZONE" => {
                ColumnKind::Timestamp
            }
            "JSON" | "JSONB" => ColumnKind::Structured,
            _ => ColumnKind::Text,
        }
    }
}

/// Column metadata discovered by reflection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    /// Column name.
    pub name: String,

    /// Data type as reported by the database (e.g. "varchar", "json").
    pub data_type: String,
}

impl ColumnSchema {
    /// Create a column description.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }

    /// Conversion kind for this column.
    pub fn kind(&self) -> ColumnKind {
        ColumnKind::from_type_token(&self.data_type)
    }

    /// Whether this is a schemaless document column.
    pub fn is_structured(&self) -> bool {
        self.kind() == ColumnKind::Structured
    }

    /// Whether values can be compared as plain strings in SQL.
    pub fn is_textual(&self) -> bool {
        matches!(
            self.data_type.to_lowercase().as_str(),
            "varchar"
                | "char"
                | "text"
                | "tinytext"
                | "mediumtext"
                | "longtext"
                | "character varying"
                | "character"
                | "bpchar"
                | "name"
        )
    }
}

/// Table metadata (one per object class).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    /// Table name, equal to the object class.
    pub name: String,

    /// Columns in ordinal order.
    pub columns: Vec<ColumnSchema>,
}

impl TableSchema {
    /// Create a table description.
    pub fn new(name: impl Into<String>, columns: Vec<ColumnSchema>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    /// Look up a column by exact name.
    pub fn column(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Whether the table has a column with this name.
    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Columns holding structured containers.
    pub fn structured_columns(&self) -> impl Iterator<Item = &ColumnSchema> {
        self.columns.iter().filter(|c| c.is_structured())
    }

    /// Group `(table, column, data_type)` triples, as returned by an
    /// information-schema query ordered by table, into table descriptions.
    pub fn group_columns<I>(rows: I) -> Vec<TableSchema>
    where
        I: IntoIterator<Item = (String, String, String)>,
    {
        let mut tables: Vec<TableSchema> = Vec::new();
        for (table, column, data_type) in rows {
            match tables.last_mut() {
                Some(last) if last.name == table => {
                    last.columns.push(ColumnSchema::new(column, data_type))
                }
                _ => tables.push(TableSchema::new(
                    table,
                    vec![ColumnSchema::new(column, data_type)],
                )),
            }
        }
        tables
    }
}

/// One materialized row.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EntityRow {
    /// Table the row was read from or is destined for.
    pub table: String,

    /// Column values by name.
    pub values: BTreeMap<String, RdbmValue>,
}

impl EntityRow {
    /// Create an empty row for `table`.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            values: BTreeMap::new(),
        }
    }

    /// Builder-style setter.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<RdbmValue>) -> Self {
        self.set(column, value);
        self
    }

    /// Set a column value.
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<RdbmValue>) {
        self.values.insert(column.into(), value.into());
    }

    /// Get a column value.
    pub fn get(&self, column: &str) -> Option<&RdbmValue> {
        self.values.get(column)
    }

    /// Whether the row carries a value for `column`.
    pub fn contains(&self, column: &str) -> bool {
        self.values.contains_key(column)
    }

    /// The row's distinguished name.
    pub fn dn(&self) -> Option<&str> {
        self.get(DN_COLUMN).and_then(RdbmValue::as_str)
    }

    /// The row's leaf RDN value.
    pub fn doc_id(&self) -> Option<&str> {
        self.get(DOC_ID_COLUMN).and_then(RdbmValue::as_str)
    }

    /// The row's object class.
    pub fn object_class(&self) -> Option<&str> {
        self.get(OBJECT_CLASS_COLUMN).and_then(RdbmValue::as_str)
    }

    /// Row as a JSON object.
    pub fn to_json(&self) -> JsonValue {
        JsonValue::Object(
            self.values
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }
}
