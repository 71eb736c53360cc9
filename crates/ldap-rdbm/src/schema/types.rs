//! Schema document types.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::Backend;

/// Syntax marker returned for multivalued attributes.
pub const STRUCTURED_SYNTAX: &str = "JSON";

/// Directory String syntax, the fallback for attributes nobody declares.
pub const DIRECTORY_STRING_SYNTAX: &str = "1.3.6.1.4.1.1466.115.121.1.15";

/// One attribute type from a schema document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDefinition {
    /// Names (aliases) the attribute is known by.
    pub names: Vec<String>,

    /// Attribute syntax OID.
    pub syntax: String,

    /// Whether the attribute may carry more than one value.
    #[serde(default)]
    pub multivalued: bool,
}

/// Top-level layout of a schema document.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SchemaDocument {
    pub attribute_types: Vec<AttributeDefinition>,
}

/// Column type for one backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnTypeSpec {
    /// Type token, e.g. `VARCHAR`, `DATETIME(3)`, `JSON`.
    #[serde(rename = "type")]
    pub type_name: String,

    /// Optional length for sized types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
}

/// Backend identifier → column type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SyntaxTypeRule(pub HashMap<String, ColumnTypeSpec>);

impl SyntaxTypeRule {
    /// Type for `backend`, falling back to the canonical backend's entry.
    pub fn for_backend(&self, backend: Backend) -> Option<&ColumnTypeSpec> {
        self.0
            .get(backend.as_str())
            .or_else(|| self.0.get(Backend::CANONICAL.as_str()))
    }
}
