//! Attribute-syntax catalog and relational type lookup.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::{debug, info};

use super::types::{
    AttributeDefinition, SchemaDocument, SyntaxTypeRule, DIRECTORY_STRING_SYNTAX,
    STRUCTURED_SYNTAX,
};
use crate::config::{Backend, MappingFiles, SchemaConfig};
use crate::error::{RdbmError, Result};

/// Loaded attribute definitions and syntax→type tables.
///
/// Built once at startup and never mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct SchemaCatalog {
    attributes: Vec<AttributeDefinition>,
    /// Alias → index into `attributes`. Later documents overwrite earlier ones.
    by_name: HashMap<String, usize>,
    syntax_types: HashMap<String, SyntaxTypeRule>,
    attribute_types: HashMap<String, SyntaxTypeRule>,
    legacy_syntax: HashMap<String, String>,
}

impl SchemaCatalog {
    /// Load schema documents in order plus the three mapping documents.
    pub fn load<P: AsRef<Path>>(schema_files: &[P], mapping: &MappingFiles) -> Result<Self> {
        info!("Reading directory schema");

        let mut catalog = Self::default();
        for path in schema_files {
            let path = path.as_ref();
            let document: SchemaDocument = read_json(path)?;
            debug!(
                "Loaded {} attribute types from {}",
                document.attribute_types.len(),
                path.display()
            );
            catalog.extend(document.attribute_types);
        }

        catalog.syntax_types = read_json(&mapping.syntax_types)?;
        catalog.attribute_types = read_json(&mapping.attribute_types)?;
        catalog.legacy_syntax = read_json(&mapping.legacy_syntax)?;

        info!(
            "Schema catalog ready: {} attribute types, {} syntax mappings",
            catalog.attributes.len(),
            catalog.syntax_types.len()
        );
        Ok(catalog)
    }

    /// Load using the locations from the configuration.
    pub fn from_config(schema: &SchemaConfig) -> Result<Self> {
        let files: Vec<PathBuf> = schema.schema_files();
        Self::load(&files, &schema.mapping_files())
    }

    /// Build a catalog from already-parsed parts.
    pub fn from_parts(
        attributes: Vec<AttributeDefinition>,
        syntax_types: HashMap<String, SyntaxTypeRule>,
        attribute_types: HashMap<String, SyntaxTypeRule>,
        legacy_syntax: HashMap<String, String>,
    ) -> Self {
        let mut catalog = Self {
            syntax_types,
            attribute_types,
            legacy_syntax,
            ..Self::default()
        };
        catalog.extend(attributes);
        catalog
    }

    fn extend(&mut self, definitions: Vec<AttributeDefinition>) {
        for definition in definitions {
            let idx = self.attributes.len();
            for name in &definition.names {
                self.by_name.insert(name.clone(), idx);
            }
            self.attributes.push(definition);
        }
    }

    /// Definition registered for an attribute name, if any.
    pub fn attribute(&self, name: &str) -> Option<&AttributeDefinition> {
        self.by_name.get(name).map(|&idx| &self.attributes[idx])
    }

    /// Number of attribute definitions loaded.
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Whether no attribute definitions are loaded.
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Syntax identifier for an attribute.
    ///
    /// Multivalued attributes report [`STRUCTURED_SYNTAX`]; declared ones
    /// report their syntax; anything else goes through the legacy table and
    /// finally defaults to Directory String. Never fails.
    pub fn syntax_of(&self, name: &str) -> &str {
        if let Some(definition) = self.attribute(name) {
            if definition.multivalued {
                return STRUCTURED_SYNTAX;
            }
            return &definition.syntax;
        }

        self.legacy_syntax
            .get(name)
            .map(String::as_str)
            .unwrap_or(DIRECTORY_STRING_SYNTAX)
    }

    /// Relational column type token for an attribute on `backend`.
    pub fn relational_type(&self, name: &str, backend: Backend) -> Result<&str> {
        let rule = match self.attribute_types.get(name) {
            Some(rule) => rule,
            None => self
                .syntax_types
                .get(self.syntax_of(name))
                .ok_or_else(|| RdbmError::UnknownAttributeType(name.to_string()))?,
        };

        rule.for_backend(backend)
            .map(|spec| spec.type_name.as_str())
            .ok_or_else(|| RdbmError::UnknownAttributeType(name.to_string()))
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content =
        std::fs::read_to_string(path).map_err(|e| RdbmError::schema_load(path, e))?;
    serde_json::from_str(&content).map_err(|e| RdbmError::schema_load(path, e))
}
