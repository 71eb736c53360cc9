//! Schema catalog: directory attribute definitions and the
//! syntax → relational type tables.
//!
//! Two kinds of documents feed the catalog:
//!
//! - schema documents (`{"attributeTypes": [...]}`), merged in order
//! - mapping documents keyed by syntax OID or attribute name, each entry
//!   carrying per-backend column types (`{"mysql": {"type": "INT"}, ...}`)

mod catalog;
mod types;

pub use catalog::SchemaCatalog;
pub use types::{
    AttributeDefinition, ColumnTypeSpec, SyntaxTypeRule, DIRECTORY_STRING_SYNTAX,
    STRUCTURED_SYNTAX,
};

#[cfg(test)]
pub(crate) mod fixtures {
    //! Small schema shared by unit tests across the crate.

    use std::path::Path;

    use super::{AttributeDefinition, SchemaCatalog};
    use crate::config::MappingFiles;

    pub const SCHEMA_JSON: &str = r#"{
        "attributeTypes": [
            {"names": ["jansEnabled"], "syntax": "1.3.6.1.4.1.1466.115.121.1.7"},
            {"names": ["jansRedirectURI", "redirectURI"], "syntax": "1.3.6.1.4.1.1466.115.121.1.15", "multivalued": true},
            {"names": ["jansConfProperty"], "syntax": "1.3.6.1.4.1.1466.115.121.1.15", "multivalued": true},
            {"names": ["jansScope"], "syntax": "1.3.6.1.4.1.1466.115.121.1.12", "multivalued": true},
            {"names": ["creationDate"], "syntax": "1.3.6.1.4.1.1466.115.121.1.24"},
            {"names": ["displayName"], "syntax": "1.3.6.1.4.1.1466.115.121.1.15"},
            {"names": ["jansConfDyn"], "syntax": "1.3.6.1.4.1.1466.115.121.1.15"},
            {"names": ["jansRevision"], "syntax": "1.3.6.1.4.1.1466.115.121.1.27"},
            {"names": ["inum"], "syntax": "1.3.6.1.4.1.1466.115.121.1.15"}
        ]
    }"#;

    pub const SYNTAX_TYPES_JSON: &str = r#"{
        "1.3.6.1.4.1.1466.115.121.1.7": {"mysql": {"type": "SMALLINT"}},
        "1.3.6.1.4.1.1466.115.121.1.15": {"mysql": {"type": "VARCHAR", "size": 64}, "pgsql": {"type": "VARCHAR", "size": 64}},
        "1.3.6.1.4.1.1466.115.121.1.24": {"mysql": {"type": "DATETIME(3)"}, "pgsql": {"type": "TIMESTAMP"}},
        "1.3.6.1.4.1.1466.115.121.1.27": {"mysql": {"type": "INT"}, "pgsql": {"type": "INT"}},
        "JSON": {"mysql": {"type": "JSON"}, "pgsql": {"type": "JSONB"}}
    }"#;

    pub const ATTRIBUTE_TYPES_JSON: &str = r#"{
        "jansConfDyn": {"mysql": {"type": "TEXT"}, "pgsql": {"type": "TEXT"}},
        "description": {"mysql": {"type": "VARCHAR", "size": 768}}
    }"#;

    pub const LEGACY_SYNTAX_JSON: &str = r#"{
        "uidNumber": "1.3.6.1.4.1.1466.115.121.1.27",
        "photo": "1.3.6.1.4.1.1466.115.121.1.28"
    }"#;

    #[derive(serde::Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Doc {
        attribute_types: Vec<AttributeDefinition>,
    }

    pub fn catalog() -> SchemaCatalog {
        let doc: Doc = serde_json::from_str(SCHEMA_JSON).unwrap();
        SchemaCatalog::from_parts(
            doc.attribute_types,
            serde_json::from_str(SYNTAX_TYPES_JSON).unwrap(),
            serde_json::from_str(ATTRIBUTE_TYPES_JSON).unwrap(),
            serde_json::from_str(LEGACY_SYNTAX_JSON).unwrap(),
        )
    }

    pub fn write_mapping_files(dir: &Path) -> MappingFiles {
        let mapping = MappingFiles {
            syntax_types: dir.join("ldap_sql_data_type_mapping.json"),
            attribute_types: dir.join("sql_data_types.json"),
            legacy_syntax: dir.join("opendj_attributes_syntax.json"),
        };
        std::fs::write(&mapping.syntax_types, SYNTAX_TYPES_JSON).unwrap();
        std::fs::write(&mapping.attribute_types, ATTRIBUTE_TYPES_JSON).unwrap();
        std::fs::write(&mapping.legacy_syntax, LEGACY_SYNTAX_JSON).unwrap();
        mapping
    }
}
