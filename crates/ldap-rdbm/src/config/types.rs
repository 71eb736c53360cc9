//! Configuration type definitions.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Relational database connection.
    pub rdbm: RdbmConfig,

    /// Schema and type-mapping document locations.
    #[serde(default)]
    pub schema: SchemaConfig,
}

/// Supported relational backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// MySQL / MariaDB.
    #[default]
    Mysql,

    /// PostgreSQL.
    #[serde(alias = "postgres", alias = "postgresql")]
    Pgsql,
}

impl Backend {
    /// Backend whose type variants are used when another backend has none.
    pub const CANONICAL: Backend = Backend::Mysql;

    /// Identifier used as the key in the type-mapping documents.
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Mysql => "mysql",
            Backend::Pgsql => "pgsql",
        }
    }

    /// Default server port.
    pub fn default_port(&self) -> u16 {
        match self {
            Backend::Mysql => 3306,
            Backend::Pgsql => 5432,
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relational database connection parameters.
#[derive(Clone, Serialize, Deserialize)]
pub struct RdbmConfig {
    /// Backend kind (`mysql` or `pgsql`).
    #[serde(default)]
    pub r#type: Backend,

    /// Database host.
    #[serde(default = "default_host")]
    pub host: String,

    /// Database port (default: 3306 for MySQL, 5432 for PostgreSQL).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Database name.
    pub database: String,

    /// Username.
    pub user: String,

    /// Password.
    #[serde(default)]
    pub password: String,
}

impl fmt::Debug for RdbmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RdbmConfig")
            .field("type", &self.r#type)
            .field("host", &self.host)
            .field("port", &self.port())
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl RdbmConfig {
    /// Effective port, falling back to the backend default.
    pub fn port(&self) -> u16 {
        self.port.unwrap_or_else(|| self.r#type.default_port())
    }
}

/// Where the schema documents live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// Directory holding `jans_schema.json` and `custom_schema.json`.
    #[serde(default = "default_schema_dir")]
    pub schema_dir: PathBuf,

    /// Directory holding the syntax/type mapping documents.
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,

    /// Additional schema documents, absolute or relative to `schema_dir`.
    #[serde(default)]
    pub extra_files: Vec<PathBuf>,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            schema_dir: default_schema_dir(),
            static_dir: default_static_dir(),
            extra_files: Vec::new(),
        }
    }
}

/// Resolved locations of the three mapping documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingFiles {
    /// Syntax OID → relational type, per backend.
    pub syntax_types: PathBuf,
    /// Attribute name → relational type overrides, per backend.
    pub attribute_types: PathBuf,
    /// Legacy attribute name → syntax OID table.
    pub legacy_syntax: PathBuf,
}

impl SchemaConfig {
    /// Schema documents in load order: base, custom, then extras.
    pub fn schema_files(&self) -> Vec<PathBuf> {
        let mut files = vec![
            self.schema_dir.join("jans_schema.json"),
            self.schema_dir.join("custom_schema.json"),
        ];
        files.extend(self.extra_files.iter().map(|f| self.resolve(f)));
        files
    }

    /// Mapping documents under `static_dir`.
    pub fn mapping_files(&self) -> MappingFiles {
        MappingFiles {
            syntax_types: self.static_dir.join("ldap_sql_data_type_mapping.json"),
            attribute_types: self.static_dir.join("sql_data_types.json"),
            legacy_syntax: self.static_dir.join("opendj_attributes_syntax.json"),
        }
    }

    fn resolve(&self, file: &Path) -> PathBuf {
        if file.is_absolute() {
            file.to_path_buf()
        } else {
            self.schema_dir.join(file)
        }
    }
}

// Default value functions for serde
fn default_host() -> String {
    "localhost".to_string()
}

fn default_schema_dir() -> PathBuf {
    PathBuf::from("/opt/jans/jans-setup/schema")
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("/opt/jans/jans-setup/static/rdbm")
}
