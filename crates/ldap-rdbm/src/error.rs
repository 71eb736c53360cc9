//! Error types for the directory-over-RDBM layer.

use std::path::PathBuf;

use thiserror::Error;

/// Exit code for configuration errors.
pub const EXIT_CONFIG_ERROR: u8 = 1;
/// Exit code for connection failures.
pub const EXIT_CONNECTION_ERROR: u8 = 2;
/// Exit code for schema document and type-mapping errors.
pub const EXIT_SCHEMA_ERROR: u8 = 3;
/// Exit code for query and data errors.
pub const EXIT_QUERY_ERROR: u8 = 4;
/// Exit code for file system errors.
pub const EXIT_IO_ERROR: u8 = 7;

/// Main error type for directory operations.
#[derive(Error, Debug)]
pub enum RdbmError {
    /// Configuration error (invalid YAML, missing fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A schema or mapping document is missing or malformed.
    #[error("Failed to load schema document {path}: {message}")]
    SchemaLoad { path: PathBuf, message: String },

    /// No relational type can be derived for an attribute.
    #[error("No relational type mapping for attribute '{0}'")]
    UnknownAttributeType(String),

    /// A value could not be converted to the column's type.
    #[error("Invalid value '{value}' for attribute '{attribute}'")]
    ValueFormat { attribute: String, value: String },

    /// Opening the database session failed.
    #[error("Connection error: {message}\n  Context: {context}")]
    Connection { message: String, context: String },

    /// A compiled or raw statement failed.
    #[error("Query failed while {context}: {message}")]
    QueryExecution { context: String, message: String },

    /// A distinguished name could not be parsed.
    #[error("Invalid distinguished name: {0}")]
    InvalidDn(String),

    /// An LDIF document could not be read.
    #[error("LDIF parse error at line {line}: {message}")]
    LdifParse { line: usize, message: String },

    /// No row carries this distinguished name.
    #[error("No entry found for '{0}'")]
    EntryNotFound(String),

    /// No reflected table carries this name.
    #[error("Table '{0}' does not exist")]
    UnknownTable(String),

    /// The table has no such column.
    #[error("Table '{table}' has no column '{column}'")]
    UnknownColumn { table: String, column: String },

    /// An identifier cannot be safely quoted.
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RdbmError {
    /// Create a Connection error with context about where it occurred
    pub fn connection(message: impl ToString, context: impl Into<String>) -> Self {
        RdbmError::Connection {
            message: message.to_string(),
            context: context.into(),
        }
    }

    /// Create a QueryExecution error
    pub fn query(message: impl ToString, context: impl Into<String>) -> Self {
        RdbmError::QueryExecution {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Create a SchemaLoad error for a document path
    pub fn schema_load(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        RdbmError::SchemaLoad {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Process exit code for this error family.
    pub fn exit_code(&self) -> u8 {
        match self {
            RdbmError::Config(_) | RdbmError::Yaml(_) => EXIT_CONFIG_ERROR,
            RdbmError::Connection { .. } => EXIT_CONNECTION_ERROR,
            RdbmError::SchemaLoad { .. } | RdbmError::UnknownAttributeType(_) => {
                EXIT_SCHEMA_ERROR
            }
            RdbmError::ValueFormat { .. }
            | RdbmError::QueryExecution { .. }
            | RdbmError::InvalidDn(_)
            | RdbmError::UnknownTable(_)
            | RdbmError::UnknownColumn { .. }
            | RdbmError::InvalidIdentifier(_)
            | RdbmError::EntryNotFound(_)
            | RdbmError::LdifParse { .. }
            | RdbmError::Json(_) => EXIT_QUERY_ERROR,
            RdbmError::Io(_) => EXIT_IO_ERROR,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for directory operations.
pub type Result<T> = std::result::Result<T, RdbmError>;
