//! Identifier validation and quoting.
//!
//! Table and column names come from reflection, LDIF attribute names and
//! filter strings. None of them can be bound as statement parameters, so
//! every identifier that reaches SQL text goes through [`quote_mysql`] or
//! [`quote_pg`].

use crate::error::{RdbmError, Result};

/// Maximum identifier length (MySQL allows 64 characters, PostgreSQL 63 bytes).
const MAX_IDENTIFIER_LENGTH: usize = 64;

/// Validate an identifier before it is quoted.
///
/// Rejects empty names, names containing null bytes and names longer than
/// the backends accept.
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(RdbmError::InvalidIdentifier(
            "identifier cannot be empty".to_string(),
        ));
    }

    if name.contains('\0') {
        return Err(RdbmError::InvalidIdentifier(format!(
            "identifier contains null byte: {:?}",
            name
        )));
    }

    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(RdbmError::InvalidIdentifier(format!(
            "identifier exceeds maximum length of {} bytes (got {} bytes): {:?}",
            MAX_IDENTIFIER_LENGTH,
            name.len(),
            name
        )));
    }

    Ok(())
}

/// Quote a PostgreSQL identifier with double quotes.
///
/// ```ignore
/// assert_eq!(quote_pg("jansClnt")?, "\"jansClnt\"");
/// ```
pub fn quote_pg(name: &str) -> Result<String> {
    validate_identifier(name)?;
    Ok(format!("\"{}\"", name.replace('"', "\"\"")))
}

/// Quote a MySQL identifier with backticks.
///
/// ```ignore
/// assert_eq!(quote_mysql("jansClnt")?, "`jansClnt`");
/// ```
pub fn quote_mysql(name: &str) -> Result<String> {
    validate_identifier(name)?;
    Ok(format!("`{}`", name.replace('`', "``")))
}
