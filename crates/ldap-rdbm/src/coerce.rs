//! Conversion between directory attribute values and relational column values.
//!
//! Directory attributes are ordered lists of strings. The relational type an
//! attribute maps to (see [`SchemaCatalog::relational_type`]) decides how the
//! list becomes a column value:
//!
//! | type token            | kind         | conversion                                 |
//! |-----------------------|--------------|--------------------------------------------|
//! | `SMALLINT`            | Boolean      | first value in {1,on,true,yes,ok} → 1 else 0 |
//! | `INT`                 | Integer      | first value parsed base-10                 |
//! | `DATETIME(3)`, `TIMESTAMP` | Timestamp | generalized time → `YYYY-MM-DD HH:MM:SS` |
//! | `JSON`, `JSONB`       | Structured   | all values as `{"v": [...]}`               |
//! | anything else         | Text         | first value verbatim                       |

use tracing::trace;

use crate::config::Backend;
use crate::error::{RdbmError, Result};
use crate::schema::SchemaCatalog;

pub use crate::core::schema::ColumnKind;
pub use crate::core::value::RdbmValue;

/// Values accepted as true for boolean-like columns (compared lowercased).
const TRUTHY: [&str; 5] = ["1", "on", "true", "yes", "ok"];

/// Converts attribute values for one backend using the schema catalog.
#[derive(Debug, Clone, Copy)]
pub struct TypeCoercer<'a> {
    catalog: &'a SchemaCatalog,
    backend: Backend,
}

impl<'a> TypeCoercer<'a> {
    pub fn new(catalog: &'a SchemaCatalog, backend: Backend) -> Self {
        Self { catalog, backend }
    }

    /// Backend the coercer targets.
    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Relational type token for `attribute` on this backend.
    pub fn relational_type(&self, attribute: &str) -> Result<&'a str> {
        self.catalog.relational_type(attribute, self.backend)
    }

    /// Conversion kind for `attribute`.
    pub fn column_kind(&self, attribute: &str) -> Result<ColumnKind> {
        self.relational_type(attribute)
            .map(ColumnKind::from_type_token)
    }

    /// Convert directory values into the column value for `attribute`.
    ///
    /// Only structured attributes use every value; all other kinds take the
    /// first one and fail with [`RdbmError::ValueFormat`] if there is none.
    pub fn coerce<S: AsRef<str>>(&self, attribute: &str, values: &[S]) -> Result<RdbmValue> {
        let kind = self.column_kind(attribute)?;
        trace!("Coercing {} as {:?}", attribute, kind);

        if kind == ColumnKind::Structured {
            return Ok(RdbmValue::structured(
                values.iter().map(|v| v.as_ref().to_string()),
            ));
        }

        let first = values
            .first()
            .map(AsRef::as_ref)
            .ok_or_else(|| RdbmError::ValueFormat {
                attribute: attribute.to_string(),
                value: String::new(),
            })?;

        match kind {
            ColumnKind::Boolean => Ok(RdbmValue::Int(i64::from(is_truthy(first)))),
            ColumnKind::Integer => {
                first
                    .trim()
                    .parse::<i64>()
                    .map(RdbmValue::Int)
                    .map_err(|_| RdbmError::ValueFormat {
                        attribute: attribute.to_string(),
                        value: first.to_string(),
                    })
            }
            ColumnKind::Timestamp => Ok(RdbmValue::Text(reformat_timestamp(first))),
            ColumnKind::Structured | ColumnKind::Text => Ok(RdbmValue::Text(first.to_string())),
        }
    }

    /// Convert a stored column value back into directory values.
    pub fn to_directory(&self, attribute: &str, value: &RdbmValue) -> Result<Vec<String>> {
        let kind = self.column_kind(attribute)?;
        Ok(match (kind, value) {
            (_, RdbmValue::Null) => Vec::new(),
            (ColumnKind::Boolean, RdbmValue::Int(v)) => {
                vec![if *v != 0 { "true" } else { "false" }.to_string()]
            }
            (ColumnKind::Timestamp, RdbmValue::Text(s)) => vec![to_generalized_time(s)],
            (_, v @ RdbmValue::Json(_)) => match v.structured_items() {
                Some(items) => items
                    .iter()
                    .map(|item| match item.as_str() {
                        Some(s) => s.to_string(),
                        None => item.to_string(),
                    })
                    .collect(),
                None => vec![v.to_string()],
            },
            (_, other) => vec![other.to_string()],
        })
    }
}

/// Whether a directory value counts as true for a boolean-like column.
pub fn is_truthy(value: &str) -> bool {
    let lowered = value.to_lowercase();
    TRUTHY.contains(&lowered.as_str())
}

/// Reformat `YYYYMMDDHHMMSS[.fff]Z` as `YYYY-MM-DD HH:MM:SS[.fff]`.
///
/// Slices at fixed character offsets after trimming `Z` from both ends.
/// Short or malformed input yields truncated output, never an error. Only
/// the three characters after the seconds are kept, so `.123` comes out as
/// `.12`.
pub fn reformat_timestamp(value: &str) -> String {
    let chars: Vec<char> = value.trim_matches('Z').chars().collect();
    let part = |start: usize, end: usize| -> String {
        let start = start.min(chars.len());
        let end = end.min(chars.len());
        chars[start..end].iter().collect()
    };

    format!(
        "{}-{}-{} {}:{}:{}{}",
        part(0, 4),
        part(4, 6),
        part(6, 8),
        part(8, 10),
        part(10, 12),
        part(12, 14),
        part(14, 17)
    )
}

/// Inverse of [`reformat_timestamp`] for well-formed values.
fn to_generalized_time(value: &str) -> String {
    let digits: String = value
        .chars()
        .filter(|c| !matches!(c, '-' | ' ' | ':' | 'T'))
        .collect();
    format!("{}Z", digits)
}
