//! Minimal LDIF reader.
//!
//! Handles what the installer's templates contain: blank-line separated
//! records, `#` comments, folded lines (continuations start with one space),
//! `attr: value` pairs, base64 `attr:: value` pairs, an optional leading
//! `version:` line and `-` separators inside modify blocks.

use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use tracing::{debug, warn};

use super::record::ChangeRecord;
use crate::error::{RdbmError, Result};

/// Join folded lines, dropping comments. Yields `(line_number, text)` with
/// the number of the line where each logical line starts.
fn unfold(text: &str) -> Vec<(usize, String)> {
    let mut lines: Vec<(usize, String)> = Vec::new();
    let mut in_comment = false;

    for (idx, raw) in text.lines().enumerate() {
        let raw = raw.strip_suffix('\r').unwrap_or(raw);

        if let Some(rest) = raw.strip_prefix(' ') {
            if in_comment {
                continue;
            }
            if let Some((_, last)) = lines.last_mut() {
                last.push_str(rest);
                continue;
            }
        }

        in_comment = raw.starts_with('#');
        if !in_comment {
            lines.push((idx + 1, raw.to_string()));
        }
    }
    lines
}

/// Parse LDIF text into change records.
pub fn read_ldif(text: &str) -> Result<Vec<ChangeRecord>> {
    let mut records = Vec::new();
    let mut current: Option<ChangeRecord> = None;

    for (line_no, line) in unfold(text) {
        if line.trim().is_empty() {
            if let Some(record) = current.take() {
                records.push(record);
            }
            continue;
        }
        if line == "-" {
            continue;
        }

        let (attribute, value) = split_line(line_no, &line)?;

        if let Some(record) = current.as_mut() {
            record.push(attribute, &value);
        } else if attribute.eq_ignore_ascii_case("dn") {
            current = Some(ChangeRecord::new(value));
        } else if attribute.eq_ignore_ascii_case("version") {
            debug!("LDIF version {}", value);
        } else {
            return Err(RdbmError::LdifParse {
                line: line_no,
                message: format!("expected 'dn:' but found '{}'", attribute),
            });
        }
    }

    if let Some(record) = current {
        records.push(record);
    }
    Ok(records)
}

/// Read and parse an LDIF file.
pub fn read_ldif_file<P: AsRef<Path>>(path: P) -> Result<Vec<ChangeRecord>> {
    let text = std::fs::read_to_string(path.as_ref())?;
    read_ldif(&text)
}

fn split_line(line_no: usize, line: &str) -> Result<(&str, String)> {
    let (attribute, rest) = line.split_once(':').ok_or_else(|| RdbmError::LdifParse {
        line: line_no,
        message: format!("missing ':' in '{}'", line),
    })?;

    let attribute = attribute.trim();
    if attribute.is_empty() {
        return Err(RdbmError::LdifParse {
            line: line_no,
            message: "empty attribute name".to_string(),
        });
    }

    if let Some(encoded) = rest.strip_prefix(':') {
        return Ok((attribute, decode_base64(line_no, attribute, encoded.trim())?));
    }
    // `attr:< url` is kept verbatim.
    if let Some(url) = rest.strip_prefix('<') {
        warn!("Line {}: URL value for {} is kept as is", line_no, attribute);
        return Ok((attribute, url.trim().to_string()));
    }

    Ok((attribute, rest.trim_start().to_string()))
}

/// Decode an `attr:: value` payload. Values must be UTF-8 text.
fn decode_base64(line_no: usize, attribute: &str, encoded: &str) -> Result<String> {
    let bytes = BASE64.decode(encoded).map_err(|e| RdbmError::LdifParse {
        line: line_no,
        message: format!("invalid base64 value for {}: {}", attribute, e),
    })?;
    String::from_utf8(bytes).map_err(|_| RdbmError::LdifParse {
        line: line_no,
        message: format!("base64 value for {} is not UTF-8", attribute),
    })
}
