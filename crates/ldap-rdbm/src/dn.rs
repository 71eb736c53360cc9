//! Distinguished-name parsing.
//!
//! DNs are comma-separated `attr=value` components, most specific first.
//! Commas inside a value must be backslash-escaped or the value quoted.

use std::fmt;

use crate::error::{RdbmError, Result};

/// One relative distinguished name (`attr=value`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rdn {
    /// Attribute type, e.g. `inum`.
    pub attribute: String,
    /// Value with escapes and quoting removed.
    pub value: String,
    /// Value exactly as written in the DN (escapes kept).
    pub raw_value: String,
}

impl fmt::Display for Rdn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.attribute, self.raw_value)
    }
}

/// Split a DN into its RDNs.
pub fn parse_dn(dn: &str) -> Result<Vec<Rdn>> {
    let mut rdns = Vec::new();
    for component in split_components(dn)? {
        rdns.push(parse_rdn(dn, &component)?);
    }
    Ok(rdns)
}

/// The DN with its first RDN removed.
pub fn root_dn(dn: &str) -> Result<String> {
    let rdns = parse_dn(dn)?;
    Ok(rdns
        .iter()
        .skip(1)
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(","))
}

/// Value of the first RDN, e.g. `1234` for `inum=1234,ou=clients,o=jans`.
pub fn leaf_value(dn: &str) -> Result<String> {
    parse_dn(dn)?
        .into_iter()
        .next()
        .map(|rdn| rdn.value)
        .ok_or_else(|| RdbmError::InvalidDn(dn.to_string()))
}

fn split_components(dn: &str) -> Result<Vec<String>> {
    let mut components = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = dn.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                current.push(c);
                match chars.next() {
                    Some(next) => current.push(next),
                    None => {
                        return Err(RdbmError::InvalidDn(format!(
                            "{} (dangling escape)",
                            dn
                        )))
                    }
                }
            }
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            ',' if !in_quotes => {
                components.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }

    if in_quotes {
        return Err(RdbmError::InvalidDn(format!("{} (unterminated quote)", dn)));
    }
    if !current.trim().is_empty() || !components.is_empty() {
        components.push(current);
    }

    Ok(components)
}

fn parse_rdn(dn: &str, component: &str) -> Result<Rdn> {
    let (attribute, raw_value) = component
        .split_once('=')
        .ok_or_else(|| RdbmError::InvalidDn(format!("{} (component '{}')", dn, component)))?;

    let attribute = attribute.trim();
    if attribute.is_empty() {
        return Err(RdbmError::InvalidDn(format!(
            "{} (component '{}' has no attribute)",
            dn, component
        )));
    }

    let raw_value = raw_value.trim();
    Ok(Rdn {
        attribute: attribute.to_string(),
        value: unescape(raw_value),
        raw_value: raw_value.to_string(),
    })
}

fn unescape(raw: &str) -> String {
    let raw = raw
        .strip_prefix('"')
        .and_then(|r| r.strip_suffix('"'))
        .unwrap_or(raw);

    let mut value = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                value.push(next);
            }
        } else {
            value.push(c);
        }
    }
    value
}
