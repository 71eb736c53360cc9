//! Change record model.

use crate::core::schema::OBJECT_CLASS_COLUMN;

/// Control key naming the change type.
pub const CHANGETYPE: &str = "changetype";

/// What a change record asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeOperation {
    /// Materialize a new entry.
    Create,
    /// Append values to an attribute of an existing entry.
    AddAttribute(String),
    /// Overwrite an attribute of an existing entry.
    ReplaceAttribute(String),
    /// Anything else (delete, modrdn, modify without add/replace).
    Unsupported(String),
}

/// One `(dn, entry)` pair from an LDIF document.
///
/// Attribute order and value order are preserved as read.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChangeRecord {
    pub dn: String,
    pub entry: Vec<(String, Vec<String>)>,
}

impl ChangeRecord {
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            entry: Vec::new(),
        }
    }

    /// Builder-style append of one attribute value.
    pub fn with(mut self, attribute: &str, value: &str) -> Self {
        self.push(attribute, value);
        self
    }

    /// Append a value, grouping repeated attributes in first-seen order.
    pub fn push(&mut self, attribute: &str, value: &str) {
        match self.entry.iter_mut().find(|(name, _)| name == attribute) {
            Some((_, values)) => values.push(value.to_string()),
            None => self
                .entry
                .push((attribute.to_string(), vec![value.to_string()])),
        }
    }

    /// Values of `attribute` (exact name).
    pub fn values(&self, attribute: &str) -> Option<&[String]> {
        self.entry
            .iter()
            .find(|(name, _)| name == attribute)
            .map(|(_, values)| values.as_slice())
    }

    fn first(&self, attribute: &str) -> Option<&str> {
        self.values(attribute)?.first().map(String::as_str)
    }

    /// Object classes, matching the attribute name case-insensitively.
    pub fn object_classes(&self) -> Vec<String> {
        self.entry
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(OBJECT_CLASS_COLUMN))
            .map(|(_, values)| values.clone())
            .unwrap_or_default()
    }

    /// Attributes to store for a new entry: everything except object
    /// classes and control keys.
    pub fn data_attributes(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entry
            .iter()
            .filter(|(name, _)| {
                !name.eq_ignore_ascii_case(OBJECT_CLASS_COLUMN) && !name.eq_ignore_ascii_case(CHANGETYPE)
            })
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    /// Classify the record.
    ///
    /// Without a `changetype` key the record is a new entry. With one,
    /// `changetype: add` is a new entry and `changetype: modify` is decided
    /// by its `add:` or `replace:` key.
    pub fn operation(&self) -> ChangeOperation {
        let Some(changetype) = self.first(CHANGETYPE) else {
            return ChangeOperation::Create;
        };

        match changetype.to_lowercase().as_str() {
            "add" => ChangeOperation::Create,
            "modify" => {
                if let Some(attribute) = self.first("add") {
                    ChangeOperation::AddAttribute(attribute.to_string())
                } else if let Some(attribute) = self.first("replace") {
                    ChangeOperation::ReplaceAttribute(attribute.to_string())
                } else {
                    ChangeOperation::Unsupported(changetype.to_string())
                }
            }
            other => ChangeOperation::Unsupported(other.to_string()),
        }
    }
}
