//! Restricted LDAP filter support.
//!
//! Exactly two shapes are understood:
//!
//! - a single term: `(attr=value)`
//! - a two-term conjunction: `(&(attr1=value1)(attr2=value2))`
//!
//! Anything else (OR, NOT, nesting, three or more AND terms) parses as
//! [`ParsedFilter::Unsupported`] and compiles to no query.
//!
//! An `objectClass` term (case-insensitive) names the table. Other terms
//! become predicates: `*` alone matches anything and is dropped, a value
//! containing `*` becomes a LIKE pattern with `%`, any other value is an
//! equality test.

use std::sync::OnceLock;

use regex::Regex;

use crate::core::schema::OBJECT_CLASS_COLUMN;
use crate::core::traits::Predicate;

fn single_term() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\(([^()=]+)=([^()]*)\)$").expect("valid single-term pattern"))
}

fn conjunction() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\(&\(([^()=]+)=([^()]*)\)\(([^()=]+)=([^()]*)\)\)$")
            .expect("valid conjunction pattern")
    })
}

/// One `attr=value` comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    pub attribute: String,
    pub value: String,
}

impl Term {
    fn new(attribute: &str, value: &str) -> Self {
        Self {
            attribute: attribute.trim().to_string(),
            value: value.to_string(),
        }
    }

    fn is_object_class(&self) -> bool {
        self.attribute.eq_ignore_ascii_case(OBJECT_CLASS_COLUMN)
    }

    /// Predicate for this term, or `None` for a bare `*`.
    fn to_predicate(&self) -> Option<Predicate> {
        if self.value == "*" {
            None
        } else if self.value.contains('*') {
            Some(Predicate::like(&self.attribute, self.value.replace('*', "%")))
        } else {
            Some(Predicate::equals(&self.attribute, self.value.as_str()))
        }
    }
}

/// Result of parsing a filter string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedFilter {
    Single(Term),
    Conjunction(Term, Term),
    Unsupported,
}

/// A filter resolved to a table and predicates.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub table: String,
    pub predicates: Vec<Predicate>,
}

impl ParsedFilter {
    /// Parse a filter string. Never fails.
    pub fn parse(filter: &str) -> Self {
        let filter = filter.trim();

        if let Some(caps) = conjunction().captures(filter) {
            return ParsedFilter::Conjunction(
                Term::new(&caps[1], &caps[2]),
                Term::new(&caps[3], &caps[4]),
            );
        }

        if let Some(caps) = single_term().captures(filter) {
            return ParsedFilter::Single(Term::new(&caps[1], &caps[2]));
        }

        ParsedFilter::Unsupported
    }

    /// Terms in filter order.
    pub fn terms(&self) -> Vec<&Term> {
        match self {
            ParsedFilter::Single(t) => vec![t],
            ParsedFilter::Conjunction(a, b) => vec![a, b],
            ParsedFilter::Unsupported => Vec::new(),
        }
    }

    /// Resolve to a table and predicates.
    ///
    /// Returns `None` for unsupported filters and for filters without a
    /// concrete `objectClass` term. The first `objectClass` term picks the
    /// table; a second one becomes an ordinary predicate.
    pub fn compile(&self) -> Option<CompiledQuery> {
        let terms = self.terms();
        let class_idx = terms
            .iter()
            .position(|t| t.is_object_class() && !t.value.is_empty() && !t.value.contains('*'))?;

        let predicates = terms
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != class_idx)
            .filter_map(|(_, t)| t.to_predicate())
            .collect();

        Some(CompiledQuery {
            table: terms[class_idx].value.clone(),
            predicates,
        })
    }
}
