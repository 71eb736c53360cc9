//! Filter searches and raw statements.
//!
//! Neither operation propagates errors. Failures are logged and reported as
//! [`QueryOutcome::Failed`] so callers can tell "no rows" from "query failed".

use std::fmt;

use tracing::{debug, error, info, warn};

use super::Directory;
use crate::core::schema::EntityRow;
use crate::core::traits::Fetch;
use crate::error::RdbmError;
use crate::filter::ParsedFilter;

/// LDAP search scope.
///
/// Accepted for interface compatibility; the relational query is built from
/// the filter alone and is not narrowed by base or scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchScope {
    Base,
    #[default]
    OneLevel,
    Subtree,
}

impl SearchScope {
    /// Parse `base`, `one`/`onelevel`, `sub`/`subtree`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "base" => Some(SearchScope::Base),
            "one" | "onelevel" | "level" => Some(SearchScope::OneLevel),
            "sub" | "subtree" => Some(SearchScope::Subtree),
            _ => None,
        }
    }
}

impl fmt::Display for SearchScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SearchScope::Base => "base",
            SearchScope::OneLevel => "one",
            SearchScope::Subtree => "sub",
        })
    }
}

/// Result of a search or raw statement.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    /// The statement ran; zero or more rows.
    Rows(Vec<EntityRow>),
    /// The statement did not run or failed; the cause was logged.
    Failed(String),
}

impl QueryOutcome {
    /// Rows, or an empty slice on failure.
    pub fn rows(&self) -> &[EntityRow] {
        match self {
            QueryOutcome::Rows(rows) => rows,
            QueryOutcome::Failed(_) => &[],
        }
    }

    /// First row, if any.
    pub fn first(&self) -> Option<&EntityRow> {
        self.rows().first()
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, QueryOutcome::Failed(_))
    }

    /// Take the rows, or `None` on failure.
    pub fn into_rows(self) -> Option<Vec<EntityRow>> {
        match self {
            QueryOutcome::Rows(rows) => Some(rows),
            QueryOutcome::Failed(_) => None,
        }
    }
}

fn failed(context: &str, err: impl fmt::Display) -> QueryOutcome {
    error!("ERROR {}: {}", context, err);
    QueryOutcome::Failed(err.to_string())
}

impl Directory {
    /// Run a restricted LDAP filter against the table its `objectClass`
    /// term names.
    ///
    /// Returns at most one row unless `fetch_many` is set.
    pub async fn search(
        &mut self,
        base: &str,
        filter: &str,
        scope: SearchScope,
        fetch_many: bool,
    ) -> QueryOutcome {
        info!(
            "Searching database for dn {} with filter {} (scope {})",
            base, filter, scope
        );

        let parsed = ParsedFilter::parse(filter);
        if parsed == ParsedFilter::Unsupported {
            warn!("Unsupported filter {}", filter);
        }
        let Some(query) = parsed.compile() else {
            return failed(
                "compiling filter",
                format!("filter {} names no objectClass", filter),
            );
        };

        let table = match self.table(&query.table).await {
            Ok(Some(table)) => table,
            Ok(None) => return failed("searching", RdbmError::UnknownTable(query.table)),
            Err(e) => return failed("reflecting tables", e),
        };

        if let Some(predicate) = query
            .predicates
            .iter()
            .find(|p| !table.has_column(&p.column))
        {
            return failed(
                "compiling filter",
                RdbmError::UnknownColumn {
                    table: table.name.clone(),
                    column: predicate.column.clone(),
                },
            );
        }

        let limit = if fetch_many { None } else { Some(1) };
        match self.store.select(&table, &query.predicates, limit).await {
            Ok(rows) => {
                debug!("Search returned {} row(s)", rows.len());
                QueryOutcome::Rows(rows)
            }
            Err(e) => failed("executing search", e),
        }
    }

    /// Pass a backend-native statement straight through.
    pub async fn exec_raw(&mut self, statement: &str, fetch: Fetch) -> QueryOutcome {
        info!("Executing {} Query: {}", self.backend(), statement);
        match self.store.execute_raw(statement, fetch).await {
            Ok(rows) => QueryOutcome::Rows(rows),
            Err(e) => failed("executing query", e),
        }
    }
}
