//! In-memory store for dry runs and tests.
//!
//! Behaves like a relational backend for the operations the directory layer
//! issues: unknown tables and columns are errors, `dn` is unique across the
//! whole store, and LIKE patterns support `%` and `_`. Raw statements are
//! not understood and always fail. [`MemoryStore::set_unreachable`] makes
//! `ping` and table discovery fail like a dropped connection.
//!
//! The store is a cheap handle: clones share the same data, so a test can
//! hand one clone to a [`Directory`](crate::directory::Directory) and
//! inspect the other.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::debug;

use crate::config::Backend;
use crate::core::schema::{EntityRow, TableSchema, DN_COLUMN};
use crate::core::traits::{Fetch, MatchOp, Predicate, RdbmStore};
use crate::core::value::RdbmValue;
use crate::error::{RdbmError, Result};

#[derive(Debug, Default)]
struct MemoryTable {
    schema: Option<TableSchema>,
    rows: Vec<EntityRow>,
}

/// Shared-handle in-memory store.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    backend: Backend,
    tables: Arc<Mutex<BTreeMap<String, MemoryTable>>>,
    unreachable: Arc<AtomicBool>,
}

impl MemoryStore {
    /// Create an empty store that reports `backend`.
    pub fn new(backend: Backend) -> Self {
        Self {
            backend,
            tables: Arc::new(Mutex::new(BTreeMap::new())),
            unreachable: Arc::new(AtomicBool::new(false)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, MemoryTable>> {
        // A poisoned lock only means a test panicked mid-operation.
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register a table.
    pub fn with_table(self, table: TableSchema) -> Self {
        let name = table.name.clone();
        self.lock().entry(name).or_default().schema = Some(table);
        self
    }

    /// Seed a row without any checks.
    pub fn with_row(self, row: EntityRow) -> Self {
        self.lock().entry(row.table.clone()).or_default().rows.push(row);
        self
    }

    /// Rows currently stored in `table`.
    pub fn rows(&self, table: &str) -> Vec<EntityRow> {
        self.lock()
            .get(table)
            .map(|t| t.rows.clone())
            .unwrap_or_default()
    }

    /// Make `ping` and `reflect_tables` fail on every handle of this store.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    fn check_reachable(&self, context: &str) -> Result<()> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(RdbmError::connection("server has gone away", context));
        }
        Ok(())
    }

    /// Total number of rows across all tables.
    pub fn row_count(&self) -> usize {
        self.lock().values().map(|t| t.rows.len()).sum()
    }
}

fn check_column(table: &TableSchema, column: &str) -> Result<()> {
    if table.has_column(column) {
        Ok(())
    } else {
        Err(RdbmError::UnknownColumn {
            table: table.name.clone(),
            column: column.to_string(),
        })
    }
}

fn value_text(value: Option<&RdbmValue>) -> Option<String> {
    match value {
        None | Some(RdbmValue::Null) => None,
        Some(v) => Some(v.to_string()),
    }
}

fn matches(row: &EntityRow, predicate: &Predicate) -> bool {
    let Some(actual) = value_text(row.get(&predicate.column)) else {
        return false;
    };
    let expected = predicate.value.to_string();
    match predicate.op {
        MatchOp::Equals => actual == expected,
        MatchOp::Like => like_match(&actual, &expected),
    }
}

/// SQL LIKE with `%` (any run) and `_` (one character).
pub(crate) fn like_match(text: &str, pattern: &str) -> bool {
    fn go(text: &[char], pattern: &[char]) -> bool {
        match pattern.split_first() {
            None => text.is_empty(),
            Some(('%', rest)) => (0..=text.len()).any(|i| go(&text[i..], rest)),
            Some(('_', rest)) => !text.is_empty() && go(&text[1..], rest),
            Some((c, rest)) => text.first() == Some(c) && go(&text[1..], rest),
        }
    }
    let text: Vec<char> = text.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();
    go(&text, &pattern)
}

#[async_trait]
impl RdbmStore for MemoryStore {
    fn backend(&self) -> Backend {
        self.backend
    }

    async fn ping(&mut self) -> Result<()> {
        self.check_reachable("ping")
    }

    async fn reflect_tables(&mut self) -> Result<Vec<TableSchema>> {
        self.check_reachable("reflecting tables")?;
        Ok(self
            .lock()
            .values()
            .filter_map(|t| t.schema.clone())
            .collect())
    }

    async fn select(
        &mut self,
        table: &TableSchema,
        predicates: &[Predicate],
        limit: Option<usize>,
    ) -> Result<Vec<EntityRow>> {
        for predicate in predicates {
            check_column(table, &predicate.column)?;
        }
        let tables = self.lock();
        let stored = tables
            .get(&table.name)
            .ok_or_else(|| RdbmError::UnknownTable(table.name.clone()))?;

        let found = stored
            .rows
            .iter()
            .filter(|row| predicates.iter().all(|p| matches(row, p)))
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect();
        Ok(found)
    }

    async fn insert(&mut self, table: &TableSchema, row: &EntityRow) -> Result<()> {
        for column in row.values.keys() {
            check_column(table, column)?;
        }
        let mut tables = self.lock();

        if let Some(dn) = row.dn() {
            let duplicate = tables
                .values()
                .flat_map(|t| t.rows.iter())
                .any(|r| r.dn() == Some(dn));
            if duplicate {
                return Err(RdbmError::query(
                    format!("Duplicate entry '{}' for key 'dn'", dn),
                    format!("inserting into {}", table.name),
                ));
            }
        }

        let stored = tables
            .get_mut(&table.name)
            .ok_or_else(|| RdbmError::UnknownTable(table.name.clone()))?;
        let mut row = row.clone();
        row.table = table.name.clone();
        debug!("memory: insert {:?} into {}", row.dn(), table.name);
        stored.rows.push(row);
        Ok(())
    }

    async fn update(
        &mut self,
        table: &TableSchema,
        dn: &str,
        column: &str,
        value: &RdbmValue,
    ) -> Result<u64> {
        check_column(table, column)?;
        let mut tables = self.lock();
        let stored = tables
            .get_mut(&table.name)
            .ok_or_else(|| RdbmError::UnknownTable(table.name.clone()))?;

        let mut affected = 0;
        for row in stored.rows.iter_mut().filter(|r| r.dn() == Some(dn)) {
            row.set(column, value.clone());
            affected += 1;
        }
        Ok(affected)
    }

    async fn execute_raw(&mut self, statement: &str, _fetch: Fetch) -> Result<Vec<EntityRow>> {
        Err(RdbmError::query(
            format!("raw statements are not supported in memory: {}", statement),
            "executing raw statement",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::ColumnSchema;

    fn clients() -> TableSchema {
        TableSchema::new(
            "jansClnt",
            vec![
                ColumnSchema::new(DN_COLUMN, "varchar"),
                ColumnSchema::new("displayName", "varchar"),
            ],
        )
    }

    #[tokio::test]
    async fn test_unreachable_store_fails_discovery() {
        let store = MemoryStore::new(Backend::Mysql).with_table(clients());
        let mut handle = store.clone();
        store.set_unreachable(true);

        assert!(matches!(handle.ping().await, Err(RdbmError::Connection { .. })));
        assert!(handle.reflect_tables().await.is_err());

        store.set_unreachable(false);
        assert_eq!(handle.reflect_tables().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_with_table_registers_schema() {
        let mut store = MemoryStore::new(Backend::Mysql)
            .with_row(EntityRow::new("jansClnt").with(DN_COLUMN, "inum=1,o=jans"))
            .with_table(clients());

        let tables = store.reflect_tables().await.unwrap();
        assert_eq!(tables, vec![clients()]);
        assert_eq!(store.rows("jansClnt").len(), 1);
    }

    #[test]
    fn test_like_match() {
        assert!(like_match("Test client", "Test%"));
        assert!(like_match("Test", "Test%"));
        assert!(like_match("abc", "a_c"));
        assert!(like_match("inum=1,ou=clients,o=jans", "%ou=clients,o=jans"));
        assert!(!like_match("My Test", "Test%"));
        assert!(!like_match("ab", "a_c"));
    }

    #[tokio::test]
    async fn test_insert_select_update() {
        let mut store = MemoryStore::new(Backend::Mysql).with_table(clients());
        let row = EntityRow::new("jansClnt")
            .with(DN_COLUMN, "inum=1,o=jans")
            .with("displayName", "Test one");
        store.insert(&clients(), &row).await.unwrap();

        let found = store
            .select(&clients(), &[Predicate::like("displayName", "Test%")], None)
            .await
            .unwrap();
        assert_eq!(found.len(), 1);

        let affected = store
            .update(&clients(), "inum=1,o=jans", "displayName", &"Renamed".into())
            .await
            .unwrap();
        assert_eq!(affected, 1);
        assert_eq!(
            store.rows("jansClnt")[0].get("displayName"),
            Some(&RdbmValue::from("Renamed"))
        );
    }

    #[tokio::test]
    async fn test_duplicate_dn_rejected() {
        let mut store = MemoryStore::new(Backend::Mysql).with_table(clients());
        let row = EntityRow::new("jansClnt").with(DN_COLUMN, "inum=1,o=jans");
        store.insert(&clients(), &row).await.unwrap();
        assert!(store.insert(&clients(), &row).await.is_err());
        assert_eq!(store.row_count(), 1);
    }

    #[tokio::test]
    async fn test_unknown_column_rejected() {
        let mut store = MemoryStore::new(Backend::Mysql).with_table(clients());
        let err = store
            .select(&clients(), &[Predicate::equals("nope", "x")], None)
            .await
            .unwrap_err();
        assert!(matches!(err, RdbmError::UnknownColumn { .. }));
    }

    #[tokio::test]
    async fn test_raw_statements_fail() {
        let mut store = MemoryStore::new(Backend::Pgsql);
        assert!(store.execute_raw("SELECT 1", Fetch::All).await.is_err());
    }
}
