//! Directory-style operations over the relational store.
//!
//! [`Directory`] owns the session handle and the schema catalog, and caches
//! reflected tables. Operations are grouped by concern:
//!
//! - [`reflector`]: table discovery (`reflect`, `table_exists`)
//! - [`locator`]: DN resolution (`find_by_dn`, `exists_rdbm`, `dn_exists`)
//! - [`search`]: filter queries and raw statements
//! - [`config_ops`]: helpers for the configuration entries the installer edits
//!
//! Every call runs to completion before the next one starts; the session is
//! never shared.

mod config_ops;
mod locator;
mod reflector;
mod search;

pub use config_ops::{AUTH_CONFIG_DN, CONFIGURATION_DN};
pub use search::{QueryOutcome, SearchScope};

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::coerce::TypeCoercer;
use crate::config::{Backend, Config};
use crate::core::schema::{EntityRow, TableSchema};
use crate::core::traits::RdbmStore;
use crate::core::value::RdbmValue;
use crate::drivers;
use crate::error::{RdbmError, Result};
use crate::schema::SchemaCatalog;

/// Session handle plus schema state.
pub struct Directory {
    store: Box<dyn RdbmStore>,
    catalog: Arc<SchemaCatalog>,
    tables: Option<BTreeMap<String, TableSchema>>,
}

impl Directory {
    /// Wrap an open session.
    pub fn new(store: Box<dyn RdbmStore>, catalog: Arc<SchemaCatalog>) -> Self {
        Self {
            store,
            catalog,
            tables: None,
        }
    }

    /// Load the schema catalog and connect, as configured.
    pub async fn open(config: &Config) -> Result<Self> {
        let catalog = Arc::new(SchemaCatalog::from_config(&config.schema)?);
        let store = drivers::connect(&config.rdbm).await?;
        Ok(Self::new(store, catalog))
    }

    /// Backend of the underlying session.
    pub fn backend(&self) -> Backend {
        self.store.backend()
    }

    /// The schema catalog.
    pub fn catalog(&self) -> &SchemaCatalog {
        &self.catalog
    }

    /// Coercer bound to this session's backend.
    pub fn coercer(&self) -> TypeCoercer<'_> {
        TypeCoercer::new(&self.catalog, self.store.backend())
    }

    /// Round trip to the database.
    pub async fn ping(&mut self) -> Result<()> {
        self.store.ping().await
    }

    /// Insert a row into a reflected table.
    pub async fn insert_row(&mut self, table: &TableSchema, row: &EntityRow) -> Result<()> {
        self.store.insert(table, row).await
    }

    /// Set one column on the row with exactly this `dn` in `table`.
    pub async fn update_column(
        &mut self,
        table: &TableSchema,
        dn: &str,
        column: &str,
        value: &RdbmValue,
    ) -> Result<u64> {
        self.store.update(table, dn, column, value).await
    }

    /// Set one column on the entry at `dn`.
    ///
    /// Fails if the entry does not exist or its table has no such column.
    pub async fn set_attribute(&mut self, dn: &str, column: &str, value: RdbmValue) -> Result<()> {
        let row = self
            .find_by_dn(dn)
            .await?
            .ok_or_else(|| RdbmError::EntryNotFound(dn.to_string()))?;
        let table = self
            .table(&row.table)
            .await?
            .ok_or_else(|| RdbmError::UnknownTable(row.table.clone()))?;
        if !table.has_column(column) {
            return Err(RdbmError::UnknownColumn {
                table: table.name.clone(),
                column: column.to_string(),
            });
        }

        // Suffix matches resolve to the stored DN, not the one asked for.
        let target = row.dn().unwrap_or(dn).to_string();
        let affected = self.update_column(&table, &target, column, &value).await?;
        debug!("Set {} on {} ({} row(s))", column, target, affected);
        Ok(())
    }
}
