//! Table discovery and caching.

use std::collections::BTreeMap;

use tracing::{debug, info};

use super::Directory;
use crate::core::schema::TableSchema;
use crate::error::Result;

impl Directory {
    /// Discover every table on first use, or again when `forced`.
    ///
    /// Later calls without `forced` reuse the cache.
    pub async fn reflect(&mut self, forced: bool) -> Result<()> {
        if self.tables.is_some() && !forced {
            return Ok(());
        }

        info!("Reflecting database tables");
        let tables: BTreeMap<String, TableSchema> = self
            .store
            .reflect_tables()
            .await?
            .into_iter()
            .map(|t| (t.name.clone(), t))
            .collect();
        info!("Reflected {} tables", tables.len());

        self.tables = Some(tables);
        Ok(())
    }

    /// Reflected tables by name, reflecting first if needed.
    pub async fn tables(&mut self) -> Result<&BTreeMap<String, TableSchema>> {
        self.reflect(false).await?;
        Ok(self.tables.get_or_insert_with(BTreeMap::new))
    }

    /// One reflected table, if it exists.
    pub async fn table(&mut self, name: &str) -> Result<Option<TableSchema>> {
        Ok(self.tables().await?.get(name).cloned())
    }

    /// Whether `name` exists.
    ///
    /// Checks the cache first, then asks the database directly so tables
    /// created after the first reflection are picked up. Never fails: any
    /// error during the lookup counts as "absent".
    pub async fn table_exists(&mut self, name: &str) -> bool {
        if let Some(tables) = &self.tables {
            if tables.contains_key(name) {
                return true;
            }
        }

        match self.store.reflect_tables().await {
            Ok(found) => match found.into_iter().find(|t| t.name == name) {
                Some(table) => {
                    if let Some(tables) = self.tables.as_mut() {
                        tables.insert(table.name.clone(), table);
                    }
                    true
                }
                None => false,
            },
            Err(e) => {
                debug!("Table lookup for {} failed: {}", name, e);
                false
            }
        }
    }
}
