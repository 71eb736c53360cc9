//! Distinguished-name resolution.

use tracing::{debug, error, info};

use super::Directory;
use crate::core::schema::{EntityRow, TableSchema, DN_COLUMN};
use crate::core::traits::Predicate;
use crate::error::Result;

impl Directory {
    /// Resolve `dn` to its row.
    ///
    /// Searches every table for an exact `dn` match first, then retries with
    /// a suffix match (`dn LIKE '%<dn>'`). The first hit wins; table order
    /// is by name. A table whose query fails is logged and skipped. A blank
    /// `dn` names nothing.
    pub async fn find_by_dn(&mut self, dn: &str) -> Result<Option<EntityRow>> {
        if dn.trim().is_empty() {
            debug!("Empty dn matches no entry");
            return Ok(None);
        }

        let tables: Vec<TableSchema> = self
            .tables()
            .await?
            .values()
            .filter(|t| t.has_column(DN_COLUMN))
            .cloned()
            .collect();

        let exact = [Predicate::equals(DN_COLUMN, dn)];
        let suffix = [Predicate::like(DN_COLUMN, format!("%{}", dn))];

        for predicates in [&exact, &suffix] {
            for table in &tables {
                match self.store.select(table, predicates, Some(1)).await {
                    Ok(mut rows) if !rows.is_empty() => {
                        debug!("Found {} in {}", dn, table.name);
                        return Ok(Some(rows.remove(0)));
                    }
                    Ok(_) => {}
                    Err(e) => error!("Looking up {} in {} failed: {}", dn, table.name, e),
                }
            }
        }

        Ok(None)
    }

    /// Whether `table` already holds a row with this exact `dn`.
    ///
    /// An unknown table holds nothing.
    pub async fn exists_rdbm(&mut self, dn: &str, table: &str) -> Result<bool> {
        debug!("Checking dn {} exists in table {}", dn, table);
        let Some(schema) = self.table(table).await? else {
            return Ok(false);
        };
        let rows = self
            .store
            .select(&schema, &[Predicate::equals(DN_COLUMN, dn)], Some(1))
            .await?;
        Ok(!rows.is_empty())
    }

    /// Logged, infallible variant of [`find_by_dn`](Self::find_by_dn).
    pub async fn dn_exists(&mut self, dn: &str) -> Option<EntityRow> {
        info!("Querying RDBM for dn {}", dn);
        match self.find_by_dn(dn).await {
            Ok(found) => found,
            Err(e) => {
                error!("Querying dn {} failed: {}", dn, e);
                None
            }
        }
    }
}
