//! Change Applicator: apply LDIF change records to the reflected tables.
//!
//! Records are applied one at a time. A record that cannot be applied
//! (entry missing, unknown table, bad value) is logged and counted as
//! skipped; the rest of the batch still runs.

use std::fmt;
use std::path::Path;

use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};

use super::reader::read_ldif_file;
use super::record::{ChangeOperation, ChangeRecord};
use crate::core::schema::{EntityRow, TableSchema, DN_COLUMN, DOC_ID_COLUMN, OBJECT_CLASS_COLUMN};
use crate::core::value::{RdbmValue, STRUCTURED_KEY};
use crate::directory::Directory;
use crate::dn::leaf_value;
use crate::error::{RdbmError, Result};

const TOP_CLASS: &str = "top";
const CONTAINER_CLASS: &str = "organizationalUnit";

/// Options for a batch.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApplyOptions {
    /// Re-reflect the tables before the batch.
    pub force_reflect: bool,
}

/// Per-batch counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    pub created: usize,
    pub updated: usize,
    /// Records already in the requested state.
    pub unchanged: usize,
    pub skipped: usize,
}

impl ApplyReport {
    /// Total records seen.
    pub fn total(&self) -> usize {
        self.created + self.updated + self.unchanged + self.skipped
    }

    fn record(&mut self, applied: Applied) {
        match applied {
            Applied::Created => self.created += 1,
            Applied::Updated => self.updated += 1,
            Applied::Unchanged => self.unchanged += 1,
            Applied::Skipped => self.skipped += 1,
        }
    }

    fn merge(&mut self, other: ApplyReport) {
        self.created += other.created;
        self.updated += other.updated;
        self.unchanged += other.unchanged;
        self.skipped += other.skipped;
    }
}

impl fmt::Display for ApplyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} created, {} updated, {} unchanged, {} skipped",
            self.created, self.updated, self.unchanged, self.skipped
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Applied {
    Created,
    Updated,
    Unchanged,
    Skipped,
}

/// Apply `records` in order.
///
/// Only a failure to reflect the tables aborts the batch.
pub async fn apply_ldif(
    dir: &mut Directory,
    records: &[ChangeRecord],
    options: ApplyOptions,
) -> Result<ApplyReport> {
    dir.reflect(options.force_reflect).await?;

    let mut report = ApplyReport::default();
    for record in records {
        let applied = match apply_record(dir, record).await {
            Ok(applied) => applied,
            Err(e) => {
                warn!("Skipping {}: {}", record.dn, e);
                Applied::Skipped
            }
        };
        report.record(applied);
    }

    info!("Applied {} record(s): {}", report.total(), report);
    Ok(report)
}

/// Read each LDIF file in order and apply its records.
///
/// `force_reflect` only applies before the first file; later files reuse
/// the tables reflected for it.
pub async fn import_ldif_files<P: AsRef<Path>>(
    dir: &mut Directory,
    paths: &[P],
    options: ApplyOptions,
) -> Result<ApplyReport> {
    let mut total = ApplyReport::default();
    let mut options = options;

    for path in paths {
        let path = path.as_ref();
        info!("Importing ldif file {}", path.display());
        let records = read_ldif_file(path)?;
        let report = apply_ldif(dir, &records, options).await?;
        total.merge(report);
        options.force_reflect = false;
    }

    Ok(total)
}

async fn apply_record(dir: &mut Directory, record: &ChangeRecord) -> Result<Applied> {
    match record.operation() {
        ChangeOperation::Create => create_entry(dir, record).await,
        ChangeOperation::AddAttribute(attribute) => add_attribute(dir, record, &attribute).await,
        ChangeOperation::ReplaceAttribute(attribute) => {
            replace_attribute(dir, record, &attribute).await
        }
        ChangeOperation::Unsupported(kind) => {
            warn!("Unsupported change type {} for {}", kind, record.dn);
            Ok(Applied::Skipped)
        }
    }
}

/// Locate the row and its table for a modify record.
async fn locate(dir: &mut Directory, dn: &str) -> Result<Option<(EntityRow, TableSchema)>> {
    let Some(row) = dir.find_by_dn(dn).await? else {
        return Ok(None);
    };
    let table = dir
        .table(&row.table)
        .await?
        .ok_or_else(|| RdbmError::UnknownTable(row.table.clone()))?;
    Ok(Some((row, table)))
}

fn modified_values<'r>(record: &'r ChangeRecord, attribute: &str) -> Result<&'r [String]> {
    record
        .values(attribute)
        .filter(|values| !values.is_empty())
        .ok_or_else(|| RdbmError::ValueFormat {
            attribute: attribute.to_string(),
            value: String::new(),
        })
}

async fn write_column(
    dir: &mut Directory,
    table: &TableSchema,
    row: &EntityRow,
    dn: &str,
    column: &str,
    value: RdbmValue,
) -> Result<Applied> {
    if row.get(column) == Some(&value) {
        debug!("{} on {} already up to date", column, dn);
        return Ok(Applied::Unchanged);
    }
    let target = row.dn().unwrap_or(dn);
    dir.update_column(table, target, column, &value).await?;
    debug!("Updated {} on {}", column, target);
    Ok(Applied::Updated)
}

async fn add_attribute(dir: &mut Directory, record: &ChangeRecord, attribute: &str) -> Result<Applied> {
    let values = modified_values(record, attribute)?;
    let Some((row, table)) = locate(dir, &record.dn).await? else {
        warn!("Can't find current value for {}, skipping", record.dn);
        return Ok(Applied::Skipped);
    };
    let column = table.column(attribute).ok_or_else(|| RdbmError::UnknownColumn {
        table: table.name.clone(),
        column: attribute.to_string(),
    })?;

    let value = if column.is_structured() {
        let mut items: Vec<JsonValue> = row
            .get(attribute)
            .and_then(RdbmValue::structured_items)
            .cloned()
            .unwrap_or_default();
        for value in values {
            let item = JsonValue::String(value.clone());
            if !items.contains(&item) {
                items.push(item);
            }
        }
        RdbmValue::Json(serde_json::json!({ STRUCTURED_KEY: items }))
    } else {
        dir.coercer().coerce(attribute, values)?
    };

    write_column(dir, &table, &row, &record.dn, attribute, value).await
}

async fn replace_attribute(
    dir: &mut Directory,
    record: &ChangeRecord,
    attribute: &str,
) -> Result<Applied> {
    let values = modified_values(record, attribute)?;
    let value = dir.coercer().coerce(attribute, values)?;
    let Some((row, table)) = locate(dir, &record.dn).await? else {
        warn!("Can't find current value for {}, skipping", record.dn);
        return Ok(Applied::Skipped);
    };
    if !table.has_column(attribute) {
        return Err(RdbmError::UnknownColumn {
            table: table.name.clone(),
            column: attribute.to_string(),
        });
    }

    write_column(dir, &table, &row, &record.dn, attribute, value).await
}

/// The class naming the target table: the last class other than `top`.
///
/// `None` for records without classes and for bare containers.
fn target_class(record: &ChangeRecord) -> Option<String> {
    let classes: Vec<String> = record
        .object_classes()
        .into_iter()
        .filter(|c| !c.eq_ignore_ascii_case(TOP_CLASS))
        .collect();

    match classes.as_slice() {
        [] => None,
        [only] if only.eq_ignore_ascii_case(CONTAINER_CLASS) => None,
        [.., last] => Some(last.clone()),
    }
}

async fn create_entry(dir: &mut Directory, record: &ChangeRecord) -> Result<Applied> {
    let Some(class) = target_class(record) else {
        debug!("{} is not stored as a row, skipping", record.dn);
        return Ok(Applied::Skipped);
    };

    let Some(table) = dir.table(&class).await? else {
        warn!("No table for objectClass {}, skipping {}", class, record.dn);
        return Ok(Applied::Skipped);
    };

    if dir.exists_rdbm(&record.dn, &table.name).await? {
        info!("DN {} exists in {}, skipping", record.dn, dir.backend());
        return Ok(Applied::Unchanged);
    }

    let mut row = EntityRow::new(&table.name)
        .with(DN_COLUMN, record.dn.as_str())
        .with(DOC_ID_COLUMN, leaf_value(&record.dn)?)
        .with(OBJECT_CLASS_COLUMN, class.as_str());

    let coercer = dir.coercer();
    for (attribute, values) in record.data_attributes() {
        if !table.has_column(attribute) {
            debug!("{} has no column {}, dropping it", table.name, attribute);
            continue;
        }
        row.set(attribute, coercer.coerce(attribute, values)?);
    }

    for column in table.structured_columns() {
        if !row.contains(&column.name) {
            row.set(column.name.clone(), RdbmValue::empty_structured());
        }
    }

    info!("Adding {}", record.dn);
    dir.insert_row(&table, &row).await?;
    Ok(Applied::Created)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::config::Backend;
    use crate::core::schema::ColumnSchema;
    use crate::drivers::MemoryStore;
    use crate::ldif::read_ldif;
    use crate::schema::fixtures;

    const CLIENTS: &str = "\
dn: ou=clients,o=jans
objectClass: top
objectClass: organizationalUnit
ou: clients

dn: inum=1234,ou=clients,o=jans
objectClass: top
objectClass: jansClnt
inum: 1234
displayName: Test client
jansRedirectURI: https://a
jansRedirectURI: https://b
jansEnabled: true
creationDate: 20230102030405.123Z
description: not a column

dn: inum=1234,ou=clients,o=jans
changetype: modify
add: jansRedirectURI
jansRedirectURI: https://b
jansRedirectURI: https://c

dn: inum=1234,ou=clients,o=jans
changetype: modify
replace: displayName
displayName: Renamed
";

    fn store() -> MemoryStore {
        MemoryStore::new(Backend::Mysql).with_table(TableSchema::new(
            "jansClnt",
            vec![
                ColumnSchema::new(DOC_ID_COLUMN, "varchar"),
                ColumnSchema::new(OBJECT_CLASS_COLUMN, "varchar"),
                ColumnSchema::new(DN_COLUMN, "varchar"),
                ColumnSchema::new("inum", "varchar"),
                ColumnSchema::new("displayName", "varchar"),
                ColumnSchema::new("jansRedirectURI", "json"),
                ColumnSchema::new("jansScope", "json"),
                ColumnSchema::new("jansEnabled", "smallint"),
                ColumnSchema::new("creationDate", "datetime"),
            ],
        ))
    }

    fn directory(store: &MemoryStore) -> Directory {
        Directory::new(Box::new(store.clone()), Arc::new(fixtures::catalog()))
    }

    #[tokio::test]
    async fn test_apply_batch() {
        let store = store();
        let mut dir = directory(&store);
        let records = read_ldif(CLIENTS).unwrap();

        let report = apply_ldif(&mut dir, &records, ApplyOptions::default())
            .await
            .unwrap();
        assert_eq!(
            report,
            ApplyReport {
                created: 1,
                updated: 2,
                unchanged: 0,
                skipped: 1,
            }
        );

        let rows = store.rows("jansClnt");
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.doc_id(), Some("1234"));
        assert_eq!(row.object_class(), Some("jansClnt"));
        assert_eq!(row.get("displayName"), Some(&RdbmValue::from("Renamed")));
        assert_eq!(row.get("jansEnabled"), Some(&RdbmValue::Int(1)));
        assert_eq!(
            row.get("creationDate"),
            Some(&RdbmValue::from("2023-01-02 03:04:05.12"))
        );
        assert_eq!(
            row.get("jansRedirectURI").unwrap().to_json(),
            json!({"v": ["https://a", "https://b", "https://c"]})
        );
        assert_eq!(row.get("jansScope"), Some(&RdbmValue::empty_structured()));
        assert!(!row.contains("description"));
    }

    #[tokio::test]
    async fn test_reapply_is_idempotent() {
        let store = store();
        let mut dir = directory(&store);
        let records = read_ldif(CLIENTS).unwrap();

        apply_ldif(&mut dir, &records, ApplyOptions::default())
            .await
            .unwrap();
        let first = store.rows("jansClnt");

        let report = apply_ldif(&mut dir, &records, ApplyOptions::default())
            .await
            .unwrap();
        assert_eq!(report.created, 0);
        assert_eq!(report.updated, 0);
        assert_eq!(report.unchanged, 3);
        assert_eq!(store.rows("jansClnt"), first);
    }

    #[tokio::test]
    async fn test_replace_missing_entry_is_skipped() {
        let store = store();
        let mut dir = directory(&store);
        let records = vec![ChangeRecord::new("inum=9,ou=clients,o=jans")
            .with("changetype", "modify")
            .with("replace", "displayName")
            .with("displayName", "Nobody")];

        let report = apply_ldif(&mut dir, &records, ApplyOptions::default())
            .await
            .unwrap();
        assert_eq!(report.skipped, 1);
        assert_eq!(store.rows("jansClnt").len(), 0);
    }

    #[tokio::test]
    async fn test_bad_record_does_not_abort_batch() {
        let store = store();
        let mut dir = directory(&store);
        let records = vec![
            ChangeRecord::new("inum=1,ou=clients,o=jans")
                .with("objectClass", "noSuchTable"),
            ChangeRecord::new("inum=2,ou=clients,o=jans")
                .with("objectClass", "jansClnt")
                .with("creationDate", "x")
                .with("jansEnabled", "yes"),
            ChangeRecord::new("inum=3,ou=clients,o=jans").with("changetype", "delete"),
            ChangeRecord::new("inum=4,ou=clients,o=jans")
                .with("objectClass", "jansClnt")
                .with("displayName", "Four"),
        ];

        let report = apply_ldif(&mut dir, &records, ApplyOptions::default())
            .await
            .unwrap();
        assert_eq!(report.skipped, 2);
        assert_eq!(report.created, 2);
        assert_eq!(store.rows("jansClnt").len(), 2);
    }

    #[tokio::test]
    async fn test_import_files() {
        let store = store();
        let mut dir = directory(&store);
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("clients.ldif");
        std::fs::write(&path, CLIENTS).unwrap();

        let report = import_ldif_files(
            &mut dir,
            &[&path, &path],
            ApplyOptions { force_reflect: true },
        )
        .await
        .unwrap();
        assert_eq!(report.created, 1);
        assert_eq!(report.total(), 8);
        assert_eq!(store.rows("jansClnt").len(), 1);
    }

    #[test]
    fn test_target_class() {
        let client = ChangeRecord::new("inum=1,o=jans")
            .with("objectClass", "top")
            .with("objectClass", "jansClnt");
        assert_eq!(target_class(&client).as_deref(), Some("jansClnt"));

        let container = ChangeRecord::new("ou=clients,o=jans")
            .with("objectClass", "top")
            .with("objectClass", "organizationalunit");
        assert_eq!(target_class(&container), None);

        assert_eq!(target_class(&ChangeRecord::new("o=jans")), None);
    }
}
