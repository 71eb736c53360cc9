//! Helpers for the configuration entries the installer edits.

use serde_json::{json, Map, Value as JsonValue};
use tracing::info;

use super::Directory;
use crate::core::value::{RdbmValue, STRUCTURED_KEY};
use crate::error::{RdbmError, Result};

/// Entry holding the authentication server's configuration.
pub const AUTH_CONFIG_DN: &str = "ou=jans-auth,ou=configuration,o=jans";

/// Global configuration entry (service flags and component settings).
pub const CONFIGURATION_DN: &str = "ou=configuration,o=jans";

const AUTH_DYNAMIC_COLUMN: &str = "jansConfDyn";
const SCRIPT_ENABLED_COLUMN: &str = "jansEnabled";
const SCRIPT_PROPERTY_COLUMN: &str = "jansConfProperty";
const ALLOWED_CLIENTS: &str = "allowed_clients";

fn script_dn(inum: &str) -> String {
    format!("inum={},ou=scripts,o=jans", inum)
}

/// Append `client_id` to a comma-separated list unless already listed.
fn add_to_list(list: &str, client_id: &str) -> String {
    let mut items: Vec<&str> = list
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    if !items.contains(&client_id) {
        items.push(client_id);
    }
    items.join(",")
}

/// Add `client_id` to the `allowed_clients` property of a property list.
///
/// Properties may be stored as objects or as JSON-encoded strings; the
/// matching property keeps its original form.
fn merge_allowed_client(container: &mut Vec<JsonValue>, client_id: &str) {
    for item in container.iter_mut() {
        let (mut property, encoded) = match item {
            JsonValue::Object(map) => (map.clone(), false),
            JsonValue::String(s) => match serde_json::from_str::<Map<String, JsonValue>>(s) {
                Ok(map) => (map, true),
                Err(_) => continue,
            },
            _ => continue,
        };
        if property.get("value1").and_then(JsonValue::as_str) != Some(ALLOWED_CLIENTS) {
            continue;
        }

        let current = property
            .get("value2")
            .and_then(JsonValue::as_str)
            .unwrap_or_default();
        property.insert("value2".into(), JsonValue::String(add_to_list(current, client_id)));

        let property = JsonValue::Object(property);
        *item = if encoded {
            JsonValue::String(property.to_string())
        } else {
            property
        };
        return;
    }

    container.push(json!({"value1": ALLOWED_CLIENTS, "value2": client_id}));
}

impl Directory {
    /// The authentication server's dynamic configuration document.
    pub async fn auth_dynamic_config(&mut self) -> Result<JsonValue> {
        let row = self
            .find_by_dn(AUTH_CONFIG_DN)
            .await?
            .ok_or_else(|| RdbmError::EntryNotFound(AUTH_CONFIG_DN.to_string()))?;

        match row.get(AUTH_DYNAMIC_COLUMN) {
            Some(RdbmValue::Text(text)) => Ok(serde_json::from_str(text)?),
            Some(RdbmValue::Json(doc)) => Ok(doc.clone()),
            _ => Err(RdbmError::UnknownColumn {
                table: row.table.clone(),
                column: AUTH_DYNAMIC_COLUMN.to_string(),
            }),
        }
    }

    /// Merge `entries` into the dynamic configuration and store it back.
    pub async fn update_auth_dynamic_config(&mut self, entries: &Map<String, JsonValue>) -> Result<()> {
        let mut document = self.auth_dynamic_config().await?;
        if let JsonValue::Object(map) = &mut document {
            for (key, value) in entries {
                map.insert(key.clone(), value.clone());
            }
        }

        let text = serde_json::to_string_pretty(&document)?;
        info!("Updating {} on {}", AUTH_DYNAMIC_COLUMN, AUTH_CONFIG_DN);
        self.set_attribute(AUTH_CONFIG_DN, AUTH_DYNAMIC_COLUMN, RdbmValue::Text(text))
            .await
    }

    /// Mark the custom script `inum` enabled.
    pub async fn enable_script(&mut self, inum: &str) -> Result<()> {
        info!("Enabling script {}", inum);
        self.set_attribute(&script_dn(inum), SCRIPT_ENABLED_COLUMN, RdbmValue::Int(1))
            .await
    }

    /// Set a service flag on the global configuration entry.
    pub async fn enable_service(&mut self, service: &str) -> Result<()> {
        info!("Enabling service {}", service);
        self.set_configuration(service, RdbmValue::Int(1)).await
    }

    /// Set one column on the global configuration entry.
    pub async fn set_configuration(&mut self, component: &str, value: RdbmValue) -> Result<()> {
        self.set_attribute(CONFIGURATION_DN, component, value).await
    }

    /// Allow `client_id` to use the custom script `script_inum`.
    ///
    /// Adds the client to the script's `allowed_clients` property, creating
    /// the property if needed. Adding the same client twice is a no-op.
    pub async fn add_client_to_script(&mut self, script_inum: &str, client_id: &str) -> Result<()> {
        let dn = script_dn(script_inum);
        let row = self
            .find_by_dn(&dn)
            .await?
            .ok_or_else(|| RdbmError::EntryNotFound(dn.clone()))?;

        let mut container = row
            .get(SCRIPT_PROPERTY_COLUMN)
            .and_then(RdbmValue::structured_items)
            .cloned()
            .unwrap_or_default();
        merge_allowed_client(&mut container, client_id);

        info!("Adding client {} to script {}", client_id, script_inum);
        self.set_attribute(
            &dn,
            SCRIPT_PROPERTY_COLUMN,
            RdbmValue::Json(json!({ STRUCTURED_KEY: container })),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::Backend;
    use crate::core::schema::{ColumnSchema, EntityRow, TableSchema, DN_COLUMN};
    use crate::drivers::MemoryStore;
    use crate::schema::fixtures;

    const SCRIPT_INUM: &str = "A51E-76DA";

    fn store() -> MemoryStore {
        MemoryStore::new(Backend::Mysql)
            .with_table(TableSchema::new(
                "jansAppConf",
                vec![
                    ColumnSchema::new(DN_COLUMN, "varchar"),
                    ColumnSchema::new(AUTH_DYNAMIC_COLUMN, "text"),
                ],
            ))
            .with_table(TableSchema::new(
                "jansCustomScr",
                vec![
                    ColumnSchema::new(DN_COLUMN, "varchar"),
                    ColumnSchema::new(SCRIPT_ENABLED_COLUMN, "smallint"),
                    ColumnSchema::new(SCRIPT_PROPERTY_COLUMN, "json"),
                ],
            ))
            .with_table(TableSchema::new(
                "jansAppConfiguration",
                vec![
                    ColumnSchema::new(DN_COLUMN, "varchar"),
                    ColumnSchema::new("jansScimEnabled", "smallint"),
                ],
            ))
            .with_row(
                EntityRow::new("jansAppConf")
                    .with(DN_COLUMN, AUTH_CONFIG_DN)
                    .with(AUTH_DYNAMIC_COLUMN, r#"{"issuer": "https://old"}"#),
            )
            .with_row(
                EntityRow::new("jansCustomScr")
                    .with(DN_COLUMN, script_dn(SCRIPT_INUM))
                    .with(SCRIPT_ENABLED_COLUMN, RdbmValue::Int(0))
                    .with(SCRIPT_PROPERTY_COLUMN, RdbmValue::Null),
            )
            .with_row(EntityRow::new("jansAppConfiguration").with(DN_COLUMN, CONFIGURATION_DN))
    }

    fn directory(store: &MemoryStore) -> Directory {
        Directory::new(Box::new(store.clone()), Arc::new(fixtures::catalog()))
    }

    #[tokio::test]
    async fn test_update_auth_dynamic_config() {
        let store = store();
        let mut dir = directory(&store);

        let mut entries = Map::new();
        entries.insert("issuer".into(), json!("https://new"));
        entries.insert("dcrSignatureValidation".into(), json!(true));
        dir.update_auth_dynamic_config(&entries).await.unwrap();

        let document = dir.auth_dynamic_config().await.unwrap();
        assert_eq!(document["issuer"], "https://new");
        assert_eq!(document["dcrSignatureValidation"], true);
    }

    #[tokio::test]
    async fn test_enable_script_and_service() {
        let store = store();
        let mut dir = directory(&store);

        dir.enable_script(SCRIPT_INUM).await.unwrap();
        dir.enable_service("jansScimEnabled").await.unwrap();

        assert_eq!(
            store.rows("jansCustomScr")[0].get(SCRIPT_ENABLED_COLUMN),
            Some(&RdbmValue::Int(1))
        );
        assert_eq!(
            store.rows("jansAppConfiguration")[0].get("jansScimEnabled"),
            Some(&RdbmValue::Int(1))
        );
    }

    #[tokio::test]
    async fn test_set_configuration_unknown_column() {
        let store = store();
        let mut dir = directory(&store);
        let err = dir
            .set_configuration("noSuchFlag", RdbmValue::Int(1))
            .await
            .unwrap_err();
        assert!(matches!(err, RdbmError::UnknownColumn { .. }));
    }

    #[tokio::test]
    async fn test_add_client_to_script_is_idempotent() {
        let store = store();
        let mut dir = directory(&store);

        dir.add_client_to_script(SCRIPT_INUM, "client-1").await.unwrap();
        dir.add_client_to_script(SCRIPT_INUM, "client-1").await.unwrap();
        dir.add_client_to_script(SCRIPT_INUM, "client-2").await.unwrap();

        let row = &store.rows("jansCustomScr")[0];
        assert_eq!(
            row.get(SCRIPT_PROPERTY_COLUMN).unwrap().to_json(),
            json!({"v": [{"value1": "allowed_clients", "value2": "client-1,client-2"}]})
        );
    }

    #[test]
    fn test_merge_allowed_client_keeps_encoded_form() {
        let mut container = vec![
            json!(r#"{"value1": "other", "value2": "x"}"#),
            json!(r#"{"value1": "allowed_clients", "value2": "a, b"}"#),
        ];
        merge_allowed_client(&mut container, "c");

        let encoded = container[1].as_str().unwrap();
        let decoded: JsonValue = serde_json::from_str(encoded).unwrap();
        assert_eq!(decoded["value2"], "a,b,c");
        assert_eq!(container.len(), 2);
    }

    #[test]
    fn test_add_to_list() {
        assert_eq!(add_to_list("", "a"), "a");
        assert_eq!(add_to_list("a, b", "a"), "a,b");
        assert_eq!(add_to_list("a,,b", "c"), "a,b,c");
    }
}
