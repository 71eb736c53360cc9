//! MySQL/MariaDB session.
//!
//! Holds exactly one `MySqlConnection`; statements run under autocommit so
//! every mutation is committed on its own.

use async_trait::async_trait;
use sqlx::mysql::{MySqlArguments, MySqlConnectOptions, MySqlConnection, MySqlRow};
use sqlx::query::Query;
use sqlx::{Column, ConnectOptions, Connection, MySql, Row, TypeInfo, ValueRef};
use serde_json::Value as JsonValue;
use tracing::{debug, info};

use super::dialect::MysqlDialect;
use crate::config::{Backend, RdbmConfig};
use crate::core::schema::{EntityRow, TableSchema};
use crate::core::traits::{Dialect, Fetch, Predicate, RdbmStore};
use crate::core::value::RdbmValue;
use crate::error::{RdbmError, Result};

const REFLECT_QUERY: &str = r#"
    SELECT
        CAST(TABLE_NAME AS CHAR(255)) AS TABLE_NAME,
        CAST(COLUMN_NAME AS CHAR(255)) AS COLUMN_NAME,
        CAST(DATA_TYPE AS CHAR(255)) AS DATA_TYPE
    FROM INFORMATION_SCHEMA.COLUMNS
    WHERE TABLE_SCHEMA = DATABASE()
    ORDER BY TABLE_NAME, ORDINAL_POSITION
"#;

/// Single-session MySQL store.
pub struct MysqlStore {
    conn: MySqlConnection,
    dialect: MysqlDialect,
}

impl MysqlStore {
    /// Open the session described by `config` and ping it.
    pub async fn connect(config: &RdbmConfig) -> Result<Self> {
        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port())
            .database(&config.database)
            .username(&config.user)
            .password(&config.password)
            .charset("utf8mb4");

        let mut conn = options
            .connect()
            .await
            .map_err(|e| RdbmError::connection(e, "opening MySQL session"))?;

        sqlx::query("SELECT 1")
            .execute(&mut conn)
            .await
            .map_err(|e| RdbmError::connection(e, "testing MySQL session"))?;

        info!("Connected to {}", config.redacted_connection_string());

        Ok(Self {
            conn,
            dialect: MysqlDialect::new(),
        })
    }
}

#[async_trait]
impl RdbmStore for MysqlStore {
    fn backend(&self) -> Backend {
        Backend::Mysql
    }

    async fn ping(&mut self) -> Result<()> {
        self.conn
            .ping()
            .await
            .map_err(|e| RdbmError::connection(e, "pinging MySQL session"))
    }

    async fn reflect_tables(&mut self) -> Result<Vec<TableSchema>> {
        let rows: Vec<MySqlRow> = sqlx::query(REFLECT_QUERY)
            .fetch_all(&mut self.conn)
            .await
            .map_err(|e| RdbmError::query(e, "reflecting MySQL tables"))?;

        let triples = rows
            .iter()
            .map(|row| -> std::result::Result<(String, String, String), sqlx::Error> {
                Ok((
                    row.try_get::<String, _>("TABLE_NAME")?,
                    row.try_get::<String, _>("COLUMN_NAME")?,
                    row.try_get::<String, _>("DATA_TYPE")?,
                ))
            })
            .collect::<std::result::Result<Vec<_>, sqlx::Error>>()
            .map_err(|e| RdbmError::query(e, "reading MySQL column metadata"))?;
        Ok(TableSchema::group_columns(triples))
    }

    async fn select(
        &mut self,
        table: &TableSchema,
        predicates: &[Predicate],
        limit: Option<usize>,
    ) -> Result<Vec<EntityRow>> {
        let sql = self.dialect.build_select(table, predicates, limit)?;
        debug!("{}", sql);

        let mut query = sqlx::query(&sql);
        for predicate in predicates {
            query = bind_value(query, &predicate.value);
        }
        let rows = query
            .fetch_all(&mut self.conn)
            .await
            .map_err(|e| RdbmError::query(e, format!("selecting from {}", table.name)))?;

        Ok(rows.iter().map(|r| decode_row(&table.name, r)).collect())
    }

    async fn insert(&mut self, table: &TableSchema, row: &EntityRow) -> Result<()> {
        let sql = self.dialect.build_insert(table, row)?;
        debug!("{}", sql);

        let mut query = sqlx::query(&sql);
        for value in row.values.values() {
            query = bind_value(query, value);
        }
        query
            .execute(&mut self.conn)
            .await
            .map_err(|e| RdbmError::query(e, format!("inserting into {}", table.name)))?;
        Ok(())
    }

    async fn update(
        &mut self,
        table: &TableSchema,
        dn: &str,
        column: &str,
        value: &RdbmValue,
    ) -> Result<u64> {
        let sql = self.dialect.build_update(table, column)?;
        debug!("{}", sql);

        let result = bind_value(sqlx::query(&sql), value)
            .bind(dn)
            .execute(&mut self.conn)
            .await
            .map_err(|e| RdbmError::query(e, format!("updating {}.{}", table.name, column)))?;
        Ok(result.rows_affected())
    }

    async fn execute_raw(&mut self, statement: &str, fetch: Fetch) -> Result<Vec<EntityRow>> {
        debug!("{}", statement);
        let query = sqlx::query(statement);
        let rows = match fetch {
            Fetch::None => {
                query
                    .execute(&mut self.conn)
                    .await
                    .map_err(|e| RdbmError::query(e, "executing raw statement"))?;
                Vec::new()
            }
            Fetch::One => query
                .fetch_optional(&mut self.conn)
                .await
                .map_err(|e| RdbmError::query(e, "executing raw statement"))?
                .into_iter()
                .collect(),
            Fetch::All => query
                .fetch_all(&mut self.conn)
                .await
                .map_err(|e| RdbmError::query(e, "executing raw statement"))?,
        };
        Ok(rows.iter().map(|r| decode_row("", r)).collect())
    }
}

fn bind_value<'q>(
    query: Query<'q, MySql, MySqlArguments>,
    value: &'q RdbmValue,
) -> Query<'q, MySql, MySqlArguments> {
    match value {
        RdbmValue::Null => query.bind(None::<String>),
        RdbmValue::Int(v) => query.bind(*v),
        RdbmValue::Text(s) => query.bind(s.as_str()),
        RdbmValue::Json(v) => query.bind(sqlx::types::Json(v)),
    }
}

fn decode_row(table: &str, row: &MySqlRow) -> EntityRow {
    let mut entity = EntityRow::new(table);
    for (idx, column) in row.columns().iter().enumerate() {
        entity.set(column.name(), decode_value(row, idx, column.type_info().name()));
    }
    entity
}

/// Convert one column of a MySQL row by its wire type name.
fn decode_value(row: &MySqlRow, idx: usize, type_name: &str) -> RdbmValue {
    let is_null: bool = row.try_get_raw(idx).map(|r| r.is_null()).unwrap_or(true);
    if is_null {
        return RdbmValue::Null;
    }

    let upper = type_name.to_uppercase();
    let decoded = match upper.trim_end_matches(" UNSIGNED") {
        "BOOLEAN" => row.try_get::<bool, _>(idx).map(|v| RdbmValue::Int(i64::from(v))),
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => row
            .try_get::<i64, _>(idx)
            .or_else(|_| row.try_get::<u64, _>(idx).map(|v| v as i64))
            .map(RdbmValue::Int),
        "JSON" => row.try_get::<JsonValue, _>(idx).map(RdbmValue::Json),
        "DATETIME" | "TIMESTAMP" => row
            .try_get::<chrono::NaiveDateTime, _>(idx)
            .map(|v| RdbmValue::Text(v.format("%Y-%m-%d %H:%M:%S%.f").to_string())),
        "DATE" => row
            .try_get::<chrono::NaiveDate, _>(idx)
            .map(|v| RdbmValue::Text(v.to_string())),
        _ => row.try_get::<String, _>(idx).map(RdbmValue::Text).or_else(|_| {
            row.try_get::<Vec<u8>, _>(idx)
                .map(|v| RdbmValue::Text(String::from_utf8_lossy(&v).into_owned()))
        }),
    };

    decoded.unwrap_or_else(|e| {
        debug!("Could not decode {} column {}: {}", type_name, idx, e);
        RdbmValue::Null
    })
}
