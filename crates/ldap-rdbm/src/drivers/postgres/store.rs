//! PostgreSQL session.
//!
//! Holds exactly one `PgConnection`; statements run under autocommit.

use async_trait::async_trait;
use sqlx::postgres::{PgArguments, PgConnectOptions, PgConnection, PgRow};
use sqlx::query::Query;
use sqlx::{Column, ConnectOptions, Connection, Postgres, Row, TypeInfo, ValueRef};
use serde_json::Value as JsonValue;
use tracing::{debug, info};

use super::dialect::PostgresDialect;
use crate::config::{Backend, RdbmConfig};
use crate::core::schema::{EntityRow, TableSchema};
use crate::core::traits::{Dialect, Fetch, Predicate, RdbmStore};
use crate::core::value::RdbmValue;
use crate::error::{RdbmError, Result};

const REFLECT_QUERY: &str = r#"
    SELECT
        table_name::text AS table_name,
        column_name::text AS column_name,
        data_type::text AS data_type
    FROM information_schema.columns
    WHERE table_schema = current_schema()
    ORDER BY table_name, ordinal_position
"#;

/// Single-session PostgreSQL store.
pub struct PostgresStore {
    conn: PgConnection,
    dialect: PostgresDialect,
}

impl PostgresStore {
    /// Open the session described by `config` and ping it.
    pub async fn connect(config: &RdbmConfig) -> Result<Self> {
        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port())
            .database(&config.database)
            .username(&config.user)
            .password(&config.password);

        let mut conn = options
            .connect()
            .await
            .map_err(|e| RdbmError::connection(e, "opening PostgreSQL session"))?;

        sqlx::query("SELECT 1")
            .execute(&mut conn)
            .await
            .map_err(|e| RdbmError::connection(e, "testing PostgreSQL session"))?;

        info!("Connected to {}", config.redacted_connection_string());

        Ok(Self {
            conn,
            dialect: PostgresDialect::new(),
        })
    }
}

#[async_trait]
impl RdbmStore for PostgresStore {
    fn backend(&self) -> Backend {
        Backend::Pgsql
    }

    async fn ping(&mut self) -> Result<()> {
        self.conn
            .ping()
            .await
            .map_err(|e| RdbmError::connection(e, "pinging PostgreSQL session"))
    }

    async fn reflect_tables(&mut self) -> Result<Vec<TableSchema>> {
        let rows: Vec<PgRow> = sqlx::query(REFLECT_QUERY)
            .fetch_all(&mut self.conn)
            .await
            .map_err(|e| RdbmError::query(e, "reflecting PostgreSQL tables"))?;

        let triples = rows
            .iter()
            .map(|row| -> std::result::Result<(String, String, String), sqlx::Error> {
                Ok((
                    row.try_get::<String, _>("table_name")?,
                    row.try_get::<String, _>("column_name")?,
                    row.try_get::<String, _>("data_type")?,
                ))
            })
            .collect::<std::result::Result<Vec<_>, sqlx::Error>>()
            .map_err(|e| RdbmError::query(e, "reading PostgreSQL column metadata"))?;
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
    query: Query<'q, Postgres, PgArguments>,
    value: &'q RdbmValue,
) -> Query<'q, Postgres, PgArguments> {
    match value {
        RdbmValue::Null => query.bind(None::<String>),
        RdbmValue::Int(v) => query.bind(*v),
        RdbmValue::Text(s) => query.bind(s.as_str()),
        RdbmValue::Json(v) => query.bind(sqlx::types::Json(v)),
    }
}

fn decode_row(table: &str, row: &PgRow) -> EntityRow {
    let mut entity = EntityRow::new(table);
    for (idx, column) in row.columns().iter().enumerate() {
        entity.set(column.name(), decode_value(row, idx, column.type_info().name()));
    }
    entity
}

/// Convert one column of a PostgreSQL row by its type name.
fn decode_value(row: &PgRow, idx: usize, type_name: &str) -> RdbmValue {
    let is_null: bool = row.try_get_raw(idx).map(|r| r.is_null()).unwrap_or(true);
    if is_null {
        return RdbmValue::Null;
    }

    let decoded = match type_name {
        "BOOL" => row.try_get::<bool, _>(idx).map(|v| RdbmValue::Int(i64::from(v))),
        "INT2" => row.try_get::<i16, _>(idx).map(|v| RdbmValue::Int(i64::from(v))),
        "INT4" => row.try_get::<i32, _>(idx).map(|v| RdbmValue::Int(i64::from(v))),
        "INT8" => row.try_get::<i64, _>(idx).map(RdbmValue::Int),
        "JSON" | "JSONB" => row.try_get::<JsonValue, _>(idx).map(RdbmValue::Json),
        "TIMESTAMP" => row
            .try_get::<chrono::NaiveDateTime, _>(idx)
            .map(|v| RdbmValue::Text(v.format("%Y-%m-%d %H:%M:%S%.f").to_string())),
        "TIMESTAMPTZ" => row
            .try_get::<chrono::DateTime<chrono::Utc>, _>(idx)
            .map(|v| RdbmValue::Text(v.format("%Y-%m-%d %H:%M:%S%.f").to_string())),
        "DATE" => row
            .try_get::<chrono::NaiveDate, _>(idx)
            .map(|v| RdbmValue::Text(v.to_string())),
        _ => row.try_get::<String, _>(idx).map(RdbmValue::Text),
    };

    decoded.unwrap_or_else(|e| {
        debug!("Could not decode {} column {}: {}", type_name, idx, e);
        RdbmValue::Null
    })
}
