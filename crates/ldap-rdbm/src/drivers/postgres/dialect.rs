//! PostgreSQL SQL dialect.

use crate::core::identifier::quote_pg;
use crate::core::schema::ColumnSchema;
use crate::core::traits::Dialect;
use crate::error::Result;

/// Reflected types that cannot be written as a `::type` cast.
const UNCASTABLE: [&str; 2] = ["USER-DEFINED", "ARRAY"];

/// PostgreSQL dialect: double-quote quoting and `$n` placeholders.
///
/// Parameters bound as text are cast to the target column's type, since
/// PostgreSQL does not convert text to integer, timestamp or JSON columns
/// implicitly.
#[derive(Debug, Clone, Default)]
pub struct PostgresDialect;

impl PostgresDialect {
    /// Create a new PostgreSQL dialect instance.
    pub fn new() -> Self {
        Self
    }
}

fn needs_cast(column: &ColumnSchema) -> bool {
    !column.is_textual() && !UNCASTABLE.contains(&column.data_type.as_str())
}

impl Dialect for PostgresDialect {
    fn name(&self) -> &str {
        "pgsql"
    }

    fn quote_ident(&self, name: &str) -> Result<String> {
        quote_pg(name)
    }

    fn param_placeholder(&self, index: usize, column: Option<&ColumnSchema>) -> String {
        match column {
            Some(col) if needs_cast(col) => format!("${}::{}", index, col.data_type),
            _ => format!("${}", index),
        }
    }

    fn like_operand(&self, quoted: String, column: Option<&ColumnSchema>) -> String {
        match column {
            Some(col) if !col.is_textual() => format!("{}::text", quoted),
            _ => quoted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::TableSchema;
    use crate::core::traits::Predicate;

    #[test]
    fn test_quote_ident() {
        let dialect = PostgresDialect::new();
        assert_eq!(dialect.quote_ident("jansClnt").unwrap(), "\"jansClnt\"");
        assert_eq!(dialect.quote_ident("a\"b").unwrap(), "\"a\"\"b\"");
    }

    #[test]
    fn test_param_placeholder_casts() {
        let dialect = PostgresDialect::new();
        assert_eq!(dialect.param_placeholder(1, None), "$1");
        assert_eq!(
            dialect.param_placeholder(2, Some(&ColumnSchema::new("dn", "character varying"))),
            "$2"
        );
        assert_eq!(
            dialect.param_placeholder(3, Some(&ColumnSchema::new("jansEnabled", "smallint"))),
            "$3::smallint"
        );
        assert_eq!(
            dialect.param_placeholder(
                4,
                Some(&ColumnSchema::new("creationDate", "timestamp without time zone"))
            ),
            "$4::timestamp without time zone"
        );
        assert_eq!(
            dialect.param_placeholder(5, Some(&ColumnSchema::new("x", "USER-DEFINED"))),
            "$5"
        );
    }

    #[test]
    fn test_build_select_filter() {
        let table = TableSchema::new(
            "jansClnt",
            vec![
                ColumnSchema::new("displayName", "character varying"),
                ColumnSchema::new("jansScope", "jsonb"),
                ColumnSchema::new("jansEnabled", "smallint"),
            ],
        );
        let sql = PostgresDialect::new()
            .build_select(
                &table,
                &[
                    Predicate::like("displayName", "Test%"),
                    Predicate::like("jansScope", "%openid%"),
                    Predicate::equals("jansEnabled", "1"),
                ],
                Some(1),
            )
            .unwrap();
        assert_eq!(
            sql,
            "SELECT * FROM \"jansClnt\" WHERE \"displayName\" LIKE $1 \
             AND \"jansScope\"::text LIKE $2 AND \"jansEnabled\" = $3::smallint LIMIT 1"
        );
    }

    #[test]
    fn test_build_insert_casts_typed_columns() {
        use crate::core::schema::EntityRow;
        use crate::core::value::RdbmValue;

        let table = TableSchema::new(
            "jansClnt",
            vec![
                ColumnSchema::new("dn", "character varying"),
                ColumnSchema::new("jansRedirectURI", "jsonb"),
            ],
        );
        let row = EntityRow::new("jansClnt")
            .with("dn", "inum=1,o=jans")
            .with("jansRedirectURI", RdbmValue::empty_structured());
        let sql = PostgresDialect::new().build_insert(&table, &row).unwrap();
        assert_eq!(
            sql,
            "INSERT INTO \"jansClnt\" (\"dn\", \"jansRedirectURI\") VALUES ($1, $2::jsonb)"
        );
    }
}
