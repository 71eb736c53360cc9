//! Store and dialect abstractions.
//!
//! - [`RdbmStore`]: one open session against a relational backend
//! - [`Dialect`]: SQL syntax strategy (quoting, placeholders, statements)
//!
//! Statement builders are default methods on [`Dialect`], so a backend only
//! supplies quoting and placeholder rules.

use async_trait::async_trait;

use crate::config::Backend;
use crate::error::Result;

use super::schema::{ColumnSchema, EntityRow, TableSchema, DN_COLUMN};
use super::value::RdbmValue;

/// Comparison applied by a [`Predicate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOp {
    /// `column = value`
    Equals,
    /// `column LIKE value` (`%` wildcards)
    Like,
}

/// A single `column <op> value` condition. Predicates are AND-ed.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub column: String,
    pub op: MatchOp,
    pub value: RdbmValue,
}

impl Predicate {
    /// Equality predicate.
    pub fn equals(column: impl Into<String>, value: impl Into<RdbmValue>) -> Self {
        Self {
            column: column.into(),
            op: MatchOp::Equals,
            value: value.into(),
        }
    }

    /// Pattern predicate.
    pub fn like(column: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            op: MatchOp::Like,
            value: RdbmValue::Text(pattern.into()),
        }
    }
}

/// How many rows a raw statement should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Fetch {
    /// Execute only.
    #[default]
    None,
    /// First row only.
    One,
    /// Every row.
    All,
}

/// SQL syntax for one backend.
pub trait Dialect: Send + Sync {
    /// Dialect identifier ("mysql", "pgsql").
    fn name(&self) -> &str;

    /// Quote a table or column name.
    fn quote_ident(&self, name: &str) -> Result<String>;

    /// Parameter placeholder for the 1-based `index`.
    ///
    /// `column` is the target column when known; backends that need explicit
    /// casts use its data type.
    fn param_placeholder(&self, index: usize, column: Option<&ColumnSchema>) -> String;

    /// Left-hand side of a LIKE comparison.
    fn like_operand(&self, quoted: String, _column: Option<&ColumnSchema>) -> String {
        quoted
    }

    /// `SELECT * FROM table WHERE ... [LIMIT n]`
    fn build_select(
        &self,
        table: &TableSchema,
        predicates: &[Predicate],
        limit: Option<usize>,
    ) -> Result<String> {
        let mut sql = format!("SELECT * FROM {}", self.quote_ident(&table.name)?);

        let mut clauses = Vec::with_capacity(predicates.len());
        for (i, predicate) in predicates.iter().enumerate() {
            let column = table.column(&predicate.column);
            let quoted = self.quote_ident(&predicate.column)?;
            let clause = match predicate.op {
                MatchOp::Equals => format!(
                    "{} = {}",
                    quoted,
                    self.param_placeholder(i + 1, column)
                ),
                MatchOp::Like => format!(
                    "{} LIKE {}",
                    self.like_operand(quoted, column),
                    self.param_placeholder(i + 1, None)
                ),
            };
            clauses.push(clause);
        }
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }

        if let Some(n) = limit {
            sql.push_str(&format!(" LIMIT {}", n));
        }
        Ok(sql)
    }

    /// `INSERT INTO table (...) VALUES (...)`, columns in the row's key order.
    fn build_insert(&self, table: &TableSchema, row: &EntityRow) -> Result<String> {
        let mut columns = Vec::with_capacity(row.values.len());
        let mut params = Vec::with_capacity(row.values.len());
        for (i, name) in row.values.keys().enumerate() {
            columns.push(self.quote_ident(name)?);
            params.push(self.param_placeholder(i + 1, table.column(name)));
        }
        Ok(format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.quote_ident(&table.name)?,
            columns.join(", "),
            params.join(", ")
        ))
    }

    /// `UPDATE table SET column = ? WHERE dn = ?`
    fn build_update(&self, table: &TableSchema, column: &str) -> Result<String> {
        Ok(format!(
            "UPDATE {} SET {} = {} WHERE {} = {}",
            self.quote_ident(&table.name)?,
            self.quote_ident(column)?,
            self.param_placeholder(1, table.column(column)),
            self.quote_ident(DN_COLUMN)?,
            self.param_placeholder(2, table.column(DN_COLUMN))
        ))
    }
}

/// One open session against a relational backend.
///
/// Sessions are exclusive: every operation takes `&mut self`, and callers
/// serialize access.
#[async_trait]
pub trait RdbmStore: Send {
    /// Backend this session talks to.
    fn backend(&self) -> Backend;

    /// Cheap round trip to verify the session is usable.
    async fn ping(&mut self) -> Result<()>;

    /// Discover every table and its columns in the current database.
    async fn reflect_tables(&mut self) -> Result<Vec<TableSchema>>;

    /// Rows of `table` matching all `predicates`.
    async fn select(
        &mut self,
        table: &TableSchema,
        predicates: &[Predicate],
        limit: Option<usize>,
    ) -> Result<Vec<EntityRow>>;

    /// Insert a new row.
    async fn insert(&mut self, table: &TableSchema, row: &EntityRow) -> Result<()>;

    /// Set one column of the row identified by `dn`. Returns rows affected.
    async fn update(
        &mut self,
        table: &TableSchema,
        dn: &str,
        column: &str,
        value: &RdbmValue,
    ) -> Result<u64>;

    /// Run an arbitrary statement.
    ///
    /// Returned rows carry an empty table name.
    async fn execute_raw(&mut self, statement: &str, fetch: Fetch) -> Result<Vec<EntityRow>>;
}
