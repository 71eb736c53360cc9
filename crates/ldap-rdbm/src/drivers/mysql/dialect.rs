//! MySQL/MariaDB SQL dialect.

use crate::core::identifier::quote_mysql;
use crate::core::schema::ColumnSchema;
use crate::core::traits::Dialect;
use crate::error::Result;

/// MySQL/MariaDB dialect: backtick quoting and `?` placeholders.
///
/// MySQL converts bound strings to the column type implicitly, so no casts
/// are emitted.
#[derive(Debug, Clone, Default)]
pub struct MysqlDialect;

impl MysqlDialect {
    /// Create a new MySQL dialect instance.
    pub fn new() -> Self {
        Self
    }
}

impl Dialect for MysqlDialect {
    fn name(&self) -> &str {
        "mysql"
    }

    fn quote_ident(&self, name: &str) -> Result<String> {
        quote_mysql(name)
    }

    fn param_placeholder(&self, _index: usize, _column: Option<&ColumnSchema>) -> String {
        "?".to_string()
    }
}
