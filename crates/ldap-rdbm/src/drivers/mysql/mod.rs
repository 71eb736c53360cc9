//! MySQL/MariaDB driver.
//!
//! - [`MysqlDialect`]: SQL syntax strategy
//! - [`MysqlStore`]: single-session store
//!
//! # Supported Versions
//!
//! - MySQL 5.7+, 8.0+ (JSON columns)
//! - MariaDB 10.2+ (JSON is an alias for LONGTEXT and decodes as text)

mod dialect;
mod store;

pub use dialect::MysqlDialect;
pub use store::MysqlStore;
