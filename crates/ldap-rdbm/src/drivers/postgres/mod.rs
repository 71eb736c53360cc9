//! PostgreSQL driver.
//!
//! - [`PostgresDialect`]: SQL syntax strategy
//! - [`PostgresStore`]: single-session store
//!
//! Tables are reflected from the connection's current schema.

mod dialect;
mod store;

pub use dialect::PostgresDialect;
pub use store::PostgresStore;
