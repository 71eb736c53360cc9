//! Backend implementations of [`RdbmStore`].
//!
//! - [`mysql`]: MySQL/MariaDB over sqlx
//! - [`postgres`]: PostgreSQL over sqlx
//! - [`memory`]: in-process store for dry runs and tests
//!
//! Each networked driver supplies a `Dialect` (quoting, placeholders) and a
//! store holding one connection for the life of the run.

pub mod memory;
pub mod mysql;
pub mod postgres;

pub use memory::MemoryStore;
pub use mysql::{MysqlDialect, MysqlStore};
pub use postgres::{PostgresDialect, PostgresStore};

use tracing::info;

use crate::config::{Backend, RdbmConfig};
use crate::core::traits::RdbmStore;
use crate::error::Result;

/// Open the single session for the configured backend.
///
/// Fails with [`RdbmError::Connection`](crate::error::RdbmError::Connection)
/// carrying the driver's message. No retry is attempted.
pub async fn connect(config: &RdbmConfig) -> Result<Box<dyn RdbmStore>> {
    info!(
        "Connecting to {} backend at {}:{}",
        config.r#type,
        config.host,
        config.port()
    );

    let store: Box<dyn RdbmStore> = match config.r#type {
        Backend::Mysql => Box::new(MysqlStore::connect(config).await?),
        Backend::Pgsql => Box::new(PostgresStore::connect(config).await?),
    };
    Ok(store)
}
