//! # ldap-rdbm
//!
//! LDAP-style directory operations over a MySQL or PostgreSQL database whose
//! tables are discovered at runtime.
//!
//! The library provides:
//!
//! - **Schema reflection** of every table and column on first use
//! - **DN addressing** of rows through their `dn` column
//! - **Restricted filter search** (`(a=b)` and `(&(a=b)(c=d))`)
//! - **Type coercion** between directory attribute syntaxes and column types
//! - **LDIF import** of create/add/replace records, safe to re-run
//!
//! ## Example
//!
//! ```rust,no_run
//! use ldap_rdbm::{Config, Directory, SearchScope};
//!
//! #[tokio::main]
//! async fn main() -> ldap_rdbm::Result<()> {
//!     let config = Config::load("config.yaml")?;
//!     let mut dir = Directory::open(&config).await?;
//!     let outcome = dir
//!         .search("o=jans", "(objectClass=jansClnt)", SearchScope::Subtree, true)
//!         .await;
//!     println!("Found {} clients", outcome.rows().len());
//!     Ok(())
//! }
//! ```

pub mod coerce;
pub mod config;
pub mod core;
pub mod directory;
pub mod dn;
pub mod drivers;
pub mod error;
pub mod filter;
pub mod ldif;
pub mod schema;

// Re-exports for convenient access
pub use coerce::TypeCoercer;
pub use config::{Backend, Config, RdbmConfig, SchemaConfig};
pub use crate::core::{EntityRow, Fetch, RdbmStore, RdbmValue, TableSchema};
pub use directory::{Directory, QueryOutcome, SearchScope};
pub use error::{RdbmError, Result};
pub use ldif::{apply_ldif, import_ldif_files, ApplyOptions, ApplyReport, ChangeRecord};
pub use schema::SchemaCatalog;
