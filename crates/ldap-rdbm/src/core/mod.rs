//! Backend-independent building blocks.
//!
//! - [`schema`]: reflected table and column metadata, materialized rows
//! - [`value`]: column value representation
//! - [`traits`]: the store and dialect abstractions drivers implement
//! - [`identifier`]: identifier validation and quoting

pub mod identifier;
pub mod schema;
pub mod traits;
pub mod value;

pub use schema::{
    ColumnKind, ColumnSchema, EntityRow, TableSchema, DN_COLUMN, DOC_ID_COLUMN,
    OBJECT_CLASS_COLUMN,
};
pub use traits::{Dialect, Fetch, MatchOp, Predicate, RdbmStore};
pub use value::{RdbmValue, STRUCTURED_KEY};
