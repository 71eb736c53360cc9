//! LDIF change records: reading and applying them.
//!
//! ```text
//! .ldif file ──read_ldif──▶ ChangeRecord ──apply_ldif──▶ insert / update
//! ```

mod apply;
mod reader;
mod record;

pub use apply::{apply_ldif, import_ldif_files, ApplyOptions, ApplyReport};
pub use reader::{read_ldif, read_ldif_file};
pub use record::{ChangeOperation, ChangeRecord, CHANGETYPE};
