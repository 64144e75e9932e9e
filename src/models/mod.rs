//! Models module for the SDK
//!
//! Table and column definitions shared by the staging factory, the dialect
//! builders and the importers.

pub mod column;
pub mod ddl;
pub mod enums;
pub mod table;

pub use column::{ColumnDefinition, TIMESTAMP_COLUMN};
pub use enums::*;
pub use table::{TableDefinition, TableError};
