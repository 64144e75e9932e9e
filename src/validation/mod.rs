//! Validation functionality
//!
//! Provides the schema checks run between staging and the final-table merge.

pub mod schema;

pub use schema::{ColumnsMismatchError, SchemaValidator, check_primary_keys};
