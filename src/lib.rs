//! Staged Import SDK - Loading CSV files and tables into cloud data warehouses
//!
//! Provides unified interfaces for:
//! - Column types and their per-dialect catalogs
//! - SQL rendering for Snowflake, Synapse, Exasol, Teradata, BigQuery and DuckDB
//! - Staging table creation and cleanup
//! - Full and incremental imports from a staging table into a destination
//! - Import configuration files
//! - Database connections (recording and embedded DuckDB)

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod database;
pub mod datatype;
pub mod dialect;
pub mod import;
pub mod models;
pub mod source;
pub mod staging;
pub mod validation;

// Re-export commonly used types
pub use config::{ConfigError, ImportConfig};
#[cfg(feature = "duckdb-backend")]
pub use database::DuckDbConnection;
pub use database::{Connection, DatabaseError, QueryResult, RecordingConnection};
pub use datatype::TypeDefinition;
pub use dialect::{SqlDialect, dialect_for};
pub use import::{
    ErrorCode, FullImporter, ImportError, ImportOptions, ImportResult, ImportState, Importer,
    IncrementalImporter, StageImporter,
};
pub use source::{FileSource, QuerySource, Source, TableSource};
pub use staging::{StagingTableFactory, TableGuard};
pub use validation::SchemaValidator;

// Re-export models
pub use models::enums::*;
pub use models::{ColumnDefinition, TableDefinition, TableError};
