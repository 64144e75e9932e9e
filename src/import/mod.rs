//! Staged import
//!
//! An import creates a staging table shaped after the destination, loads the
//! source into it, validates it against the destination and merges it with
//! either the full or the incremental importer. The staging table is dropped
//! on every exit path.
//!
//! # Example
//!
//! ```rust
//! use staged_import_sdk::database::RecordingConnection;
//! use staged_import_sdk::dialect::SnowflakeDialect;
//! use staged_import_sdk::import::{ImportOptions, Importer};
//! use staged_import_sdk::models::{DialectKind, TableDefinition};
//! use staged_import_sdk::source::FileSource;
//!
//! let destination = TableDefinition::from_yaml(
//!     "schema: PUBLIC\nname: accounts\nprimary_keys: [id]\ncolumns:\n  - {name: id, type: VARCHAR}\n  - {name: name, type: VARCHAR}\n",
//!     DialectKind::Snowflake,
//! )
//! .unwrap();
//! let mut source = FileSource::new("s3://bucket/accounts.csv", vec!["id".into(), "name".into()]);
//! source.primary_keys = vec!["id".into()];
//!
//! let connection = RecordingConnection::new();
//! let state = Importer::new(&connection, &SnowflakeDialect)
//!     .import(&source.into(), &destination, &ImportOptions::default())
//!     .unwrap();
//! assert_eq!(state.table_name, "accounts");
//! assert!(connection.statements()[1].starts_with("COPY INTO"));
//! ```

pub mod errors;
pub mod full;
pub mod incremental;
pub mod options;
mod runner;
pub mod stage;
pub mod state;

pub use errors::{ErrorCode, ImportError, ImportResult, Phase, convert_exception};
pub use full::FullImporter;
pub use incremental::IncrementalImporter;
pub use options::{
    CastValueTypes, DedupStrategy, ImportOptions, IncrementalStrategy, NullManipulation,
    SKIP_ALL_LINES,
};
pub use stage::StageImporter;
pub use state::{ImportState, Timer};

use crate::database::Connection;
use crate::dialect::SqlDialect;
use crate::models::TableDefinition;
use crate::source::{Source, TableSource};
use crate::staging::{StagingTableFactory, TableGuard};
use crate::validation::SchemaValidator;
use std::collections::HashSet;

/// Format of the shared `_timestamp` literal
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current UTC time as a `_timestamp` literal
pub fn current_timestamp() -> String {
    chrono::Utc::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Timestamp literal for this import call, computed once and kept in `state`
pub(crate) fn timestamp_for(state: &mut ImportState, options: &ImportOptions) -> Option<String> {
    if !options.use_timestamp {
        return None;
    }
    Some(state.timestamp.get_or_insert_with(current_timestamp).clone())
}

/// Runs a complete import on one connection
pub struct Importer<'a> {
    connection: &'a dyn Connection,
    dialect: &'a dyn SqlDialect,
}

impl<'a> Importer<'a> {
    pub fn new(connection: &'a dyn Connection, dialect: &'a dyn SqlDialect) -> Self {
        Self {
            connection,
            dialect,
        }
    }

    /// Stage `source` and merge it into `destination`
    ///
    /// Source columns are checked against the destination (count, names,
    /// then declared keys) before anything is created. The staging table is typed after the destination when
    /// `require_same_tables` is set and is string-typed otherwise.
    pub fn import(
        &self,
        source: &Source,
        destination: &TableDefinition,
        options: &ImportOptions,
    ) -> ImportResult<ImportState> {
        assert_source_columns(source, destination, options)?;

        let factory = StagingTableFactory::new(self.dialect);
        let staging = factory.create_staging_table_definition(
            destination,
            source.columns(),
            options.require_same_tables,
        );
        let mut declared = staging.without_columns(&options.ignore_columns);
        declared.primary_keys = source.primary_keys().to_vec();
        SchemaValidator::new().validate(&declared, destination, options)?;
        if options.require_same_tables
            && let Source::Table(TableSource {
                definition: Some(definition),
                ..
            }) = source
        {
            SchemaValidator::new().validate(definition, destination, options)?;
        }

        let _staging_guard = TableGuard::create(self.connection, self.dialect, staging.clone())?;

        let mut state = StageImporter::new(self.connection, self.dialect)
            .import_to_staging_table(source, &staging, options)?;
        if options.use_timestamp {
            state.timestamp = Some(current_timestamp());
        }

        let state = if options.is_incremental {
            IncrementalImporter::new(self.connection, self.dialect)
                .import_to_table(&staging, destination, options, state)?
        } else {
            FullImporter::new(self.connection, self.dialect)
                .import_to_table(&staging, destination, options, state)?
        };
        tracing::info!(
            table = %state.table_name,
            rows = state.imported_rows_count,
            incremental = options.is_incremental,
            "import finished"
        );
        Ok(state)
    }
}

/// Check the source columns before any table is created
fn assert_source_columns(
    source: &Source,
    destination: &TableDefinition,
    options: &ImportOptions,
) -> ImportResult<()> {
    let columns = source.columns();
    if columns.is_empty() {
        return Err(ImportError::load(
            ErrorCode::NoColumns,
            "No columns found in CSV file.",
        ));
    }

    let mut seen = HashSet::new();
    let duplicates: Vec<&str> = columns
        .iter()
        .filter(|c| !seen.insert(c.as_str()))
        .map(String::as_str)
        .collect();
    if !duplicates.is_empty() {
        return Err(ImportError::load(
            ErrorCode::DuplicateColumnNames,
            format!("Duplicate column names: {}", duplicates.join(", ")),
        ));
    }

    let missing: Vec<&str> = columns
        .iter()
        .filter(|c| !options.ignore_columns.contains(*c) && !destination.has_column(c))
        .map(String::as_str)
        .collect();
    if !missing.is_empty() {
        return Err(ImportError::load(
            ErrorCode::ColumnsCountNotMatch,
            format!("Columns do not match. Non existing columns: {}", missing.join(", ")),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::RecordingConnection;
    use crate::datatype::TypeDefinition;
    use crate::dialect::SnowflakeDialect;
    use crate::models::{ColumnDefinition, DialectKind};
    use crate::source::FileSource;

    fn destination() -> TableDefinition {
        let varchar = || TypeDefinition::new(DialectKind::Snowflake, "VARCHAR", None).unwrap();
        TableDefinition::new(
            "s",
            "accounts",
            vec![
                ColumnDefinition::new("id", varchar()),
                ColumnDefinition::new("name", varchar()),
            ],
        )
        .with_primary_keys(["id"])
    }

    fn file(columns: &[&str]) -> Source {
        FileSource::new("s3://b/f.csv", columns.iter().map(|c| c.to_string()).collect()).into()
    }

    #[test]
    fn test_no_columns() {
        let conn = RecordingConnection::new();
        let err = Importer::new(&conn, &SnowflakeDialect)
            .import(&file(&[]), &destination(), &ImportOptions::default())
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::NoColumns);
        assert_eq!(err.to_string(), "No columns found in CSV file.");
        assert!(conn.statements().is_empty());
    }

    #[test]
    fn test_unknown_source_column() {
        let conn = RecordingConnection::new();
        let err = Importer::new(&conn, &SnowflakeDialect)
            .import(&file(&["id", "nope"]), &destination(), &ImportOptions::default())
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ColumnsCountNotMatch);
        assert_eq!(err.to_string(), "Columns do not match. Non existing columns: nope");
    }

    #[test]
    fn test_ignored_column_is_allowed() {
        let conn = RecordingConnection::new();
        let options = ImportOptions::default().with_ignore_columns(["extra"]);
        Importer::new(&conn, &SnowflakeDialect)
            .import(&file(&["id", "name", "extra"]), &destination(), &options)
            .unwrap();
        let insert = conn
            .statements()
            .into_iter()
            .find(|s| s.starts_with("INSERT INTO \"s\".\"accounts\""))
            .unwrap();
        assert!(!insert.contains("extra"));
    }

    #[test]
    fn test_staging_dropped_after_merge_failure() {
        let conn = RecordingConnection::new().fail_on("TRUNCATE", "permission denied");
        let err = Importer::new(&conn, &SnowflakeDialect)
            .import(&file(&["id", "name"]), &destination(), &ImportOptions::default())
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnknownError);
        assert_eq!(err.to_string(), "Load error: permission denied");
        let statements = conn.statements();
        let staging_drop = statements.last().unwrap();
        assert!(staging_drop.starts_with("DROP TABLE IF EXISTS \"s\".\"__temp_"));
        assert_eq!(
            statements
                .iter()
                .filter(|s| s.starts_with("DROP TABLE IF EXISTS"))
                .count(),
            2
        );
    }

    #[test]
    fn test_declared_keys_must_match() {
        let conn = RecordingConnection::new();
        let mut source = FileSource::new("s3://b/f.csv", vec!["id".into(), "name".into()]);
        source.primary_keys = vec!["name".into()];
        let err = Importer::new(&conn, &SnowflakeDialect)
            .import(&source.into(), &destination(), &ImportOptions::default())
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::TableColumnsMismatch);
        assert!(conn.statements().is_empty());
    }

    #[test]
    fn test_missing_columns_reported_before_keys() {
        let conn = RecordingConnection::new();
        let mut source = FileSource::new("s3://b/f.csv", vec!["id".into()]);
        source.primary_keys = vec!["name".into()];
        let err = Importer::new(&conn, &SnowflakeDialect)
            .import(&source.into(), &destination(), &ImportOptions::default())
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::TableColumnsMismatch);
        assert!(err.to_string().contains("Tables don't have same number of columns"));
        assert!(conn.statements().is_empty());
    }

    #[test]
    fn test_timestamp_shared_by_call() {
        let mut state = ImportState::new("t");
        let options = ImportOptions::default().with_timestamp(true);
        let first = timestamp_for(&mut state, &options);
        let second = timestamp_for(&mut state, &options);
        assert_eq!(first, second);
        assert!(timestamp_for(&mut state, &ImportOptions::default()).is_none());
    }
}
