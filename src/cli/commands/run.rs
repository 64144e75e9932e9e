//! Run CLI command
//!
//! Imports a local CSV file into a DuckDB database.

use std::path::PathBuf;

use crate::cli::commands::{load_config, load_destination};
use crate::cli::error::CliError;
use crate::database::{Connection, DuckDbConnection};
use crate::dialect::{DuckdbDialect, SqlDialect};
use crate::import::{ImportState, Importer};
use crate::models::DialectKind;
use crate::source::FileSource;

/// Run command arguments
#[derive(Debug, Clone)]
pub struct RunArgs {
    /// DuckDB database file
    pub database: PathBuf,
    /// Destination table definition (YAML or DDL)
    pub destination: PathBuf,
    /// CSV file whose first line holds the column names
    pub csv: PathBuf,
    /// Directory holding `.staged-import.toml`
    pub config: Option<PathBuf>,
    /// Force an incremental import
    pub incremental: bool,
    /// Create the destination table before importing
    pub create: bool,
}

/// Column names from the header line of a CSV file
pub fn read_csv_header(path: &PathBuf, delimiter: &str) -> Result<Vec<String>, CliError> {
    if !path.exists() {
        return Err(CliError::FileNotFound(path.clone()));
    }
    let content = std::fs::read_to_string(path)
        .map_err(|e| CliError::FileReadError(path.clone(), e.to_string()))?;
    let header = content.lines().next().unwrap_or_default();
    Ok(header
        .split(delimiter)
        .map(|c| c.trim().trim_matches('"').to_string())
        .filter(|c| !c.is_empty())
        .collect())
}

/// Import the CSV file and return the final state
pub fn run_import(args: &RunArgs) -> Result<ImportState, CliError> {
    let config = load_config(args.config.as_deref())?;
    let destination = load_destination(&args.destination, DialectKind::Duckdb)?;

    let source = FileSource::new(args.csv.to_string_lossy().into_owned(), Vec::new());
    let columns = read_csv_header(&args.csv, &source.csv.delimiter)?;
    let source = FileSource { columns, ..source };

    let mut options = config.import;
    options.number_of_ignored_lines = options.number_of_ignored_lines.max(1);
    if args.incremental {
        options.is_incremental = true;
    }

    let connection = DuckDbConnection::new(&args.database)
        .map_err(|e| CliError::DatabaseError(format!("Failed to open database: {}", e)))?;
    let dialect = DuckdbDialect;
    if args.create {
        connection
            .execute(&dialect.render_create_table(&destination))
            .map_err(|e| CliError::DatabaseError(format!("Failed to create destination: {}", e)))?;
    }

    Ok(Importer::new(&connection, &dialect).import(&source.into(), &destination, &options)?)
}

/// Import the CSV file and print the import state as JSON
pub fn handle_run(args: &RunArgs) -> Result<(), CliError> {
    let state = run_import(args)?;
    let json = serde_json::to_string_pretty(&state)
        .map_err(|e| CliError::IoError(format!("Failed to serialize state: {}", e)))?;
    println!("{}", json);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_read_csv_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.csv");
        std::fs::write(&path, "\"id\",name\n1,a\n").unwrap();
        assert_eq!(read_csv_header(&path, ",").unwrap(), vec!["id", "name"]);
    }

    #[test]
    fn test_run_creates_and_loads() {
        let dir = tempdir().unwrap();
        let csv = dir.path().join("accounts.csv");
        std::fs::write(&csv, "id,name\n1,alice\n2,bob\n2,bobby\n").unwrap();
        let destination = dir.path().join("accounts.sql");
        std::fs::write(
            &destination,
            "CREATE TABLE main.accounts (id VARCHAR PRIMARY KEY, name VARCHAR)",
        )
        .unwrap();

        let state = run_import(&RunArgs {
            database: dir.path().join("db.duckdb"),
            destination,
            csv,
            config: Some(dir.path().to_path_buf()),
            incremental: false,
            create: true,
        })
        .unwrap();
        assert_eq!(state.table_name, "accounts");
        assert_eq!(state.imported_rows_count, 2);
    }
}
