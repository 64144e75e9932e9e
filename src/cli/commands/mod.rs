//! CLI command implementations

pub mod plan;
#[cfg(feature = "duckdb-backend")]
pub mod run;

use std::path::{Path, PathBuf};

use crate::cli::error::CliError;
use crate::config::ImportConfig;
use crate::models::{DialectKind, TableDefinition};

/// Load the import configuration from `dir`, or the current directory
pub fn load_config(dir: Option<&Path>) -> Result<ImportConfig, CliError> {
    let dir = match dir {
        Some(dir) => dir.to_path_buf(),
        None => std::env::current_dir()
            .map_err(|e| CliError::IoError(format!("Failed to get current directory: {}", e)))?,
    };
    Ok(ImportConfig::load(&dir)?)
}

/// Resolve the dialect from the command line, falling back to the config
pub fn resolve_dialect(arg: Option<&str>, config: &ImportConfig) -> Result<DialectKind, CliError> {
    match arg {
        Some(name) => name.parse().map_err(CliError::InvalidArgument),
        None => Ok(config.dialect),
    }
}

/// Read a destination table from a YAML definition or a `CREATE TABLE` script
///
/// Files ending in `.sql` are parsed as DDL, everything else as YAML.
pub fn load_destination(path: &PathBuf, dialect: DialectKind) -> Result<TableDefinition, CliError> {
    if !path.exists() {
        return Err(CliError::FileNotFound(path.clone()));
    }
    let content = std::fs::read_to_string(path)
        .map_err(|e| CliError::FileReadError(path.clone(), e.to_string()))?;

    let is_ddl = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("sql"));
    let table = if is_ddl {
        TableDefinition::from_ddl(&content, dialect)
    } else {
        TableDefinition::from_yaml(&content, dialect)
    };
    table.map_err(|e| CliError::InvalidTable(path.clone(), e))
}

/// Split a comma-separated column list, dropping blanks
pub fn parse_column_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(String::from)
        .collect()
}
