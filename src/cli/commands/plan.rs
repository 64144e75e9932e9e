//! Plan CLI command
//!
//! Dry run of an import: the statements are rendered against a
//! [`RecordingConnection`] and printed instead of executed.

use std::path::PathBuf;

use crate::cli::commands::{load_config, load_destination, parse_column_list, resolve_dialect};
use crate::cli::error::CliError;
use crate::database::RecordingConnection;
use crate::dialect::dialect_for;
use crate::import::Importer;
use crate::source::FileSource;

/// Plan command arguments
#[derive(Debug, Clone)]
pub struct PlanArgs {
    /// Dialect name; the configured dialect when absent
    pub dialect: Option<String>,
    /// Destination table definition (YAML or DDL)
    pub destination: PathBuf,
    /// Comma-separated source columns
    pub columns: String,
    /// Source file URL written into the load statements
    pub url: String,
    /// Directory holding `.staged-import.toml`
    pub config: Option<PathBuf>,
    /// Force an incremental import
    pub incremental: bool,
}

/// Statements the import described by `args` would run, in order
pub fn render_plan(args: &PlanArgs) -> Result<Vec<String>, CliError> {
    let config = load_config(args.config.as_deref())?;
    let kind = resolve_dialect(args.dialect.as_deref(), &config)?;
    let destination = load_destination(&args.destination, kind)?;

    let columns = parse_column_list(&args.columns);
    if columns.is_empty() {
        return Err(CliError::InvalidArgument(
            "At least one source column is required".to_string(),
        ));
    }

    let mut options = config.import;
    if args.incremental {
        options.is_incremental = true;
    }

    let dialect = dialect_for(kind);
    let connection = RecordingConnection::new();
    let source = FileSource::new(args.url.clone(), columns);
    Importer::new(&connection, dialect.as_ref()).import(&source.into(), &destination, &options)?;
    Ok(connection.statements())
}

/// Print the planned statements, one per line
pub fn handle_plan(args: &PlanArgs) -> Result<(), CliError> {
    for statement in render_plan(args)? {
        println!("{};", statement);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn args(dir: &std::path::Path, columns: &str) -> PlanArgs {
        let destination = dir.join("accounts.sql");
        std::fs::write(
            &destination,
            "CREATE TABLE s.accounts (id VARCHAR PRIMARY KEY, name VARCHAR)",
        )
        .unwrap();
        PlanArgs {
            dialect: Some("snowflake".to_string()),
            destination,
            columns: columns.to_string(),
            url: "s3://bucket/accounts.csv".to_string(),
            config: Some(dir.to_path_buf()),
            incremental: false,
        }
    }

    #[test]
    fn test_plan_full_load() {
        let dir = tempdir().unwrap();
        let statements = render_plan(&args(dir.path(), "id,name")).unwrap();
        assert!(statements[0].starts_with("CREATE TEMPORARY TABLE \"s\".\"__temp_"));
        assert!(statements[1].starts_with("COPY INTO"));
        assert!(statements.iter().any(|s| s == "TRUNCATE TABLE \"s\".\"accounts\""));
    }

    #[test]
    fn test_plan_incremental() {
        let dir = tempdir().unwrap();
        let mut args = args(dir.path(), "id,name");
        args.incremental = true;
        let statements = render_plan(&args).unwrap();
        assert!(!statements.iter().any(|s| s.starts_with("TRUNCATE")));
        assert!(statements.iter().any(|s| s.starts_with("UPDATE \"s\".\"accounts\"")));
    }

    #[test]
    fn test_plan_requires_columns() {
        let dir = tempdir().unwrap();
        let err = render_plan(&args(dir.path(), " , ")).unwrap_err();
        assert!(matches!(err, CliError::InvalidArgument(_)));
    }

    #[test]
    fn test_plan_unknown_column() {
        let dir = tempdir().unwrap();
        let err = render_plan(&args(dir.path(), "id,missing")).unwrap_err();
        assert!(matches!(err, CliError::ImportError(_)));
    }
}
