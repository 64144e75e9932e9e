//! CLI binary entry point for staged-import-cli

#[cfg(feature = "cli")]
use anyhow::Context;
#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};
#[cfg(feature = "cli")]
use staged_import_sdk::cli::commands::plan::{PlanArgs, handle_plan};
#[cfg(all(feature = "cli", feature = "duckdb-backend"))]
use staged_import_sdk::cli::commands::run::{RunArgs, handle_run};
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "staged-import-cli")]
#[command(about = "Plan and run staged warehouse imports")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Print the statements an import would run
    Plan {
        /// Target dialect (snowflake, synapse, exasol, teradata, bigquery, duckdb)
        #[arg(short, long)]
        dialect: Option<String>,
        /// Destination table definition (.yaml or .sql)
        #[arg(long)]
        destination: PathBuf,
        /// Comma-separated source columns
        #[arg(short, long)]
        columns: String,
        /// Source file URL
        #[arg(long, default_value = "source.csv")]
        url: String,
        /// Directory containing .staged-import.toml
        #[arg(long)]
        config: Option<PathBuf>,
        /// Merge into existing rows instead of replacing them
        #[arg(short, long)]
        incremental: bool,
    },
    /// Import a CSV file into a DuckDB database
    #[cfg(feature = "duckdb-backend")]
    Run {
        /// DuckDB database file
        #[arg(long)]
        database: PathBuf,
        /// Destination table definition (.yaml or .sql)
        #[arg(long)]
        destination: PathBuf,
        /// CSV file with a header line
        #[arg(long)]
        csv: PathBuf,
        /// Directory containing .staged-import.toml
        #[arg(long)]
        config: Option<PathBuf>,
        /// Merge into existing rows instead of replacing them
        #[arg(short, long)]
        incremental: bool,
        /// Create the destination table first
        #[arg(long)]
        create: bool,
    },
}

#[cfg(feature = "cli")]
fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Plan {
            dialect,
            destination,
            columns,
            url,
            config,
            incremental,
        } => handle_plan(&PlanArgs {
            dialect,
            destination,
            columns,
            url,
            config,
            incremental,
        }),
        #[cfg(feature = "duckdb-backend")]
        Commands::Run {
            database,
            destination,
            csv,
            config,
            incremental,
            create,
        } => handle_run(&RunArgs {
            database,
            destination,
            csv,
            config,
            incremental,
            create,
        }),
    };

    result.context("staged-import-cli failed")
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature is not enabled. Build with --features cli");
    std::process::exit(1);
}
