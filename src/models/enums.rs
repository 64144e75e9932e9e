//! Enums shared across table definitions, dialects and options
//!
//! # Serde Casing Conventions
//!
//! - `lowercase`: dialect keywords as they appear in config files (DialectKind)
//! - `SCREAMING_SNAKE_CASE`: physical layout hints that mirror the SQL keywords
//!   they render to (TableDistribution, TableIndexType)

use serde::{Deserialize, Serialize};

/// Target SQL dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    #[default]
    Snowflake,
    Synapse,
    Exasol,
    Teradata,
    Bigquery,
    Duckdb,
}

impl DialectKind {
    /// All supported dialects, in declaration order
    pub const ALL: [DialectKind; 6] = [
        DialectKind::Snowflake,
        DialectKind::Synapse,
        DialectKind::Exasol,
        DialectKind::Teradata,
        DialectKind::Bigquery,
        DialectKind::Duckdb,
    ];
}

impl std::str::FromStr for DialectKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "snowflake" => Ok(DialectKind::Snowflake),
            "synapse" | "mssql" => Ok(DialectKind::Synapse),
            "exasol" => Ok(DialectKind::Exasol),
            "teradata" => Ok(DialectKind::Teradata),
            "bigquery" => Ok(DialectKind::Bigquery),
            "duckdb" => Ok(DialectKind::Duckdb),
            _ => Err(format!(
                "Unknown dialect: {}. Use one of snowflake, synapse, exasol, teradata, bigquery, duckdb.",
                s
            )),
        }
    }
}

impl std::fmt::Display for DialectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DialectKind::Snowflake => write!(f, "snowflake"),
            DialectKind::Synapse => write!(f, "synapse"),
            DialectKind::Exasol => write!(f, "exasol"),
            DialectKind::Teradata => write!(f, "teradata"),
            DialectKind::Bigquery => write!(f, "bigquery"),
            DialectKind::Duckdb => write!(f, "duckdb"),
        }
    }
}

/// MPP table distribution (Synapse)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TableDistribution {
    Hash,
    #[default]
    RoundRobin,
    Replicate,
}

/// MPP table index type (Synapse)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TableIndexType {
    #[default]
    ClusteredColumnstoreIndex,
    Heap,
    ClusteredIndex,
}
