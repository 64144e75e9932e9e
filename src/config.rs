//! Import configuration file support
//!
//! Handles parsing of `.staged-import.toml` configuration files and
//! environment variable overrides.

use crate::import::ImportOptions;
use crate::models::DialectKind;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration filename
pub const CONFIG_FILENAME: &str = ".staged-import.toml";

/// Environment variable for the target dialect
pub const ENV_DIALECT: &str = "STAGED_IMPORT_DIALECT";

/// Environment variable for incremental imports
pub const ENV_INCREMENTAL: &str = "STAGED_IMPORT_INCREMENTAL";

/// Environment variable for filling the `_timestamp` column
pub const ENV_USE_TIMESTAMP: &str = "STAGED_IMPORT_USE_TIMESTAMP";

/// Environment variable for the number of header lines to skip
pub const ENV_IGNORED_LINES: &str = "STAGED_IMPORT_IGNORED_LINES";

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Configuration error: {0}")]
    ParseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Main configuration structure
///
/// Represents the `.staged-import.toml` configuration file format.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Target dialect
    #[serde(default)]
    pub dialect: DialectKind,

    /// Import options
    #[serde(default)]
    pub import: ImportOptions,
}

impl ImportConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a directory
    ///
    /// Looks for `.staged-import.toml` in the directory.
    /// Falls back to defaults if not found.
    pub fn load(dir: &Path) -> ConfigResult<Self> {
        let config_path = dir.join(CONFIG_FILENAME);

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .map_err(|e| ConfigError::IoError(format!("Failed to read config: {}", e)))?;

            Self::parse(&content)?
        } else {
            Self::default()
        };

        config.apply_env_overrides();

        Ok(config)
    }

    /// Parse configuration from TOML string
    pub fn parse(content: &str) -> ConfigResult<Self> {
        toml::from_str(content)
            .map_err(|e| ConfigError::ParseError(format!("Failed to parse config: {}", e)))
    }

    /// Save configuration to a directory
    pub fn save(&self, dir: &Path) -> ConfigResult<()> {
        let content = self.to_toml()?;
        std::fs::write(dir.join(CONFIG_FILENAME), content)
            .map_err(|e| ConfigError::IoError(format!("Failed to write config: {}", e)))
    }

    /// Convert configuration to TOML string
    pub fn to_toml(&self) -> ConfigResult<String> {
        toml::to_string_pretty(self).map_err(|e| {
            ConfigError::SerializationError(format!("Failed to serialize config: {}", e))
        })
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from a variable lookup; unparsable values are ignored
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dialect) = lookup(ENV_DIALECT)
            && let Ok(dialect) = dialect.parse()
        {
            self.dialect = dialect;
        }

        if let Some(incremental) = lookup(ENV_INCREMENTAL)
            && let Some(incremental) = parse_flag(&incremental)
        {
            self.import.is_incremental = incremental;
        }

        if let Some(use_timestamp) = lookup(ENV_USE_TIMESTAMP)
            && let Some(use_timestamp) = parse_flag(&use_timestamp)
        {
            self.import.use_timestamp = use_timestamp;
        }

        if let Some(lines) = lookup(ENV_IGNORED_LINES)
            && let Ok(lines) = lines.trim().parse()
        {
            self.import.number_of_ignored_lines = lines;
        }
    }

    /// Check if configuration exists in a directory
    pub fn exists(dir: &Path) -> bool {
        dir.join(CONFIG_FILENAME).exists()
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Generate a sample configuration file content
pub fn sample_config() -> &'static str {
    r#"# Staged import configuration

# Target dialect: snowflake, synapse, exasol, teradata, bigquery or duckdb
dialect = "snowflake"

[import]
is_incremental = false
use_timestamp = false
# Header lines to skip in CSV files
number_of_ignored_lines = 1
# Columns where an empty string is stored as NULL
convert_empty_values_to_null = []
# "convert" turns NULL into '' for string columns, "skip" copies values as-is
null_manipulation = "convert"
# "preserve" or "cast"
cast_value_types = "preserve"
# "tmp_table" or "ctas"
dedup_strategy = "tmp_table"
# incremental_strategy = "update_insert"
use_transaction = false
"#
}
