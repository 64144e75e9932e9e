//! Import options
//!
//! Immutable per-call configuration. Every field has a default so options can
//! be given partially in TOML or YAML.

use crate::datatype::LengthCheck;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// `number_of_ignored_lines` value meaning "skip every line"
///
/// Used for pre-filtered sources where the loader must not read data lines.
pub const SKIP_ALL_LINES: u32 = u32::MAX;

/// How NULL and empty strings are reconciled for string columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NullManipulation {
    /// NULL becomes `''` in string columns; comparisons are NULL/empty-normalized
    #[default]
    Convert,
    /// Values are copied untouched
    Skip,
}

/// Whether staging values are cast to destination column types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CastValueTypes {
    #[default]
    Preserve,
    Cast,
}

/// How full loads deduplicate and replace the destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupStrategy {
    /// Dedup into a temporary table, then truncate and insert
    #[default]
    TmpTable,
    /// Create the new table as select, then swap it into place
    Ctas,
}

/// How incremental loads reconcile existing destination rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncrementalStrategy {
    DeleteInsert,
    UpdateInsert,
}

/// Per-call import configuration
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportOptions {
    /// Columns where an empty string is stored as NULL
    pub convert_empty_values_to_null: BTreeSet<String>,
    pub is_incremental: bool,
    /// Fill the `_timestamp` audit column
    pub use_timestamp: bool,
    /// Header lines to skip in file sources
    pub number_of_ignored_lines: u32,
    /// Source columns not loaded into staging
    pub ignore_columns: BTreeSet<String>,
    /// Source and destination column types must match
    pub require_same_tables: bool,
    pub null_manipulation: NullManipulation,
    pub cast_value_types: CastValueTypes,
    pub dedup_strategy: DedupStrategy,
    /// Overrides the dialect's default incremental strategy
    pub incremental_strategy: Option<IncrementalStrategy>,
    /// Wrap destination-mutating statements in a transaction
    pub use_transaction: bool,
    pub length_check: LengthCheck,
}

impl ImportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn incremental(mut self, incremental: bool) -> Self {
        self.is_incremental = incremental;
        self
    }

    pub fn with_timestamp(mut self, use_timestamp: bool) -> Self {
        self.use_timestamp = use_timestamp;
        self
    }

    pub fn with_ignored_lines(mut self, lines: u32) -> Self {
        self.number_of_ignored_lines = lines;
        self
    }

    pub fn with_convert_empty_values_to_null<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.convert_empty_values_to_null = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_ignore_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn require_same_tables(mut self, require: bool) -> Self {
        self.require_same_tables = require;
        self
    }

    pub fn with_null_manipulation(mut self, mode: NullManipulation) -> Self {
        self.null_manipulation = mode;
        self
    }

    pub fn with_cast_value_types(mut self, mode: CastValueTypes) -> Self {
        self.cast_value_types = mode;
        self
    }

    pub fn with_dedup_strategy(mut self, strategy: DedupStrategy) -> Self {
        self.dedup_strategy = strategy;
        self
    }

    pub fn with_incremental_strategy(mut self, strategy: IncrementalStrategy) -> Self {
        self.incremental_strategy = Some(strategy);
        self
    }

    pub fn with_transaction(mut self, use_transaction: bool) -> Self {
        self.use_transaction = use_transaction;
        self
    }

    pub fn with_length_check(mut self, check: LengthCheck) -> Self {
        self.length_check = check;
        self
    }

    pub fn is_null_manipulation_enabled(&self) -> bool {
        self.null_manipulation == NullManipulation::Convert
    }

    pub fn is_cast_enabled(&self) -> bool {
        self.cast_value_types == CastValueTypes::Cast
    }

    pub fn converts_empty_to_null(&self, column: &str) -> bool {
        self.convert_empty_values_to_null.contains(column)
    }

    pub fn skips_all_lines(&self) -> bool {
        self.number_of_ignored_lines == SKIP_ALL_LINES
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ImportOptions::default();
        assert!(!options.is_incremental);
        assert!(!options.use_timestamp);
        assert_eq!(options.number_of_ignored_lines, 0);
        assert!(options.is_null_manipulation_enabled());
        assert!(!options.is_cast_enabled());
        assert_eq!(options.dedup_strategy, DedupStrategy::TmpTable);
        assert!(options.incremental_strategy.is_none());
        assert!(!options.use_transaction);
    }

    #[test]
    fn test_partial_toml() {
        let options: ImportOptions = toml::from_str(
            r#"
is_incremental = true
convert_empty_values_to_null = ["name"]
null_manipulation = "skip"
cast_value_types = "cast"
incremental_strategy = "delete_insert"
"#,
        )
        .unwrap();
        assert!(options.is_incremental);
        assert!(options.converts_empty_to_null("name"));
        assert_eq!(options.null_manipulation, NullManipulation::Skip);
        assert!(options.is_cast_enabled());
        assert_eq!(
            options.incremental_strategy,
            Some(IncrementalStrategy::DeleteInsert)
        );
        assert_eq!(options.dedup_strategy, DedupStrategy::TmpTable);
    }

    #[test]
    fn test_skip_all_lines_sentinel() {
        assert!(ImportOptions::new().with_ignored_lines(SKIP_ALL_LINES).skips_all_lines());
        assert!(!ImportOptions::new().with_ignored_lines(1).skips_all_lines());
    }
}
