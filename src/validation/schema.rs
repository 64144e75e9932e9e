//! Staging/destination schema validation
//!
//! Runs before any destination-mutating statement. Checks go from coarse to
//! fine and stop at the first violation.

use crate::import::ImportOptions;
use crate::models::{TIMESTAMP_COLUMN, TableDefinition};
use serde::{Deserialize, Serialize};

/// Staging and destination tables are not compatible
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum ColumnsMismatchError {
    #[error(
        "Tables don't have same number of columns. Source columns: \"{source_columns}\", Destination columns: \"{destination_columns}\""
    )]
    ColumnCount {
        source_columns: String,
        destination_columns: String,
    },

    #[error("Source destination columns name mismatch. \"{source_column}\"->\"{destination_column}\"")]
    ColumnName {
        source_column: String,
        destination_column: String,
    },

    #[error(
        "Primary keys do not match between source and destination tables. Source: \"{source_keys}\", Destination: \"{destination_keys}\""
    )]
    PrimaryKeys {
        source_keys: String,
        destination_keys: String,
    },

    #[error(
        "Source destination columns mismatch. \"{column} {source_definition}\"->\"{column} {destination_definition}\""
    )]
    ColumnDefinition {
        column: String,
        source_definition: String,
        destination_definition: String,
    },
}

/// Schema validator
#[derive(Debug, Default)]
pub struct SchemaValidator;

impl SchemaValidator {
    /// Create a new schema validator
    ///
    /// # Example
    ///
    /// ```rust
    /// use staged_import_sdk::validation::SchemaValidator;
    ///
    /// let validator = SchemaValidator::new();
    /// ```
    pub fn new() -> Self {
        Self
    }

    /// Check that `staging` can be merged into `destination`
    ///
    /// The reserved `_timestamp` column is ignored on both sides. Primary keys
    /// are compared only when `staging` declares some. Column types are
    /// compared only when `require_same_tables` is set.
    pub fn validate(
        &self,
        staging: &TableDefinition,
        destination: &TableDefinition,
        options: &ImportOptions,
    ) -> Result<(), ColumnsMismatchError> {
        let source_columns = data_column_names(staging);
        let destination_columns = data_column_names(destination);

        if source_columns.len() != destination_columns.len() {
            return Err(ColumnsMismatchError::ColumnCount {
                source_columns: source_columns.join(","),
                destination_columns: destination_columns.join(","),
            });
        }

        if let Some((source_column, destination_column)) = source_columns
            .iter()
            .zip(&destination_columns)
            .find(|(s, d)| s != d)
        {
            return Err(ColumnsMismatchError::ColumnName {
                source_column: source_column.to_string(),
                destination_column: destination_column.to_string(),
            });
        }

        if !staging.primary_keys.is_empty() {
            check_primary_keys(&staging.primary_keys, &destination.primary_keys)?;
        }

        if options.require_same_tables {
            for source in staging.data_columns() {
                let Some(destination) = destination.column(&source.name) else {
                    continue;
                };
                if !source
                    .definition
                    .is_compatible_with(&destination.definition, options.length_check)
                {
                    return Err(ColumnsMismatchError::ColumnDefinition {
                        column: source.name.clone(),
                        source_definition: source.definition.type_only_sql_definition(),
                        destination_definition: destination.definition.type_only_sql_definition(),
                    });
                }
            }
        }

        Ok(())
    }
}

/// Order-insensitive primary key comparison
pub fn check_primary_keys(
    source_keys: &[String],
    destination_keys: &[String],
) -> Result<(), ColumnsMismatchError> {
    let mut source_sorted = source_keys.to_vec();
    let mut destination_sorted = destination_keys.to_vec();
    source_sorted.sort();
    destination_sorted.sort();
    if source_sorted != destination_sorted {
        return Err(ColumnsMismatchError::PrimaryKeys {
            source_keys: source_keys.join(","),
            destination_keys: destination_keys.join(","),
        });
    }
    Ok(())
}

fn data_column_names(table: &TableDefinition) -> Vec<&str> {
    table
        .columns
        .iter()
        .map(|c| c.name.as_str())
        .filter(|name| *name != TIMESTAMP_COLUMN)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatype::{LengthCheck, TypeDefinition};
    use crate::models::{ColumnDefinition, DialectKind};

    fn column(name: &str, type_name: &str, length: Option<&str>) -> ColumnDefinition {
        ColumnDefinition::new(
            name,
            TypeDefinition::new(DialectKind::Snowflake, type_name, length).unwrap(),
        )
    }

    fn table(columns: Vec<ColumnDefinition>) -> TableDefinition {
        TableDefinition::new("s", "t", columns)
    }

    #[test]
    fn test_timestamp_column_is_ignored() {
        let staging = table(vec![column("a", "VARCHAR", None)]);
        let destination = table(vec![
            column("a", "VARCHAR", None),
            column("_timestamp", "TIMESTAMP", None),
        ]);
        assert!(
            SchemaValidator::new()
                .validate(&staging, &destination, &ImportOptions::default())
                .is_ok()
        );
    }

    #[test]
    fn test_count_reported_before_types() {
        let staging = table(vec![column("a", "NUMBER", None)]);
        let destination = table(vec![column("a", "VARCHAR", None), column("b", "VARCHAR", None)]);
        let options = ImportOptions::default().require_same_tables(true);
        let err = SchemaValidator::new()
            .validate(&staging, &destination, &options)
            .unwrap_err();
        assert!(matches!(err, ColumnsMismatchError::ColumnCount { .. }));
    }

    #[test]
    fn test_length_check_modes() {
        let staging = table(vec![column("a", "VARCHAR", Some("10"))]);
        let destination = table(vec![column("a", "VARCHAR", Some("20"))]);
        let exact = ImportOptions::default().require_same_tables(true);
        let widening = exact.clone().with_length_check(LengthCheck::Widening);
        let validator = SchemaValidator::new();

        let err = validator.validate(&staging, &destination, &exact).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Source destination columns mismatch. \"a VARCHAR (10)\"->\"a VARCHAR (20)\""
        );
        assert!(validator.validate(&staging, &destination, &widening).is_ok());
    }

    #[test]
    fn test_check_primary_keys_is_order_insensitive() {
        let a = vec!["x".to_string(), "y".to_string()];
        let b = vec!["y".to_string(), "x".to_string()];
        assert!(check_primary_keys(&a, &b).is_ok());
        assert!(check_primary_keys(&a, &a[..1]).is_err());
    }
}
