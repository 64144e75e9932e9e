//! Table model
//!
//! A [`TableDefinition`] describes either a destination table (described in
//! YAML or reflected from DDL) or a staging table derived from one.

use super::column::{ColumnDefinition, TIMESTAMP_COLUMN};
use super::enums::{DialectKind, TableDistribution, TableIndexType};
use crate::datatype::{DefinitionError, TypeDefinition};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Errors raised while building or checking a table definition
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("Table \"{0}\" has no columns")]
    NoColumns(String),

    #[error("Duplicate column name \"{0}\"")]
    DuplicateColumn(String),

    #[error("Primary key column \"{0}\" is not a column of the table")]
    UnknownPrimaryKey(String),

    #[error("Distribution column \"{0}\" is not a column of the table")]
    UnknownDistributionColumn(String),

    #[error("Column \"{column}\": {source}")]
    Column {
        column: String,
        #[source]
        source: DefinitionError,
    },

    #[error("Failed to parse table definition: {0}")]
    Parse(String),
}

/// Table shape: identity, ordered columns, keys and MPP layout hints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDefinition {
    pub schema: String,
    pub name: String,
    #[serde(default)]
    pub temporary: bool,
    pub columns: Vec<ColumnDefinition>,
    #[serde(default)]
    pub primary_keys: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distribution: Option<TableDistribution>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub distribution_columns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<TableIndexType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub index_columns: Vec<String>,
}

impl TableDefinition {
    pub fn new(
        schema: impl Into<String>,
        name: impl Into<String>,
        columns: Vec<ColumnDefinition>,
    ) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
            temporary: false,
            columns,
            primary_keys: Vec::new(),
            distribution: None,
            distribution_columns: Vec::new(),
            index: None,
            index_columns: Vec::new(),
        }
    }

    pub fn temporary(mut self, temporary: bool) -> Self {
        self.temporary = temporary;
        self
    }

    pub fn with_primary_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_distribution(mut self, distribution: TableDistribution, columns: Vec<String>) -> Self {
        self.distribution = Some(distribution);
        self.distribution_columns = columns;
        self
    }

    pub fn with_index(mut self, index: TableIndexType, columns: Vec<String>) -> Self {
        self.index = Some(index);
        self.index_columns = columns;
        self
    }

    /// Column names in table order
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Whether the reserved `_timestamp` column is present
    pub fn has_timestamp_column(&self) -> bool {
        self.has_column(TIMESTAMP_COLUMN)
    }

    /// Columns excluding the reserved `_timestamp` column
    pub fn data_columns(&self) -> impl Iterator<Item = &ColumnDefinition> {
        self.columns.iter().filter(|c| !c.is_timestamp())
    }

    /// Whether `name` is one of the primary key columns
    pub fn is_primary_key(&self, name: &str) -> bool {
        self.primary_keys.iter().any(|k| k == name)
    }

    /// Same table without the named columns; keys on removed columns are
    /// dropped too
    pub fn without_columns<'a, I>(&self, names: I) -> Self
    where
        I: IntoIterator<Item = &'a String>,
    {
        let removed: HashSet<&str> = names.into_iter().map(String::as_str).collect();
        let mut table = self.clone();
        table.columns.retain(|c| !removed.contains(c.name.as_str()));
        table.primary_keys.retain(|k| !removed.contains(k.as_str()));
        table
    }

    /// Dialect of the column types, if the table has any columns
    pub fn dialect(&self) -> Option<DialectKind> {
        self.columns.first().map(|c| c.definition.dialect())
    }

    /// Check structural invariants: columns present and unique, keys and
    /// distribution columns referencing existing columns.
    pub fn validate(&self) -> Result<(), TableError> {
        if self.columns.is_empty() {
            return Err(TableError::NoColumns(self.name.clone()));
        }
        let mut seen = HashSet::new();
        for column in &self.columns {
            if !seen.insert(column.name.as_str()) {
                return Err(TableError::DuplicateColumn(column.name.clone()));
            }
        }
        if let Some(key) = self.primary_keys.iter().find(|k| !seen.contains(k.as_str())) {
            return Err(TableError::UnknownPrimaryKey(key.clone()));
        }
        if let Some(column) = self
            .distribution_columns
            .iter()
            .chain(&self.index_columns)
            .find(|c| !seen.contains(c.as_str()))
        {
            return Err(TableError::UnknownDistributionColumn(column.clone()));
        }
        Ok(())
    }

    /// Parse a table definition from YAML
    ///
    /// # Example
    ///
    /// ```rust
    /// use staged_import_sdk::models::{DialectKind, TableDefinition};
    ///
    /// let yaml = r#"
    /// schema: PUBLIC
    /// name: accounts
    /// primary_keys: [id]
    /// columns:
    ///   - name: id
    ///     type: INTEGER
    ///     nullable: false
    ///   - name: name
    ///     type: VARCHAR
    ///     length: 255
    /// "#;
    /// let table = TableDefinition::from_yaml(yaml, DialectKind::Snowflake).unwrap();
    /// assert_eq!(table.column_names(), vec!["id", "name"]);
    /// ```
    pub fn from_yaml(yaml: &str, dialect: DialectKind) -> Result<Self, TableError> {
        let raw: RawTable =
            serde_yaml::from_str(yaml).map_err(|e| TableError::Parse(e.to_string()))?;

        let mut columns = Vec::with_capacity(raw.columns.len());
        for column in raw.columns {
            let length = column.length.map(LengthValue::into_string);
            let definition = TypeDefinition::new(dialect, &column.type_name, length.as_deref())
                .map_err(|source| TableError::Column {
                    column: column.name.clone(),
                    source,
                })?
                .nullable(column.nullable)
                .with_default(column.default);
            columns.push(ColumnDefinition::new(column.name, definition));
        }

        let table = TableDefinition {
            schema: raw.schema,
            name: raw.name,
            temporary: false,
            columns,
            primary_keys: raw.primary_keys,
            distribution: raw.distribution,
            distribution_columns: raw.distribution_columns,
            index: raw.index,
            index_columns: raw.index_columns,
        };
        table.validate()?;
        Ok(table)
    }
}

fn default_nullable() -> bool {
    true
}

/// Lengths may be written as `255` or `"38,2"`
#[derive(Deserialize)]
#[serde(untagged)]
enum LengthValue {
    Number(u64),
    Text(String),
}

impl LengthValue {
    fn into_string(self) -> String {
        match self {
            LengthValue::Number(n) => n.to_string(),
            LengthValue::Text(s) => s,
        }
    }
}

#[derive(Deserialize)]
struct RawColumn {
    name: String,
    #[serde(rename = "type")]
    type_name: String,
    #[serde(default)]
    length: Option<LengthValue>,
    #[serde(default = "default_nullable")]
    nullable: bool,
    #[serde(default)]
    default: Option<String>,
}

#[derive(Deserialize)]
struct RawTable {
    #[serde(default)]
    schema: String,
    name: String,
    columns: Vec<RawColumn>,
    #[serde(default)]
    primary_keys: Vec<String>,
    #[serde(default)]
    distribution: Option<TableDistribution>,
    #[serde(default)]
    distribution_columns: Vec<String>,
    #[serde(default)]
    index: Option<TableIndexType>,
    #[serde(default)]
    index_columns: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn varchar(name: &str) -> ColumnDefinition {
        ColumnDefinition::new(
            name,
            TypeDefinition::new(DialectKind::Snowflake, "VARCHAR", None).unwrap(),
        )
    }

    #[test]
    fn test_validate_duplicate_columns() {
        let table = TableDefinition::new("s", "t", vec![varchar("a"), varchar("a")]);
        assert!(matches!(table.validate(), Err(TableError::DuplicateColumn(c)) if c == "a"));
    }

    #[test]
    fn test_validate_unknown_primary_key() {
        let table = TableDefinition::new("s", "t", vec![varchar("a")]).with_primary_keys(["b"]);
        assert!(matches!(table.validate(), Err(TableError::UnknownPrimaryKey(k)) if k == "b"));
    }

    #[test]
    fn test_validate_no_columns() {
        let table = TableDefinition::new("s", "t", Vec::new());
        assert!(matches!(table.validate(), Err(TableError::NoColumns(_))));
    }

    #[test]
    fn test_data_columns_skip_timestamp() {
        let table = TableDefinition::new("s", "t", vec![varchar("a"), varchar("_timestamp")]);
        assert!(table.has_timestamp_column());
        let names: Vec<&str> = table.data_columns().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["a"]);
    }

    #[test]
    fn test_from_yaml_with_layout_hints() {
        let yaml = r#"
schema: dbo
name: accounts
primary_keys: [id]
distribution: HASH
distribution_columns: [id]
index: CLUSTERED_INDEX
index_columns: [id]
columns:
  - name: id
    type: INT
    nullable: false
  - name: amount
    type: DECIMAL
    length: "18,2"
"#;
        let table = TableDefinition::from_yaml(yaml, DialectKind::Synapse).unwrap();
        assert_eq!(table.schema, "dbo");
        assert_eq!(table.distribution, Some(TableDistribution::Hash));
        assert_eq!(table.index, Some(TableIndexType::ClusteredIndex));
        assert!(!table.columns[0].definition.is_nullable());
        assert_eq!(table.columns[1].definition.sql_definition(), "DECIMAL(18,2)");
    }

    #[test]
    fn test_from_yaml_invalid_type() {
        let yaml = "name: t\ncolumns:\n  - name: a\n    type: NOPE\n";
        let err = TableDefinition::from_yaml(yaml, DialectKind::Snowflake).unwrap_err();
        assert_eq!(err.to_string(), "Column \"a\": 'NOPE' is not a valid type");
    }
}
