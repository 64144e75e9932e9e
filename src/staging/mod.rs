//! Staging table factory
//!
//! Derives the shapes of every intermediate table an import creates: the
//! staging table itself, the dedup table used by incremental loads, the
//! destination-typed table used to convert values before a full load
//! touches the destination, and the durable table built by CTAS.

pub mod guard;

pub use guard::TableGuard;

use crate::datatype::catalog_for;
use crate::dialect::SqlDialect;
use crate::models::{ColumnDefinition, TableDefinition, TableDistribution, TableIndexType};
use uuid::Uuid;

/// Prefix of generated intermediate table names
pub const TEMP_TABLE_PREFIX: &str = "__temp_";

/// Generate a unique intermediate table name
pub fn generate_table_name() -> String {
    format!("{}{}", TEMP_TABLE_PREFIX, Uuid::new_v4().simple())
}

/// Builds intermediate table definitions for one dialect
pub struct StagingTableFactory<'a> {
    dialect: &'a dyn SqlDialect,
}

impl<'a> StagingTableFactory<'a> {
    pub fn new(dialect: &'a dyn SqlDialect) -> Self {
        Self { dialect }
    }

    fn temporary_name(&self) -> String {
        self.dialect.temporary_table_name(&generate_table_name())
    }

    fn max_string_column(&self, name: &str) -> ColumnDefinition {
        ColumnDefinition::new(name, catalog_for(self.dialect.kind()).max_string_type())
    }

    /// Staging table for `source_columns` in the destination schema
    ///
    /// With `typed`, columns present in the destination take its type
    /// (nullable, without default); every other column is the dialect's
    /// widest string type. Staging never declares primary keys.
    pub fn create_staging_table_definition(
        &self,
        destination: &TableDefinition,
        source_columns: &[String],
        typed: bool,
    ) -> TableDefinition {
        let columns = source_columns
            .iter()
            .map(|name| match destination.column(name) {
                Some(column) if typed => {
                    ColumnDefinition::new(name.clone(), column.definition.relaxed())
                }
                _ => self.max_string_column(name),
            })
            .collect();
        let table = TableDefinition::new(destination.schema.clone(), self.temporary_name(), columns)
            .temporary(true);
        self.with_staging_layout(table, destination)
    }

    /// Staging table where every column is the widest string type
    pub fn create_varchar_staging_table_definition(
        &self,
        schema: &str,
        columns: &[String],
    ) -> TableDefinition {
        let columns = columns.iter().map(|c| self.max_string_column(c)).collect();
        TableDefinition::new(schema, self.temporary_name(), columns).temporary(true)
    }

    /// Same shape as `staging` under a new name, without layout hints
    pub fn create_dedup_table_definition(&self, staging: &TableDefinition) -> TableDefinition {
        let mut table = TableDefinition::new(
            staging.schema.clone(),
            self.temporary_name(),
            staging.columns.clone(),
        )
        .temporary(true);
        table.distribution = staging.distribution;
        table.distribution_columns = staging.distribution_columns.clone();
        table.index = staging.index;
        table
    }

    /// Temporary table with the staging columns typed like the destination
    ///
    /// Values are cast into it before the destination is truncated, so a
    /// conversion failure leaves the destination untouched.
    pub fn create_prepared_table_definition(
        &self,
        staging: &TableDefinition,
        destination: &TableDefinition,
    ) -> TableDefinition {
        let columns = staging
            .columns
            .iter()
            .map(|c| match destination.column(&c.name) {
                Some(column) => ColumnDefinition::new(c.name.clone(), column.definition.relaxed()),
                None => c.clone(),
            })
            .collect();
        let table = TableDefinition::new(destination.schema.clone(), self.temporary_name(), columns)
            .temporary(true);
        self.with_staging_layout(table, destination)
    }

    /// Durable table that replaces the destination after a CTAS load
    pub fn create_ctas_table_definition(&self, destination: &TableDefinition) -> TableDefinition {
        let mut table = destination.clone();
        table.name = generate_table_name();
        table.temporary = false;
        table
    }

    /// Synapse staging keeps the destination hash distribution when the
    /// distribution columns are loaded and is always a heap
    fn with_staging_layout(
        &self,
        mut table: TableDefinition,
        destination: &TableDefinition,
    ) -> TableDefinition {
        let Some(distribution) = destination.distribution else {
            return table;
        };
        let columns_present = destination
            .distribution_columns
            .iter()
            .all(|c| table.has_column(c));
        if distribution == TableDistribution::Hash && columns_present {
            table.distribution = Some(TableDistribution::Hash);
            table.distribution_columns = destination.distribution_columns.clone();
        } else if distribution == TableDistribution::Hash {
            table.distribution = Some(TableDistribution::RoundRobin);
        } else {
            table.distribution = Some(distribution);
        }
        table.index = Some(TableIndexType::Heap);
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatype::TypeDefinition;
    use crate::dialect::{SnowflakeDialect, SynapseDialect};
    use crate::models::DialectKind;

    fn destination(dialect: DialectKind, type_name: &str) -> TableDefinition {
        TableDefinition::new(
            "s",
            "accounts",
            vec![
                ColumnDefinition::new(
                    "id",
                    TypeDefinition::new(dialect, "INT", None).unwrap().nullable(false),
                ),
                ColumnDefinition::new("name", TypeDefinition::new(dialect, type_name, None).unwrap()),
            ],
        )
        .with_primary_keys(["id"])
    }

    #[test]
    fn test_staging_is_temporary_and_keyless() {
        let factory = StagingTableFactory::new(&SnowflakeDialect);
        let dest = destination(DialectKind::Snowflake, "VARCHAR");
        let staging = factory.create_staging_table_definition(
            &dest,
            &["name".to_string(), "id".to_string()],
            false,
        );
        assert!(staging.temporary);
        assert!(staging.primary_keys.is_empty());
        assert!(staging.name.starts_with(TEMP_TABLE_PREFIX));
        assert_eq!(staging.column_names(), vec!["name", "id"]);
        assert!(staging.columns.iter().all(|c| c.is_string()));
    }

    #[test]
    fn test_typed_staging_relaxes_destination_types() {
        let factory = StagingTableFactory::new(&SnowflakeDialect);
        let dest = destination(DialectKind::Snowflake, "VARCHAR");
        let staging = factory.create_staging_table_definition(
            &dest,
            &["id".to_string(), "extra".to_string()],
            true,
        );
        let id = staging.column("id").unwrap();
        assert_eq!(id.definition.type_name(), "INT");
        assert!(id.definition.is_nullable());
        assert!(staging.column("extra").unwrap().is_string());
    }

    #[test]
    fn test_synapse_names_and_layout() {
        let factory = StagingTableFactory::new(&SynapseDialect);
        let dest = destination(DialectKind::Synapse, "NVARCHAR")
            .with_distribution(TableDistribution::Hash, vec!["id".into()]);

        let staging = factory.create_staging_table_definition(&dest, &["id".to_string()], false);
        assert!(staging.name.starts_with("#__temp_"));
        assert_eq!(staging.distribution, Some(TableDistribution::Hash));
        assert_eq!(staging.index, Some(TableIndexType::Heap));

        let staging = factory.create_staging_table_definition(&dest, &["name".to_string()], false);
        assert_eq!(staging.distribution, Some(TableDistribution::RoundRobin));
    }

    #[test]
    fn test_unique_names() {
        let factory = StagingTableFactory::new(&SnowflakeDialect);
        let a = factory.create_varchar_staging_table_definition("s", &["a".to_string()]);
        let b = factory.create_dedup_table_definition(&a);
        assert_ne!(a.name, b.name);
        assert_eq!(a.columns, b.columns);
    }

    #[test]
    fn test_ctas_table_is_durable() {
        let factory = StagingTableFactory::new(&SynapseDialect);
        let dest = destination(DialectKind::Synapse, "NVARCHAR");
        let ctas = factory.create_ctas_table_definition(&dest);
        assert!(!ctas.temporary);
        assert!(!ctas.name.starts_with('#'));
        assert_eq!(ctas.columns, dest.columns);
    }
}
