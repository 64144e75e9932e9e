//! Full load: replace the destination contents with the staging rows

use super::errors::{ImportResult, Phase, convert_exception};
use super::options::{DedupStrategy, ImportOptions};
use super::runner::StatementRunner;
use super::state::ImportState;
use super::timestamp_for;
use crate::database::Connection;
use crate::dialect::SqlDialect;
use crate::models::TableDefinition;
use crate::staging::{StagingTableFactory, TableGuard, generate_table_name};
use crate::validation::SchemaValidator;

/// Full-load importer
pub struct FullImporter<'a> {
    connection: &'a dyn Connection,
    dialect: &'a dyn SqlDialect,
}

impl<'a> FullImporter<'a> {
    pub fn new(connection: &'a dyn Connection, dialect: &'a dyn SqlDialect) -> Self {
        Self {
            connection,
            dialect,
        }
    }

    /// Replace the rows of `destination` with the (deduplicated) staging rows
    ///
    /// Values are converted before the destination is modified, so a cast
    /// failure leaves the destination as it was.
    pub fn import_to_table(
        &self,
        staging: &TableDefinition,
        destination: &TableDefinition,
        options: &ImportOptions,
        mut state: ImportState,
    ) -> ImportResult<ImportState> {
        let staging = staging.without_columns(&options.ignore_columns);
        SchemaValidator::new().validate(&staging, destination, options)?;
        let timestamp = timestamp_for(&mut state, options);
        let runner = StatementRunner::new(self.connection, self.dialect, Phase::Merge);

        state.start_timer("merge");
        if self.uses_ctas(&staging, destination, options) {
            tracing::info!(table = %destination.name, "full load using CTAS swap");
            self.import_with_ctas(&runner, &staging, destination, options, timestamp.as_deref())?;
        } else {
            tracing::info!(table = %destination.name, "full load using truncate and insert");
            self.import_with_insert(&runner, &staging, destination, options, timestamp.as_deref())?;
        }
        state.stop_timer("merge");

        state.imported_rows_count = runner.count(destination)?;
        state.table_name = destination.name.clone();
        Ok(state)
    }

    /// CTAS rebuilds the table from the select, so it is only used when the
    /// select already yields the destination types
    fn uses_ctas(
        &self,
        staging: &TableDefinition,
        destination: &TableDefinition,
        options: &ImportOptions,
    ) -> bool {
        if options.dedup_strategy != DedupStrategy::Ctas {
            return false;
        }
        if !self.dialect.supports_ctas() {
            tracing::info!(dialect = %self.dialect.kind(), "CTAS not supported, falling back");
            return false;
        }
        let same_types = staging.columns.iter().all(|c| {
            destination.column(&c.name).is_none_or(|d| {
                d.definition.type_only_sql_definition() == c.definition.type_only_sql_definition()
            })
        });
        if !options.is_cast_enabled() && !same_types {
            tracing::info!("CTAS would change column types, falling back");
            return false;
        }
        true
    }

    fn import_with_ctas(
        &self,
        runner: &StatementRunner<'_>,
        staging: &TableDefinition,
        destination: &TableDefinition,
        options: &ImportOptions,
        timestamp: Option<&str>,
    ) -> ImportResult<()> {
        let factory = StagingTableFactory::new(self.dialect);
        let target = factory.create_ctas_table_definition(destination);
        let select = self.dialect.render_ctas_select(staging, destination, options, timestamp);
        let sql = self.dialect.render_ctas(&target, &select);
        let new_table = TableGuard::create_with(self.connection, self.dialect, target.clone(), &sql)
            .map_err(|e| convert_exception(e, Phase::Merge))?;

        let mut old = destination.clone();
        old.name = generate_table_name();
        runner.execute(&self.dialect.render_rename(destination, &old.name))?;

        if let Err(e) = runner.execute(&self.dialect.render_rename(&target, &destination.name)) {
            let restore = self.dialect.render_rename(&old, &destination.name);
            if let Err(restore_error) = self.connection.execute(&restore) {
                tracing::warn!(
                    table = %destination.name,
                    backup = %old.name,
                    error = %restore_error,
                    "failed to restore destination after swap failure"
                );
            }
            return Err(e);
        }
        new_table.release();
        drop(TableGuard::new(self.connection, self.dialect, old));
        tracing::info!(table = %destination.name, "destination swapped");
        Ok(())
    }

    fn import_with_insert(
        &self,
        runner: &StatementRunner<'_>,
        staging: &TableDefinition,
        destination: &TableDefinition,
        options: &ImportOptions,
        timestamp: Option<&str>,
    ) -> ImportResult<()> {
        let factory = StagingTableFactory::new(self.dialect);
        let needs_prepare = !destination.primary_keys.is_empty() || options.is_cast_enabled();

        let _prepared_guard;
        let source = if needs_prepare {
            let prepared = factory.create_prepared_table_definition(staging, destination);
            _prepared_guard = TableGuard::create(self.connection, self.dialect, prepared.clone())?;
            let select = self.dialect.render_merge_select(staging, destination, options, None);
            runner.execute(&self.dialect.render_insert_select(
                &prepared,
                &prepared.column_names(),
                &select,
            ))?;
            prepared
        } else {
            staging.clone()
        };

        let statements = vec![
            self.dialect.render_truncate(destination),
            self.dialect.render_insert_all(&source, destination, options, timestamp),
        ];
        runner.run(options, &statements)
    }
}
