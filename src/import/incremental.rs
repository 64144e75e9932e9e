//! Incremental load: merge staging rows into existing destination rows

use super::errors::{ImportResult, Phase};
use super::options::{ImportOptions, IncrementalStrategy};
use super::runner::StatementRunner;
use super::state::ImportState;
use super::timestamp_for;
use crate::database::Connection;
use crate::dialect::SqlDialect;
use crate::models::TableDefinition;
use crate::staging::{StagingTableFactory, TableGuard};
use crate::validation::SchemaValidator;

/// Incremental importer
pub struct IncrementalImporter<'a> {
    connection: &'a dyn Connection,
    dialect: &'a dyn SqlDialect,
}

impl<'a> IncrementalImporter<'a> {
    pub fn new(connection: &'a dyn Connection, dialect: &'a dyn SqlDialect) -> Self {
        Self {
            connection,
            dialect,
        }
    }

    /// Strategy used for `options` on this dialect
    ///
    /// An explicit update-insert request falls back to delete-insert on
    /// dialects without `UPDATE … FROM`.
    pub fn strategy(&self, options: &ImportOptions) -> IncrementalStrategy {
        match options.incremental_strategy {
            Some(IncrementalStrategy::UpdateInsert) if !self.dialect.supports_update_from() => {
                tracing::warn!(
                    dialect = %self.dialect.kind(),
                    "UPDATE FROM not supported, using delete-insert"
                );
                IncrementalStrategy::DeleteInsert
            }
            Some(strategy) => strategy,
            None => self.dialect.default_incremental_strategy(),
        }
    }

    /// Merge `staging` into `destination`; staging wins on key conflicts
    ///
    /// Without primary keys every staging row is appended.
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
        if destination.primary_keys.is_empty() {
            tracing::info!(table = %destination.name, "no primary key, appending rows");
            state.imported_rows_count = runner.count(&staging)?;
            let insert =
                self.dialect
                    .render_insert_all(&staging, destination, options, timestamp.as_deref());
            runner.run(options, &[insert])?;
        } else {
            let factory = StagingTableFactory::new(self.dialect);
            let dedup = factory.create_dedup_table_definition(&staging);
            let _dedup_guard = TableGuard::create(self.connection, self.dialect, dedup.clone())?;
            runner.execute(&self.dialect.render_dedup_insert(
                &staging,
                &dedup,
                &destination.primary_keys,
            ))?;
            state.imported_rows_count = runner.count(&dedup)?;

            let strategy = self.strategy(options);
            tracing::info!(table = %destination.name, ?strategy, "merging deduplicated rows");
            let mut statements = Vec::new();
            match strategy {
                IncrementalStrategy::UpdateInsert => {
                    statements.extend(self.dialect.render_update_with_primary_key(
                        &dedup,
                        destination,
                        options,
                        timestamp.as_deref(),
                    ));
                    statements.push(
                        self.dialect
                            .render_delete_from_source(&dedup, destination, options),
                    );
                }
                IncrementalStrategy::DeleteInsert => {
                    statements.push(
                        self.dialect
                            .render_delete_from_destination(&dedup, destination, options),
                    );
                }
            }
            statements.push(self.dialect.render_insert_all(
                &dedup,
                destination,
                options,
                timestamp.as_deref(),
            ));
            runner.run(options, &statements)?;
        }
        state.stop_timer("merge");

        state.table_name = destination.name.clone();
        Ok(state)
    }
}
