//! Loading source data into a staging table

use super::errors::{ImportResult, Phase};
use super::options::ImportOptions;
use super::runner::StatementRunner;
use super::state::ImportState;
use crate::database::Connection;
use crate::dialect::SqlDialect;
use crate::models::TableDefinition;
use crate::source::Source;

/// Stage importer
pub struct StageImporter<'a> {
    connection: &'a dyn Connection,
    dialect: &'a dyn SqlDialect,
}

impl<'a> StageImporter<'a> {
    pub fn new(connection: &'a dyn Connection, dialect: &'a dyn SqlDialect) -> Self {
        Self {
            connection,
            dialect,
        }
    }

    /// Statements that fill `staging` from `source`
    ///
    /// A file source whose lines are all skipped loads nothing.
    pub fn render_statements(
        &self,
        source: &Source,
        staging: &TableDefinition,
        options: &ImportOptions,
    ) -> ImportResult<Vec<String>> {
        match source {
            Source::File(_) if options.skips_all_lines() => {
                tracing::info!(table = %staging.name, "all source lines skipped");
                Ok(Vec::new())
            }
            Source::File(file) => self.dialect.render_file_load(file, staging, options),
            Source::Table(table) => Ok(vec![self.dialect.render_table_copy(
                &table.schema,
                &table.name,
                staging,
                &staging.column_names(),
            )]),
            Source::Query(query) => Ok(vec![self.dialect.render_insert_select(
                staging,
                &staging.column_names(),
                &query.sql,
            )]),
        }
    }

    /// Load `source` into the existing `staging` table
    ///
    /// Statements run sequentially. The row count comes from counting the
    /// staging table after the load.
    pub fn import_to_staging_table(
        &self,
        source: &Source,
        staging: &TableDefinition,
        options: &ImportOptions,
    ) -> ImportResult<ImportState> {
        let mut state = ImportState::new(staging.name.clone());
        let runner = StatementRunner::new(self.connection, self.dialect, Phase::Stage);

        state.start_timer("stage");
        let statements = self.render_statements(source, staging, options)?;
        for sql in &statements {
            runner.execute(sql)?;
        }
        state.stop_timer("stage");

        state.imported_rows_count = runner.count(staging)?;
        state.imported_columns = staging.column_names();
        tracing::info!(
            table = %staging.name,
            source = source.kind(),
            statements = statements.len(),
            rows = state.imported_rows_count,
            "staging table loaded"
        );
        Ok(state)
    }
}
