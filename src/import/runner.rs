//! Sequential statement execution with error conversion

use super::errors::{ImportResult, Phase, convert_exception};
use super::options::ImportOptions;
use crate::database::Connection;
use crate::dialect::SqlDialect;
use crate::models::TableDefinition;

/// Runs statements one by one on a caller-held connection
pub(crate) struct StatementRunner<'a> {
    connection: &'a dyn Connection,
    dialect: &'a dyn SqlDialect,
    phase: Phase,
}

impl<'a> StatementRunner<'a> {
    pub(crate) fn new(connection: &'a dyn Connection, dialect: &'a dyn SqlDialect, phase: Phase) -> Self {
        Self {
            connection,
            dialect,
            phase,
        }
    }

    pub(crate) fn execute(&self, sql: &str) -> ImportResult<()> {
        tracing::debug!(sql = %sql, "executing statement");
        self.connection
            .execute(sql)
            .map(|_| ())
            .map_err(|e| convert_exception(e, self.phase))
    }

    pub(crate) fn count(&self, table: &TableDefinition) -> ImportResult<u64> {
        let sql = self.dialect.render_row_count(table);
        tracing::debug!(sql = %sql, "counting rows");
        self.connection
            .fetch_count(&sql)
            .map_err(|e| convert_exception(e, self.phase))
    }

    /// Execute destination-mutating statements, wrapped in a transaction when
    /// `use_transaction` is set
    ///
    /// The first failure stops the sequence. Inside a transaction a rollback
    /// is attempted before the error is returned.
    pub(crate) fn run(&self, options: &ImportOptions, statements: &[String]) -> ImportResult<()> {
        if !options.use_transaction {
            return statements.iter().try_for_each(|sql| self.execute(sql));
        }

        if let Some(begin) = self.dialect.render_begin_transaction() {
            self.execute(&begin)?;
        }
        let result = statements
            .iter()
            .try_for_each(|sql| self.execute(sql))
            .and_then(|()| self.execute(&self.dialect.render_commit_transaction()));
        if result.is_err() {
            let rollback = self.dialect.render_rollback_transaction();
            if let Err(e) = self.connection.execute(&rollback) {
                tracing::warn!(error = %e, "rollback failed");
            }
        }
        result
    }
}
