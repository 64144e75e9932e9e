//! Drop guard for intermediate tables

use crate::database::Connection;
use crate::dialect::SqlDialect;
use crate::import::{ImportError, ImportResult};
use crate::models::TableDefinition;

/// Owns an intermediate table and drops it when going out of scope
///
/// The drop runs on every exit path. A failed drop is logged, never raised.
pub struct TableGuard<'a> {
    connection: &'a dyn Connection,
    dialect: &'a dyn SqlDialect,
    table: Option<TableDefinition>,
}

impl<'a> TableGuard<'a> {
    /// Guard a table that already exists
    pub fn new(
        connection: &'a dyn Connection,
        dialect: &'a dyn SqlDialect,
        table: TableDefinition,
    ) -> Self {
        Self {
            connection,
            dialect,
            table: Some(table),
        }
    }

    /// Create `table` and guard it
    pub fn create(
        connection: &'a dyn Connection,
        dialect: &'a dyn SqlDialect,
        table: TableDefinition,
    ) -> ImportResult<Self> {
        let sql = dialect.render_create_table(&table);
        tracing::debug!(sql = %sql, "creating table");
        connection.execute(&sql).map_err(ImportError::Database)?;
        tracing::info!(table = %table.name, "created intermediate table");
        Ok(Self::new(connection, dialect, table))
    }

    /// Guard a table whose creation is the given statement
    pub fn create_with(
        connection: &'a dyn Connection,
        dialect: &'a dyn SqlDialect,
        table: TableDefinition,
        sql: &str,
    ) -> Result<Self, crate::database::DatabaseError> {
        tracing::debug!(sql = %sql, "creating table");
        connection.execute(sql)?;
        Ok(Self::new(connection, dialect, table))
    }

    pub fn table(&self) -> Option<&TableDefinition> {
        self.table.as_ref()
    }

    /// Stop guarding the table and hand it back
    pub fn release(mut self) -> Option<TableDefinition> {
        self.table.take()
    }
}

impl Drop for TableGuard<'_> {
    fn drop(&mut self) {
        let Some(table) = self.table.take() else {
            return;
        };
        let sql = self.dialect.render_drop_if_exists(&table);
        tracing::debug!(sql = %sql, "dropping table");
        if let Err(e) = self.connection.execute(&sql) {
            tracing::warn!(table = %table.name, error = %e, "failed to drop intermediate table");
        }
    }
}
