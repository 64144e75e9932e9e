//! Teradata statements
//!
//! Tables are created `MULTISET` so duplicate rows are kept until the dedup
//! step removes them. File sources are not supported; stage from a table or
//! a query instead.

use super::synapse::null_safe_difference;
use super::{SqlDialect, TableRef};
use crate::models::{DialectKind, TableDefinition};

#[derive(Debug, Clone, Copy, Default)]
pub struct TeradataDialect;

impl SqlDialect for TeradataDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::Teradata
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    fn create_table_keyword(&self, _temporary: bool) -> &'static str {
        "CREATE MULTISET TABLE"
    }

    fn render_drop_if_exists(&self, table: &TableDefinition) -> String {
        format!("DROP TABLE {}", self.table_name(table))
    }

    fn render_truncate(&self, table: &TableDefinition) -> String {
        format!("DELETE {} ALL", self.table_name(table))
    }

    fn render_rename(&self, table: &TableDefinition, new_name: &str) -> String {
        format!(
            "RENAME TABLE {} TO {}",
            self.table_name(table),
            self.quote_table(&table.schema, new_name)
        )
    }

    fn render_ctas(&self, target: &TableDefinition, select: &str) -> String {
        format!(
            "{} {} AS ({}) WITH DATA",
            self.create_table_keyword(target.temporary),
            self.table_name(target),
            select
        )
    }

    fn render_begin_transaction(&self) -> Option<String> {
        Some("BT".to_string())
    }

    fn render_commit_transaction(&self) -> String {
        "ET".to_string()
    }

    fn render_cast_to_string(&self, expr: &str) -> String {
        format!("CAST({} AS VARCHAR(32000))", expr)
    }

    fn render_empty_to_null(&self, expr: &str) -> String {
        format!("CASE WHEN {} = '' THEN NULL ELSE {} END", expr, expr)
    }

    fn not_equal_operator(&self) -> &'static str {
        "<>"
    }

    fn render_is_distinct(&self, left: &str, right: &str) -> String {
        null_safe_difference(left, right, self.not_equal_operator())
    }

    fn table_reference(&self, table: &TableDefinition, _alias: &str) -> TableRef {
        let name = self.table_name(table);
        TableRef {
            from: name.clone(),
            reference: name,
        }
    }

    fn render_update(
        &self,
        destination: &TableRef,
        source: &TableRef,
        set: &str,
        condition: &str,
    ) -> String {
        format!(
            "UPDATE {} FROM {} SET {} WHERE {}",
            destination.from, source.from, set, condition
        )
    }
}
