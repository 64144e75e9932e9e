//! Exasol statements

use super::synapse::null_safe_difference;
use super::{SqlDialect, TableRef, split_common_prefix};
use crate::import::{ImportError, ImportOptions, ImportResult};
use crate::models::{DialectKind, TableDefinition};
use crate::source::{FileLayout, FileSource};

#[derive(Debug, Clone, Copy, Default)]
pub struct ExasolDialect;

impl SqlDialect for ExasolDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::Exasol
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    fn file_chunk_size(&self) -> usize {
        32
    }

    fn render_rename(&self, table: &TableDefinition, new_name: &str) -> String {
        format!(
            "RENAME TABLE {} TO {}",
            self.table_name(table),
            self.quote_table(&table.schema, new_name)
        )
    }

    // Transactions start implicitly with the first statement.
    fn render_begin_transaction(&self) -> Option<String> {
        None
    }

    fn render_cast_to_string(&self, expr: &str) -> String {
        format!("CAST({} AS VARCHAR(2000000))", expr)
    }

    fn render_is_distinct(&self, left: &str, right: &str) -> String {
        null_safe_difference(left, right, self.not_equal_operator())
    }

    fn render_update(
        &self,
        destination: &TableRef,
        source: &TableRef,
        set: &str,
        condition: &str,
    ) -> String {
        format!(
            "UPDATE {} SET {} FROM {}, {} WHERE {}",
            destination.from, set, source.from, destination.from, condition
        )
    }

    fn render_file_load(
        &self,
        source: &FileSource,
        staging: &TableDefinition,
        options: &ImportOptions,
    ) -> ImportResult<Vec<String>> {
        if source.layout == FileLayout::Folder {
            return Err(ImportError::UnsupportedSource {
                kind: "folder".to_string(),
                dialect: self.kind().to_string(),
            });
        }

        let csv = &source.csv;
        let mut format = Vec::new();
        if options.number_of_ignored_lines > 0 {
            format.push(format!("SKIP={}", options.number_of_ignored_lines));
        }
        format.push(format!("COLUMN SEPARATOR={}", self.quote_string(&csv.delimiter)));
        if let Some(enclosure) = &csv.enclosure {
            format.push(format!("COLUMN DELIMITER={}", self.quote_string(enclosure)));
        }
        let format = format.join(" ");

        let (prefix, files) = split_common_prefix(&source.files());
        let target = self.table_name(staging);
        Ok(files
            .chunks(self.file_chunk_size())
            .map(|chunk| {
                let files = chunk
                    .iter()
                    .map(|f| format!("FILE {}", self.quote_string(f)))
                    .collect::<Vec<_>>()
                    .join(" ");
                format!(
                    "IMPORT INTO {} FROM CSV AT {} {} {}",
                    target,
                    self.quote_string(&prefix),
                    files,
                    format
                )
            })
            .collect())
    }
}
