//! BigQuery statements

use super::SqlDialect;
use crate::import::{ImportOptions, ImportResult};
use crate::models::{DialectKind, TableDefinition};
use crate::source::{FileLayout, FileSource};

#[derive(Debug, Clone, Copy, Default)]
pub struct BigqueryDialect;

impl SqlDialect for BigqueryDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::Bigquery
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("`{}`", name.replace('`', "\\`"))
    }

    fn quote_string(&self, value: &str) -> String {
        format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
    }

    fn supports_update_from(&self) -> bool {
        false
    }

    fn render_commit_transaction(&self) -> String {
        "COMMIT TRANSACTION".to_string()
    }

    fn render_rollback_transaction(&self) -> String {
        "ROLLBACK TRANSACTION".to_string()
    }

    fn render_rename(&self, table: &TableDefinition, new_name: &str) -> String {
        format!(
            "ALTER TABLE {} RENAME TO {}",
            self.table_name(table),
            self.quote_identifier(new_name)
        )
    }

    fn render_cast_to_string(&self, expr: &str) -> String {
        format!("CAST({} AS STRING)", expr)
    }

    fn render_timestamp_literal(&self, timestamp: &str) -> String {
        format!("CAST({} AS TIMESTAMP)", self.quote_string(timestamp))
    }

    fn render_file_load(
        &self,
        source: &FileSource,
        staging: &TableDefinition,
        options: &ImportOptions,
    ) -> ImportResult<Vec<String>> {
        let uris = match &source.layout {
            FileLayout::Folder => vec![format!("{}*", source.folder_prefix())],
            _ => source.files(),
        };
        let csv = &source.csv;
        let mut format = vec![
            "format = 'CSV'".to_string(),
            format!("field_delimiter = {}", self.quote_string(&csv.delimiter)),
        ];
        format.push(format!(
            "quote = {}",
            self.quote_string(csv.enclosure.as_deref().unwrap_or(""))
        ));
        if options.number_of_ignored_lines > 0 {
            format.push(format!("skip_leading_rows = {}", options.number_of_ignored_lines));
        }
        let format = format.join(", ");
        let target = self.table_name(staging);

        Ok(uris
            .chunks(self.file_chunk_size())
            .map(|chunk| {
                let uris = chunk
                    .iter()
                    .map(|u| self.quote_string(u))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!(
                    "LOAD DATA INTO {} FROM FILES ({}, uris = [{}])",
                    target, format, uris
                )
            })
            .collect())
    }
}
