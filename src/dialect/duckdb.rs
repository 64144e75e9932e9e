//! DuckDB statements
//!
//! Used for local runs. Staging tables are regular tables in the
//! destination schema because DuckDB keeps temporary tables in their own
//! catalog.

use super::SqlDialect;
use crate::import::{ImportOptions, ImportResult};
use crate::models::{DialectKind, TableDefinition};
use crate::source::{Compression, FileLayout, FileSource};

#[derive(Debug, Clone, Copy, Default)]
pub struct DuckdbDialect;

impl SqlDialect for DuckdbDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::Duckdb
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    fn declares_primary_keys(&self) -> bool {
        false
    }

    fn render_rename(&self, table: &TableDefinition, new_name: &str) -> String {
        format!(
            "ALTER TABLE {} RENAME TO {}",
            self.table_name(table),
            self.quote_identifier(new_name)
        )
    }

    fn render_cast_to_string(&self, expr: &str) -> String {
        format!("CAST({} AS VARCHAR)", expr)
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
        let files = match &source.layout {
            FileLayout::Folder => vec![format!("{}*", source.folder_prefix())],
            _ => source.files(),
        };
        if files.is_empty() {
            return Ok(Vec::new());
        }

        let list = |values: &[String]| {
            values
                .iter()
                .map(|v| self.quote_string(v))
                .collect::<Vec<_>>()
                .join(", ")
        };
        let csv = &source.csv;
        let mut arguments = vec![
            format!("[{}]", list(&files)),
            "header = false".to_string(),
        ];
        if options.number_of_ignored_lines > 0 {
            arguments.push(format!("skip = {}", options.number_of_ignored_lines));
        }
        arguments.push(format!("names = [{}]", list(&source.columns)));
        arguments.push("all_varchar = true".to_string());
        arguments.push(format!("delim = {}", self.quote_string(&csv.delimiter)));
        if let Some(enclosure) = &csv.enclosure {
            arguments.push(format!("quote = {}", self.quote_string(enclosure)));
        }
        if let Some(escape) = &csv.escaped_by {
            arguments.push(format!("escape = {}", self.quote_string(escape)));
        }
        if source.compression == Compression::Gzip {
            arguments.push("compression = 'gzip'".to_string());
        }

        let columns = staging.column_names();
        let select = format!(
            "SELECT {} FROM read_csv({})",
            self.column_list(&columns),
            arguments.join(", ")
        );
        Ok(vec![self.render_insert_select(staging, &columns, &select)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatype::TypeDefinition;
    use crate::models::ColumnDefinition;
    use crate::source::Manifest;

    fn staging() -> TableDefinition {
        let varchar = || TypeDefinition::new(DialectKind::Duckdb, "VARCHAR", None).unwrap();
        TableDefinition::new(
            "main",
            "__temp_x",
            vec![
                ColumnDefinition::new("id", varchar()),
                ColumnDefinition::new("name", varchar()),
            ],
        )
    }

    #[test]
    fn test_read_csv_insert() {
        let source = FileSource::new("/data/accounts.csv", vec!["id".into(), "name".into()]);
        let options = ImportOptions::default().with_ignored_lines(1);
        let sql = DuckdbDialect
            .render_file_load(&source, &staging(), &options)
            .unwrap();
        assert_eq!(
            sql,
            vec![
                "INSERT INTO \"main\".\"__temp_x\" (\"id\", \"name\") SELECT \"id\", \"name\" FROM read_csv(['/data/accounts.csv'], header = false, skip = 1, names = ['id', 'name'], all_varchar = true, delim = ',', quote = '\"')"
            ]
        );
    }

    #[test]
    fn test_empty_manifest_loads_nothing() {
        let source = FileSource::new("/data/manifest", vec!["id".into(), "name".into()])
            .sliced(Manifest::default());
        let sql = DuckdbDialect
            .render_file_load(&source, &staging(), &ImportOptions::default())
            .unwrap();
        assert!(sql.is_empty());
    }

    #[test]
    fn test_rename_is_unqualified() {
        assert_eq!(
            DuckdbDialect.render_rename(&staging(), "accounts"),
            "ALTER TABLE \"main\".\"__temp_x\" RENAME TO \"accounts\""
        );
    }
}
