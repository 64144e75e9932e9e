//! Azure Synapse Analytics statements
//!
//! Synapse has no `IF EXISTS` on drops, renames through `RENAME OBJECT` and
//! does not accept aliased targets in `UPDATE`/`DELETE`, so tables are always
//! referenced by their full name. Temporary tables are `#`-prefixed.

use super::{SqlDialect, TableRef};
use crate::import::{ErrorCode, ImportError, ImportOptions, ImportResult};
use crate::models::{DialectKind, TableDefinition, TableDistribution, TableIndexType};
use crate::source::{Compression, FileLayout, FileSource};

#[derive(Debug, Clone, Copy, Default)]
pub struct SynapseDialect;

impl SqlDialect for SynapseDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::Synapse
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("[{}]", name.replace(']', "]]"))
    }

    fn temporary_table_name(&self, name: &str) -> String {
        format!("#{}", name)
    }

    fn render_distribution_clause(&self, table: &TableDefinition) -> Option<String> {
        let clause = match table.distribution? {
            TableDistribution::Hash => {
                format!("DISTRIBUTION = HASH({})", self.column_list(&table.distribution_columns))
            }
            TableDistribution::RoundRobin => "DISTRIBUTION = ROUND_ROBIN".to_string(),
            TableDistribution::Replicate => "DISTRIBUTION = REPLICATE".to_string(),
        };
        Some(clause)
    }

    fn render_index_clause(&self, table: &TableDefinition) -> Option<String> {
        let clause = match table.index? {
            TableIndexType::ClusteredColumnstoreIndex => "CLUSTERED COLUMNSTORE INDEX".to_string(),
            TableIndexType::Heap => "HEAP".to_string(),
            TableIndexType::ClusteredIndex => {
                format!("CLUSTERED INDEX({})", self.column_list(&table.index_columns))
            }
        };
        Some(clause)
    }

    fn render_drop_if_exists(&self, table: &TableDefinition) -> String {
        let name = self.table_name(table);
        format!(
            "IF OBJECT_ID (N'{}', N'U') IS NOT NULL DROP TABLE {}",
            name.replace('\'', "''"),
            name
        )
    }

    fn render_rename(&self, table: &TableDefinition, new_name: &str) -> String {
        format!(
            "RENAME OBJECT {} TO {}",
            self.table_name(table),
            self.quote_identifier(new_name)
        )
    }

    fn render_ctas(&self, target: &TableDefinition, select: &str) -> String {
        match self.render_table_options(target) {
            Some(options) => format!("CREATE TABLE {} {} AS {}", self.table_name(target), options, select),
            None => format!(
                "CREATE TABLE {} WITH (DISTRIBUTION = ROUND_ROBIN) AS {}",
                self.table_name(target),
                select
            ),
        }
    }

    fn render_cast_to_string(&self, expr: &str) -> String {
        format!("CAST({} AS NVARCHAR(4000))", expr)
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

    fn render_file_load(
        &self,
        source: &FileSource,
        staging: &TableDefinition,
        options: &ImportOptions,
    ) -> ImportResult<Vec<String>> {
        let csv = &source.csv;
        let Some(enclosure) = csv.enclosure.as_deref() else {
            return Err(ImportError::load(
                ErrorCode::InvalidCsvParams,
                "CSV property FIELDQUOTE|ECLOSURE must be set when using Synapse analytics.",
            ));
        };

        let mut with = vec![
            "FILE_TYPE='CSV'".to_string(),
            format!("FIELDQUOTE={}", self.quote_string(enclosure)),
            format!("FIELDTERMINATOR={}", self.quote_string(&csv.delimiter)),
            "ENCODING = 'UTF8'".to_string(),
        ];
        if options.number_of_ignored_lines > 0 {
            with.push(format!(
                "FIRSTROW={}",
                options.number_of_ignored_lines.saturating_add(1)
            ));
        }
        if source.compression == Compression::Gzip {
            with.push("COMPRESSION = 'GZIP'".to_string());
        }

        let files = match &source.layout {
            FileLayout::Folder => vec![format!("{}*", source.folder_prefix())],
            _ => source.files(),
        };
        let target = self.table_name(staging);
        let with = with.join(", ");
        Ok(files
            .chunks(self.file_chunk_size())
            .map(|chunk| {
                let from = chunk
                    .iter()
                    .map(|f| self.quote_string(f))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("COPY INTO {} FROM {} WITH ({})", target, from, with)
            })
            .collect())
    }
}

/// Inequality treating two NULLs as equal, for engines without
/// `IS DISTINCT FROM`
pub(super) fn null_safe_difference(left: &str, right: &str, not_equal: &str) -> String {
    format!(
        "({l} {ne} {r} OR ({l} IS NULL AND {r} IS NOT NULL) OR ({l} IS NOT NULL AND {r} IS NULL))",
        l = left,
        r = right,
        ne = not_equal
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatype::TypeDefinition;
    use crate::models::ColumnDefinition;
    use crate::source::CsvOptions;

    fn table() -> TableDefinition {
        TableDefinition::new(
            "dbo",
            "accounts",
            vec![ColumnDefinition::new(
                "id",
                TypeDefinition::new(DialectKind::Synapse, "NVARCHAR", Some("4000")).unwrap(),
            )],
        )
        .with_distribution(TableDistribution::Hash, vec!["id".into()])
        .with_index(TableIndexType::Heap, Vec::new())
    }

    #[test]
    fn test_drop_resolves_quoted_names() {
        let mut table = table();
        table.schema = "import-export_schema".to_string();
        table.name = "o'brien.accounts".to_string();
        assert_eq!(
            SynapseDialect.render_drop_if_exists(&table),
            "IF OBJECT_ID (N'[import-export_schema].[o''brien.accounts]', N'U') IS NOT NULL DROP TABLE [import-export_schema].[o'brien.accounts]"
        );
    }

    #[test]
    fn test_create_with_layout_hints() {
        let sql = SynapseDialect.render_create_table(&table());
        assert_eq!(
            sql,
            "CREATE TABLE [dbo].[accounts] ([id] NVARCHAR(4000)) WITH (DISTRIBUTION = HASH([id]), HEAP)"
        );
    }

    #[test]
    fn test_drop_and_rename() {
        let dialect = SynapseDialect;
        assert_eq!(
            dialect.render_drop_if_exists(&table()),
            "IF OBJECT_ID (N'[dbo].[accounts]', N'U') IS NOT NULL DROP TABLE [dbo].[accounts]"
        );
        assert_eq!(
            dialect.render_rename(&table(), "accounts_old"),
            "RENAME OBJECT [dbo].[accounts] TO [accounts_old]"
        );
    }

    #[test]
    fn test_copy_requires_enclosure() {
        let source = FileSource::new("https://acc.blob.core.windows.net/c/f.csv", vec!["id".into()])
            .with_csv(CsvOptions {
                enclosure: None,
                ..CsvOptions::default()
            });
        let err = SynapseDialect
            .render_file_load(&source, &table(), &ImportOptions::default())
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidCsvParams);
        assert_eq!(
            err.to_string(),
            "CSV property FIELDQUOTE|ECLOSURE must be set when using Synapse analytics."
        );
    }

    #[test]
    fn test_copy_statement() {
        let source =
            FileSource::new("https://acc.blob.core.windows.net/c/f.csv", vec!["id".into()]).gzip();
        let options = ImportOptions::default().with_ignored_lines(1);
        let sql = SynapseDialect
            .render_file_load(&source, &table(), &options)
            .unwrap();
        assert_eq!(
            sql,
            vec![
                "COPY INTO [dbo].[accounts] FROM 'https://acc.blob.core.windows.net/c/f.csv' WITH (FILE_TYPE='CSV', FIELDQUOTE='\"', FIELDTERMINATOR=',', ENCODING = 'UTF8', FIRSTROW=2, COMPRESSION = 'GZIP')"
            ]
        );
    }

    #[test]
    fn test_null_safe_difference() {
        assert_eq!(
            SynapseDialect.render_is_distinct("a", "b"),
            "(a != b OR (a IS NULL AND b IS NOT NULL) OR (a IS NOT NULL AND b IS NULL))"
        );
    }
}
