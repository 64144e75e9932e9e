//! Snowflake statements

use super::{SqlDialect, split_common_prefix};
use crate::import::{ImportOptions, ImportResult};
use crate::models::{DialectKind, TableDefinition};
use crate::source::{Compression, FileLayout, FileSource};

#[derive(Debug, Clone, Copy, Default)]
pub struct SnowflakeDialect;

impl SnowflakeDialect {
    fn file_format(&self, source: &FileSource, options: &ImportOptions) -> String {
        let csv = &source.csv;
        let enclosure = csv
            .enclosure
            .as_deref()
            .map(|e| self.quote_string(e))
            .unwrap_or_else(|| "NONE".to_string());
        let escape = csv
            .escaped_by
            .as_deref()
            .map(|e| self.quote_string(e))
            .unwrap_or_else(|| "NONE".to_string());
        let mut format = format!(
            "TYPE=CSV FIELD_DELIMITER = {} SKIP_HEADER = {} FIELD_OPTIONALLY_ENCLOSED_BY = {} ESCAPE_UNENCLOSED_FIELD = {}",
            self.quote_string(&csv.delimiter),
            options.number_of_ignored_lines,
            enclosure,
            escape
        );
        if source.compression == Compression::Gzip {
            format.push_str(" COMPRESSION = GZIP");
        }
        format.push_str(" NULL_IF=('')");
        format
    }
}

impl SqlDialect for SnowflakeDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::Snowflake
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    fn supports_temporary_tables(&self) -> bool {
        true
    }

    fn render_cast_to_string(&self, expr: &str) -> String {
        format!("TO_VARCHAR({})", expr)
    }

    fn render_empty_to_null(&self, expr: &str) -> String {
        format!("IFF({} = '', NULL, {})", expr, expr)
    }

    fn render_file_load(
        &self,
        source: &FileSource,
        staging: &TableDefinition,
        options: &ImportOptions,
    ) -> ImportResult<Vec<String>> {
        let target = self.table_name(staging);
        let file_format = self.file_format(source, options);

        if source.layout == FileLayout::Folder {
            return Ok(vec![format!(
                "COPY INTO {} FROM {} FILE_FORMAT = ({})",
                target,
                self.quote_string(&source.folder_prefix()),
                file_format
            )]);
        }

        let (prefix, files) = split_common_prefix(&source.files());
        Ok(files
            .chunks(self.file_chunk_size())
            .map(|chunk| {
                let files = chunk
                    .iter()
                    .map(|f| self.quote_string(f))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!(
                    "COPY INTO {} FROM {} FILE_FORMAT = ({}) FILES = ({})",
                    target,
                    self.quote_string(&prefix),
                    file_format,
                    files
                )
            })
            .collect())
    }
}
