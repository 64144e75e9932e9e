//! SQL dialect builders
//!
//! Every statement the importers run is produced here as plain text. A
//! [`SqlDialect`] implementation supplies identifier quoting, capability flags
//! and a handful of syntax hooks; the shared statement shapes (dedup window,
//! insert-select, update-from, delete-exists) are provided methods built on
//! top of those hooks. Nothing in this module touches a connection.

mod bigquery;
mod duckdb;
mod exasol;
mod snowflake;
mod synapse;
mod teradata;

pub use bigquery::BigqueryDialect;
pub use duckdb::DuckdbDialect;
pub use exasol::ExasolDialect;
pub use snowflake::SnowflakeDialect;
pub use synapse::SynapseDialect;
pub use teradata::TeradataDialect;

use crate::datatype::TypeDefinition;
use crate::import::{ImportError, ImportOptions, ImportResult, IncrementalStrategy};
use crate::models::{ColumnDefinition, DialectKind, TIMESTAMP_COLUMN, TableDefinition};
use crate::source::FileSource;

/// Alias of the row-number column used by the dedup window
pub const ROW_NUMBER_COLUMN: &str = "_row_number_";

/// How a table appears in a statement: its `FROM` item and the prefix used
/// to qualify its columns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub from: String,
    pub reference: String,
}

/// Get the dialect builder for a dialect
pub fn dialect_for(kind: DialectKind) -> Box<dyn SqlDialect> {
    match kind {
        DialectKind::Snowflake => Box::new(SnowflakeDialect),
        DialectKind::Synapse => Box::new(SynapseDialect),
        DialectKind::Exasol => Box::new(ExasolDialect),
        DialectKind::Teradata => Box::new(TeradataDialect),
        DialectKind::Bigquery => Box::new(BigqueryDialect),
        DialectKind::Duckdb => Box::new(DuckdbDialect),
    }
}

/// Split file URLs into their longest common folder prefix and the file
/// names relative to it
pub(crate) fn split_common_prefix(files: &[String]) -> (String, Vec<String>) {
    let Some(first) = files.first() else {
        return (String::new(), Vec::new());
    };
    let mut prefix_len = first.rfind('/').map(|i| i + 1).unwrap_or(0);
    for file in &files[1..] {
        while prefix_len > 0 && !file.starts_with(&first[..prefix_len]) {
            prefix_len = first[..prefix_len - 1].rfind('/').map(|i| i + 1).unwrap_or(0);
        }
    }
    let prefix = first[..prefix_len].to_string();
    let relative = files.iter().map(|f| f[prefix_len..].to_string()).collect();
    (prefix, relative)
}

/// SQL text generation contract shared by all dialects
pub trait SqlDialect: Send + Sync {
    fn kind(&self) -> DialectKind;

    /// Quote one identifier
    fn quote_identifier(&self, name: &str) -> String;

    /// Quote a string literal
    fn quote_string(&self, value: &str) -> String {
        format!("'{}'", value.replace('\'', "''"))
    }

    /// Quote `schema.table`; the schema is omitted when empty
    fn quote_table(&self, schema: &str, name: &str) -> String {
        if schema.is_empty() {
            self.quote_identifier(name)
        } else {
            format!(
                "{}.{}",
                self.quote_identifier(schema),
                self.quote_identifier(name)
            )
        }
    }

    fn table_name(&self, table: &TableDefinition) -> String {
        self.quote_table(&table.schema, &table.name)
    }

    /// Comma-separated quoted column names
    fn column_list(&self, columns: &[String]) -> String {
        columns
            .iter()
            .map(|c| self.quote_identifier(c))
            .collect::<Vec<_>>()
            .join(", ")
    }

    // Capabilities

    /// Atomic `CREATE TABLE … AS SELECT` followed by a rename swap
    fn supports_ctas(&self) -> bool {
        true
    }

    /// `UPDATE … FROM` joins
    fn supports_update_from(&self) -> bool {
        true
    }

    /// Session-scoped tables through `CREATE TEMPORARY TABLE`
    fn supports_temporary_tables(&self) -> bool {
        false
    }

    /// Render `PRIMARY KEY` constraints in `CREATE TABLE`
    fn declares_primary_keys(&self) -> bool {
        true
    }

    /// Files per bulk-load statement
    fn file_chunk_size(&self) -> usize {
        1000
    }

    fn default_incremental_strategy(&self) -> IncrementalStrategy {
        if self.supports_update_from() {
            IncrementalStrategy::UpdateInsert
        } else {
            IncrementalStrategy::DeleteInsert
        }
    }

    /// Physical name of a temporary table
    fn temporary_table_name(&self, name: &str) -> String {
        name.to_string()
    }

    // DDL

    fn create_table_keyword(&self, temporary: bool) -> &'static str {
        if temporary && self.supports_temporary_tables() {
            "CREATE TEMPORARY TABLE"
        } else {
            "CREATE TABLE"
        }
    }

    fn render_create_table(&self, table: &TableDefinition) -> String {
        let mut definitions: Vec<String> = table
            .columns
            .iter()
            .map(|c| {
                format!(
                    "{} {}",
                    self.quote_identifier(&c.name),
                    c.definition.sql_definition()
                )
            })
            .collect();
        if self.declares_primary_keys() && !table.primary_keys.is_empty() {
            definitions.push(format!(
                "PRIMARY KEY ({})",
                self.column_list(&table.primary_keys)
            ));
        }
        let mut sql = format!(
            "{} {} ({})",
            self.create_table_keyword(table.temporary),
            self.table_name(table),
            definitions.join(", ")
        );
        if let Some(options) = self.render_table_options(table) {
            sql.push(' ');
            sql.push_str(&options);
        }
        sql
    }

    /// `WITH (…)` clause combining distribution and index hints
    fn render_table_options(&self, table: &TableDefinition) -> Option<String> {
        let parts: Vec<String> = [
            self.render_distribution_clause(table),
            self.render_index_clause(table),
        ]
        .into_iter()
        .flatten()
        .collect();
        (!parts.is_empty()).then(|| format!("WITH ({})", parts.join(", ")))
    }

    fn render_distribution_clause(&self, _table: &TableDefinition) -> Option<String> {
        None
    }

    fn render_index_clause(&self, _table: &TableDefinition) -> Option<String> {
        None
    }

    fn render_drop_if_exists(&self, table: &TableDefinition) -> String {
        format!("DROP TABLE IF EXISTS {}", self.table_name(table))
    }

    fn render_truncate(&self, table: &TableDefinition) -> String {
        format!("TRUNCATE TABLE {}", self.table_name(table))
    }

    /// Rename `table` to `new_name` within its schema
    fn render_rename(&self, table: &TableDefinition, new_name: &str) -> String {
        format!(
            "ALTER TABLE {} RENAME TO {}",
            self.table_name(table),
            self.quote_table(&table.schema, new_name)
        )
    }

    /// Create `target` from a query
    fn render_ctas(&self, target: &TableDefinition, select: &str) -> String {
        format!(
            "{} {} AS {}",
            self.create_table_keyword(target.temporary),
            self.table_name(target),
            select
        )
    }

    fn render_row_count(&self, table: &TableDefinition) -> String {
        format!(
            "SELECT COUNT(*) AS {} FROM {}",
            self.quote_identifier("count"),
            self.table_name(table)
        )
    }

    /// `None` when transactions start implicitly
    fn render_begin_transaction(&self) -> Option<String> {
        Some("BEGIN TRANSACTION".to_string())
    }

    fn render_commit_transaction(&self) -> String {
        "COMMIT".to_string()
    }

    fn render_rollback_transaction(&self) -> String {
        "ROLLBACK".to_string()
    }

    // Expressions

    fn render_cast(&self, expr: &str, definition: &TypeDefinition) -> String {
        format!("CAST({} AS {})", expr, definition.type_only_sql_definition())
    }

    /// Cast any value to the widest string type
    fn render_cast_to_string(&self, expr: &str) -> String;

    fn render_empty_to_null(&self, expr: &str) -> String {
        format!("NULLIF({}, '')", expr)
    }

    fn not_equal_operator(&self) -> &'static str {
        "!="
    }

    /// NULL-safe inequality
    fn render_is_distinct(&self, left: &str, right: &str) -> String {
        format!("{} IS DISTINCT FROM {}", left, right)
    }

    fn render_current_timestamp(&self) -> String {
        "CURRENT_TIMESTAMP".to_string()
    }

    /// Literal for the shared `_timestamp` value
    fn render_timestamp_literal(&self, timestamp: &str) -> String {
        self.quote_string(timestamp)
    }

    /// How `table` is named and referenced under `alias`
    fn table_reference(&self, table: &TableDefinition, alias: &str) -> TableRef {
        let reference = self.quote_identifier(alias);
        TableRef {
            from: format!("{} AS {}", self.table_name(table), reference),
            reference,
        }
    }

    /// Value written for a source column
    ///
    /// Empty strings become NULL for `convert_empty_values_to_null` string
    /// columns. Otherwise, with null manipulation, NULL becomes `''` when
    /// both sides are strings. With casting, the value is cast to the
    /// destination type when the types differ.
    fn render_value_expression(
        &self,
        source: &ColumnDefinition,
        destination: Option<&ColumnDefinition>,
        reference: &str,
        options: &ImportOptions,
    ) -> String {
        let destination_is_string = destination.is_none_or(|d| d.is_string());
        let mut expr = reference.to_string();
        if options.converts_empty_to_null(&source.name) {
            if source.is_string() {
                expr = self.render_empty_to_null(&expr);
            }
        } else if options.is_null_manipulation_enabled() && source.is_string() && destination_is_string
        {
            expr = format!("COALESCE({}, '')", expr);
        }
        if options.is_cast_enabled()
            && let Some(destination) = destination
            && needs_cast(source, destination)
        {
            expr = self.render_cast(&expr, &destination.definition);
        }
        expr
    }

    /// Source side of a primary key comparison
    fn render_key_expression(
        &self,
        source: Option<&ColumnDefinition>,
        destination: Option<&ColumnDefinition>,
        reference: &str,
        options: &ImportOptions,
    ) -> String {
        let source_is_string = source.is_none_or(|c| c.is_string());
        let destination_is_string = destination.is_none_or(|c| c.is_string());
        let mut expr = reference.to_string();
        if options.is_null_manipulation_enabled() && source_is_string && destination_is_string {
            expr = format!("COALESCE({}, '')", expr);
        }
        if options.is_cast_enabled()
            && let (Some(source), Some(destination)) = (source, destination)
            && needs_cast(source, destination)
        {
            expr = self.render_cast(&expr, &destination.definition);
        }
        expr
    }

    /// `dest.pk = src.pk AND …` over the destination keys
    fn render_primary_key_conditions(
        &self,
        destination_ref: &str,
        source_ref: &str,
        source: &TableDefinition,
        destination: &TableDefinition,
        options: &ImportOptions,
    ) -> String {
        destination
            .primary_keys
            .iter()
            .map(|key| {
                let quoted = self.quote_identifier(key);
                let source_expr = self.render_key_expression(
                    source.column(key),
                    destination.column(key),
                    &format!("{}.{}", source_ref, quoted),
                    options,
                );
                format!("{}.{} = {}", destination_ref, quoted, source_expr)
            })
            .collect::<Vec<_>>()
            .join(" AND ")
    }

    /// Test whether the destination value differs from the incoming one
    fn render_difference(
        &self,
        source: &ColumnDefinition,
        destination: Option<&ColumnDefinition>,
        destination_ref: &str,
        source_ref: &str,
        options: &ImportOptions,
    ) -> String {
        if options.is_null_manipulation_enabled() {
            let source_side = if source.is_string() {
                source_ref.to_string()
            } else {
                self.render_cast_to_string(source_ref)
            };
            format!(
                "COALESCE({}, '') {} COALESCE({}, '')",
                self.render_cast_to_string(destination_ref),
                self.not_equal_operator(),
                source_side
            )
        } else {
            let value = self.render_value_expression(source, destination, source_ref, options);
            self.render_is_distinct(destination_ref, &value)
        }
    }

    // Deduplication

    /// Keep one row per primary key tuple
    ///
    /// Ties inside a key are broken arbitrarily: which duplicate's non-key
    /// values survive is not specified.
    fn render_dedup_select(
        &self,
        staging: &TableDefinition,
        columns: &[String],
        primary_keys: &[String],
    ) -> String {
        let keys = primary_keys
            .iter()
            .map(|k| self.quote_identifier(k))
            .collect::<Vec<_>>()
            .join(",");
        let outer = columns
            .iter()
            .map(|c| format!("a.{}", self.quote_identifier(c)))
            .collect::<Vec<_>>()
            .join(",");
        let row_number = self.quote_identifier(ROW_NUMBER_COLUMN);
        format!(
            "SELECT {} FROM (SELECT {}, ROW_NUMBER() OVER (PARTITION BY {} ORDER BY {}) AS {} FROM {}) AS a WHERE a.{} = 1",
            outer,
            self.column_list(columns),
            keys,
            keys,
            row_number,
            self.table_name(staging),
            row_number
        )
    }

    fn render_dedup_insert(
        &self,
        staging: &TableDefinition,
        target: &TableDefinition,
        primary_keys: &[String],
    ) -> String {
        let columns = target.column_names();
        format!(
            "INSERT INTO {} ({}) {}",
            self.table_name(target),
            self.column_list(&columns),
            self.render_dedup_select(staging, &columns, primary_keys)
        )
    }

    // Final-table statements

    /// Insert column list and select list moving `source` into `destination`
    ///
    /// The `_timestamp` literal is appended only when the source does not
    /// carry its own `_timestamp` column.
    fn render_select_list(
        &self,
        source: &TableDefinition,
        destination: &TableDefinition,
        reference: &str,
        options: &ImportOptions,
        timestamp: Option<&str>,
    ) -> (Vec<String>, String) {
        let mut columns = source.column_names();
        let mut exprs: Vec<String> = source
            .columns
            .iter()
            .map(|c| {
                let quoted = self.quote_identifier(&c.name);
                let value = self.render_value_expression(
                    c,
                    destination.column(&c.name),
                    &format!("{}.{}", reference, quoted),
                    options,
                );
                format!("{} AS {}", value, quoted)
            })
            .collect();
        if let Some(timestamp) = timestamp
            && !source.has_timestamp_column()
        {
            columns.push(TIMESTAMP_COLUMN.to_string());
            exprs.push(format!(
                "{} AS {}",
                self.render_timestamp_literal(timestamp),
                self.quote_identifier(TIMESTAMP_COLUMN)
            ));
        }
        (columns, exprs.join(", "))
    }

    /// `INSERT INTO destination (…) SELECT … FROM source`
    fn render_insert_all(
        &self,
        source: &TableDefinition,
        destination: &TableDefinition,
        options: &ImportOptions,
        timestamp: Option<&str>,
    ) -> String {
        let src = self.table_reference(source, "src");
        let (columns, select_list) =
            self.render_select_list(source, destination, &src.reference, options, timestamp);
        format!(
            "INSERT INTO {} ({}) SELECT {} FROM {}",
            self.table_name(destination),
            self.column_list(&columns),
            select_list,
            src.from
        )
    }

    /// Converted (and deduplicated, when the destination has keys) rows of
    /// `staging` shaped for `destination`
    fn render_merge_select(
        &self,
        staging: &TableDefinition,
        destination: &TableDefinition,
        options: &ImportOptions,
        timestamp: Option<&str>,
    ) -> String {
        let from = if destination.primary_keys.is_empty() {
            self.table_name(staging)
        } else {
            format!(
                "({})",
                self.render_dedup_select(staging, &staging.column_names(), &destination.primary_keys)
            )
        };
        let alias = self.quote_identifier("src");
        let (_, select_list) =
            self.render_select_list(staging, destination, &alias, options, timestamp);
        format!("SELECT {} FROM {} AS {}", select_list, from, alias)
    }

    /// Select rebuilding `destination` through `CREATE TABLE … AS`
    ///
    /// Every destination column is projected in destination order with the
    /// destination type. A `_timestamp` column missing from the staging rows
    /// gets the shared literal, or the current time when no literal is given.
    fn render_ctas_select(
        &self,
        staging: &TableDefinition,
        destination: &TableDefinition,
        options: &ImportOptions,
        timestamp: Option<&str>,
    ) -> String {
        let from = if destination.primary_keys.is_empty() {
            self.table_name(staging)
        } else {
            format!(
                "({})",
                self.render_dedup_select(staging, &staging.column_names(), &destination.primary_keys)
            )
        };
        let alias = self.quote_identifier("src");
        let select_list = destination
            .columns
            .iter()
            .map(|d| {
                let quoted = self.quote_identifier(&d.name);
                let value = match staging.column(&d.name) {
                    Some(s) => {
                        let value = self.render_value_expression(
                            s,
                            Some(d),
                            &format!("{}.{}", alias, quoted),
                            options,
                        );
                        if !options.is_cast_enabled() && needs_cast(s, d) {
                            self.render_cast(&value, &d.definition)
                        } else {
                            value
                        }
                    }
                    None if d.is_timestamp() => {
                        let value = match timestamp {
                            Some(timestamp) => self.render_timestamp_literal(timestamp),
                            None => self.render_current_timestamp(),
                        };
                        self.render_cast(&value, &d.definition)
                    }
                    None => self.render_cast("NULL", &d.definition),
                };
                format!("{} AS {}", value, quoted)
            })
            .collect::<Vec<_>>()
            .join(", ");
        format!("SELECT {} FROM {} AS {}", select_list, from, alias)
    }

    /// `UPDATE … FROM` statement shape
    fn render_update(
        &self,
        destination: &TableRef,
        source: &TableRef,
        set: &str,
        condition: &str,
    ) -> String {
        format!(
            "UPDATE {} SET {} FROM {} WHERE {}",
            destination.from, set, source.from, condition
        )
    }

    /// Update destination rows whose key is in `source` and whose values
    /// differ; `None` when every column is a key column
    fn render_update_with_primary_key(
        &self,
        source: &TableDefinition,
        destination: &TableDefinition,
        options: &ImportOptions,
        timestamp: Option<&str>,
    ) -> Option<String> {
        let dest = self.table_reference(destination, "dest");
        let src = self.table_reference(source, "src");
        let columns: Vec<&ColumnDefinition> = source
            .columns
            .iter()
            .filter(|c| !destination.is_primary_key(&c.name))
            .collect();
        if columns.is_empty() {
            return None;
        }

        let mut set: Vec<String> = columns
            .iter()
            .map(|c| {
                let quoted = self.quote_identifier(&c.name);
                let value = self.render_value_expression(
                    c,
                    destination.column(&c.name),
                    &format!("{}.{}", src.reference, quoted),
                    options,
                );
                format!("{} = {}", quoted, value)
            })
            .collect();
        if let Some(timestamp) = timestamp
            && !source.has_timestamp_column()
        {
            set.push(format!(
                "{} = {}",
                self.quote_identifier(TIMESTAMP_COLUMN),
                self.render_timestamp_literal(timestamp)
            ));
        }

        let keys = self.render_primary_key_conditions(
            &dest.reference,
            &src.reference,
            source,
            destination,
            options,
        );
        let differences = columns
            .iter()
            .filter(|c| !c.is_timestamp())
            .map(|c| {
                let quoted = self.quote_identifier(&c.name);
                self.render_difference(
                    c,
                    destination.column(&c.name),
                    &format!("{}.{}", dest.reference, quoted),
                    &format!("{}.{}", src.reference, quoted),
                    options,
                )
            })
            .collect::<Vec<_>>();
        let condition = if differences.is_empty() {
            keys
        } else {
            format!("{} AND ({})", keys, differences.join(" OR "))
        };
        Some(self.render_update(&dest, &src, &set.join(", "), &condition))
    }

    /// `DELETE` statement shape removing `target` rows matched in `other`
    fn render_delete_exists(&self, target: &TableRef, other: &TableRef, condition: &str) -> String {
        format!(
            "DELETE FROM {} WHERE EXISTS (SELECT * FROM {} WHERE {})",
            target.from, other.from, condition
        )
    }

    /// Delete destination rows whose key exists in `source`
    fn render_delete_from_destination(
        &self,
        source: &TableDefinition,
        destination: &TableDefinition,
        options: &ImportOptions,
    ) -> String {
        let dest = self.table_reference(destination, "dest");
        let src = self.table_reference(source, "src");
        let condition = self.render_primary_key_conditions(
            &dest.reference,
            &src.reference,
            source,
            destination,
            options,
        );
        self.render_delete_exists(&dest, &src, &condition)
    }

    /// Delete `source` rows whose key already exists in the destination
    fn render_delete_from_source(
        &self,
        source: &TableDefinition,
        destination: &TableDefinition,
        options: &ImportOptions,
    ) -> String {
        let dest = self.table_reference(destination, "dest");
        let src = self.table_reference(source, "src");
        let condition = self.render_primary_key_conditions(
            &dest.reference,
            &src.reference,
            source,
            destination,
            options,
        );
        self.render_delete_exists(&src, &dest, &condition)
    }

    // Stage loading

    /// `INSERT INTO staging (…) <select>`
    fn render_insert_select(
        &self,
        staging: &TableDefinition,
        columns: &[String],
        select: &str,
    ) -> String {
        format!(
            "INSERT INTO {} ({}) {}",
            self.table_name(staging),
            self.column_list(columns),
            select
        )
    }

    /// Copy rows of an existing table into staging
    fn render_table_copy(
        &self,
        schema: &str,
        name: &str,
        staging: &TableDefinition,
        columns: &[String],
    ) -> String {
        let select = format!(
            "SELECT {} FROM {}",
            self.column_list(columns),
            self.quote_table(schema, name)
        );
        self.render_insert_select(staging, columns, &select)
    }

    /// Bulk-load statements for a file source, one per chunk of files
    fn render_file_load(
        &self,
        source: &FileSource,
        _staging: &TableDefinition,
        _options: &ImportOptions,
    ) -> ImportResult<Vec<String>> {
        Err(ImportError::UnsupportedSource {
            kind: format!("file ({})", source.url),
            dialect: self.kind().to_string(),
        })
    }
}

fn needs_cast(source: &ColumnDefinition, destination: &ColumnDefinition) -> bool {
    source.definition.type_only_sql_definition() != destination.definition.type_only_sql_definition()
}
