//! Table reflection from `CREATE TABLE` DDL
//!
//! Uses `sqlparser` to turn the DDL a warehouse reports for an existing
//! destination table into a [`TableDefinition`].

use super::column::ColumnDefinition;
use super::enums::DialectKind;
use super::table::{TableDefinition, TableError};
use crate::datatype::TypeDefinition;
use once_cell::sync::Lazy;
use regex::Regex;
use sqlparser::ast::{ColumnOption, ObjectName, Statement, TableConstraint};
use sqlparser::dialect::{
    BigQueryDialect, Dialect, DuckDbDialect, GenericDialect, MsSqlDialect, SnowflakeDialect,
};
use sqlparser::parser::Parser;
use std::collections::HashSet;

// `VARCHAR(255)`, `NUMBER(38,2)`, `DOUBLE PRECISION`, `ARRAY<INT64>`
static RE_TYPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([A-Za-z_][A-Za-z0-9_ ]*?)\s*(?:\((.*)\)|<(.*)>)?\s*$")
        .expect("Invalid regex")
});

fn parser_dialect(dialect: DialectKind) -> Box<dyn Dialect> {
    match dialect {
        DialectKind::Snowflake => Box::new(SnowflakeDialect {}),
        DialectKind::Synapse => Box::new(MsSqlDialect {}),
        DialectKind::Bigquery => Box::new(BigQueryDialect {}),
        DialectKind::Duckdb => Box::new(DuckDbDialect {}),
        DialectKind::Exasol | DialectKind::Teradata => Box::new(GenericDialect {}),
    }
}

/// Strip `"…"`, `` `…` `` or `[…]` quoting from an identifier
pub(crate) fn unquote_identifier(identifier: &str) -> String {
    let trimmed = identifier.trim();
    if trimmed.len() >= 2 {
        let pairs = [('"', '"', "\"\""), ('`', '`', "``"), ('[', ']', "]]")];
        for (open, close, escaped) in pairs {
            if trimmed.starts_with(open) && trimmed.ends_with(close) {
                let inner = &trimmed[1..trimmed.len() - 1];
                return inner.replace(escaped, &close.to_string());
            }
        }
    }
    trimmed.to_string()
}

fn split_object_name(name: &ObjectName) -> (String, String) {
    let parts: Vec<String> = name
        .0
        .iter()
        .map(|part| unquote_identifier(&part.to_string()))
        .collect();
    match parts.as_slice() {
        [.., schema, table] => (schema.clone(), table.clone()),
        [table] => (String::new(), table.clone()),
        [] => (String::new(), String::new()),
    }
}

/// Split rendered type text into type name and length
fn split_type(data_type: &str) -> Option<(String, Option<String>)> {
    let captures = RE_TYPE.captures(data_type)?;
    let name = captures.get(1)?.as_str().to_string();
    let length = captures
        .get(2)
        .or_else(|| captures.get(3))
        .map(|m| m.as_str().replace(' ', ""));
    Some((name, length))
}

impl TableDefinition {
    /// Reflect a table definition from a single `CREATE TABLE` statement
    ///
    /// Primary keys are collected from both column-level and table-level
    /// constraints, in column order.
    pub fn from_ddl(sql: &str, dialect: DialectKind) -> Result<Self, TableError> {
        let parser_dialect = parser_dialect(dialect);
        let statements = Parser::parse_sql(parser_dialect.as_ref(), sql)
            .map_err(|e| TableError::Parse(e.to_string()))?;

        let create = statements
            .into_iter()
            .find_map(|stmt| match stmt {
                Statement::CreateTable(create) => Some(create),
                _ => None,
            })
            .ok_or_else(|| TableError::Parse("no CREATE TABLE statement found".to_string()))?;

        let (schema, name) = split_object_name(&create.name);

        let mut pk_cols = HashSet::new();
        for constraint in &create.constraints {
            if let TableConstraint::PrimaryKey(pk) = constraint {
                for col in &pk.columns {
                    pk_cols.insert(unquote_identifier(&col.to_string()));
                }
            }
        }

        let mut columns = Vec::with_capacity(create.columns.len());
        let mut primary_keys = Vec::new();
        for col in &create.columns {
            let col_name = unquote_identifier(&col.name.value);
            let mut nullable = true;
            let mut default = None;
            let mut is_pk = pk_cols.contains(&col_name);

            for opt_def in &col.options {
                match &opt_def.option {
                    ColumnOption::NotNull => nullable = false,
                    ColumnOption::Null => nullable = true,
                    ColumnOption::Default(expr) => default = Some(expr.to_string()),
                    ColumnOption::PrimaryKey(_) => is_pk = true,
                    _ => {}
                }
            }

            let data_type = col.data_type.to_string();
            let (type_name, length) = split_type(&data_type)
                .ok_or_else(|| TableError::Parse(format!("unrecognised type '{}'", data_type)))?;
            let definition = TypeDefinition::new(dialect, &type_name, length.as_deref())
                .map_err(|source| TableError::Column {
                    column: col_name.clone(),
                    source,
                })?
                .nullable(nullable && !is_pk)
                .with_default(default);

            if is_pk {
                primary_keys.push(col_name.clone());
            }
            columns.push(ColumnDefinition::new(col_name, definition));
        }

        let table = TableDefinition::new(schema, name, columns).with_primary_keys(primary_keys);
        table.validate()?;
        tracing::debug!(
            "Reflected table {}.{} with {} columns",
            table.schema,
            table.name,
            table.columns.len()
        );
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unquote_identifier() {
        assert_eq!(unquote_identifier("\"a\"\"b\""), "a\"b");
        assert_eq!(unquote_identifier("`x`"), "x");
        assert_eq!(unquote_identifier("[col]"), "col");
        assert_eq!(unquote_identifier(" plain "), "plain");
    }

    #[test]
    fn test_split_type() {
        assert_eq!(
            split_type("NUMBER(38,2)"),
            Some(("NUMBER".to_string(), Some("38,2".to_string())))
        );
        assert_eq!(
            split_type("DOUBLE PRECISION"),
            Some(("DOUBLE PRECISION".to_string(), None))
        );
        assert_eq!(
            split_type("ARRAY<INT64>"),
            Some(("ARRAY".to_string(), Some("INT64".to_string())))
        );
    }

    #[test]
    fn test_from_ddl_snowflake() {
        let sql = r#"CREATE TABLE "PUBLIC"."accounts" (
            "id" VARCHAR(10) NOT NULL,
            "name" VARCHAR(255),
            "amount" NUMBER(12,2) DEFAULT 0,
            PRIMARY KEY ("id")
        )"#;
        let table = TableDefinition::from_ddl(sql, DialectKind::Snowflake).unwrap();
        assert_eq!(table.schema, "PUBLIC");
        assert_eq!(table.name, "accounts");
        assert_eq!(table.column_names(), vec!["id", "name", "amount"]);
        assert_eq!(table.primary_keys, vec!["id"]);
        assert_eq!(
            table.columns[0].definition.sql_definition(),
            "VARCHAR (10) NOT NULL"
        );
        assert_eq!(table.columns[2].definition.default_value(), Some("0"));
    }

    #[test]
    fn test_from_ddl_inline_primary_key() {
        let sql = "CREATE TABLE visits (id INTEGER PRIMARY KEY, note VARCHAR)";
        let table = TableDefinition::from_ddl(sql, DialectKind::Duckdb).unwrap();
        assert_eq!(table.schema, "");
        assert_eq!(table.primary_keys, vec!["id"]);
        assert!(!table.columns[0].definition.is_nullable());
    }

    #[test]
    fn test_from_ddl_rejects_unknown_type() {
        let sql = "CREATE TABLE t (a GEOMETRY)";
        let err = TableDefinition::from_ddl(sql, DialectKind::Snowflake).unwrap_err();
        assert!(matches!(err, TableError::Column { .. }));
    }

    #[test]
    fn test_from_ddl_without_create_table() {
        let err = TableDefinition::from_ddl("SELECT 1", DialectKind::Snowflake).unwrap_err();
        assert!(matches!(err, TableError::Parse(_)));
    }
}
