//! End-to-end imports against an embedded DuckDB database

#![cfg(feature = "duckdb-backend")]

use staged_import_sdk::database::{Connection, DuckDbConnection};
use staged_import_sdk::dialect::{DuckdbDialect, SqlDialect};
use staged_import_sdk::import::{
    CastValueTypes, DedupStrategy, ErrorCode, ImportOptions, Importer,
};
use staged_import_sdk::models::{DialectKind, TableDefinition};
use staged_import_sdk::source::FileSource;
use std::path::PathBuf;

fn fixture(name: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
        .to_string_lossy()
        .into_owned()
}

fn accounts_table() -> TableDefinition {
    TableDefinition::from_ddl(
        "CREATE TABLE main.accounts (id VARCHAR PRIMARY KEY, name VARCHAR, status VARCHAR)",
        DialectKind::Duckdb,
    )
    .unwrap()
}

fn accounts_source(file: &str) -> FileSource {
    let mut source = FileSource::new(
        fixture(file),
        vec!["id".into(), "name".into(), "status".into()],
    );
    source.primary_keys = vec!["id".into()];
    source
}

fn setup(destination: &TableDefinition) -> DuckDbConnection {
    let conn = DuckDbConnection::in_memory().unwrap();
    conn.execute(&DuckdbDialect.render_create_table(destination))
        .unwrap();
    conn
}

fn scalar(conn: &DuckDbConnection, sql: &str) -> serde_json::Value {
    conn.query(sql).unwrap().scalar().cloned().unwrap()
}

fn count(conn: &DuckDbConnection, table: &str) -> u64 {
    conn.fetch_count(&format!("SELECT COUNT(*) AS \"count\" FROM {}", table))
        .unwrap()
}

fn rows(conn: &DuckDbConnection, sql: &str) -> Vec<serde_json::Value> {
    conn.query(sql).unwrap().rows
}

fn column_types(conn: &DuckDbConnection, table: &str) -> Vec<serde_json::Value> {
    rows(
        conn,
        &format!(
            "SELECT column_name, data_type FROM information_schema.columns WHERE table_schema = 'main' AND table_name = '{}' ORDER BY ordinal_position",
            table
        ),
    )
}

fn write_csv(dir: &tempfile::TempDir, name: &str, content: &str) -> String {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path.to_string_lossy().into_owned()
}

fn leftover_tables(conn: &DuckDbConnection) -> u64 {
    conn.fetch_count(
        "SELECT COUNT(*) AS \"count\" FROM information_schema.tables WHERE table_name LIKE '\\_\\_temp\\_%' ESCAPE '\\'",
    )
    .unwrap()
}

mod full_load_tests {
    use super::*;

    #[test]
    fn test_full_load_into_empty_table() {
        let destination = accounts_table();
        let conn = setup(&destination);
        let options = ImportOptions::default().with_ignored_lines(1);

        let state = Importer::new(&conn, &DuckdbDialect)
            .import(&accounts_source("tw_accounts.csv").into(), &destination, &options)
            .unwrap();

        assert_eq!(state.table_name, "accounts");
        assert_eq!(state.imported_rows_count, 4);
        assert_eq!(count(&conn, "main.accounts"), 4);
        assert_eq!(leftover_tables(&conn), 0);
    }

    #[test]
    fn test_full_load_replaces_rows_and_deduplicates() {
        let destination = accounts_table();
        let conn = setup(&destination);
        conn.execute("INSERT INTO main.accounts VALUES ('9', 'zed', 'old')")
            .unwrap();
        let options = ImportOptions::default().with_ignored_lines(1);

        let state = Importer::new(&conn, &DuckdbDialect)
            .import(
                &accounts_source("tw_accounts.duplicates.csv").into(),
                &destination,
                &options,
            )
            .unwrap();

        assert_eq!(state.imported_rows_count, 2);
        assert_eq!(count(&conn, "main.accounts WHERE id = '9'"), 0);
        assert_eq!(count(&conn, "main.accounts WHERE id = '1'"), 1);
    }
}

mod incremental_load_tests {
    use super::*;

    #[test]
    fn test_incremental_updates_and_appends() {
        let destination = accounts_table();
        let conn = setup(&destination);
        let importer = Importer::new(&conn, &DuckdbDialect);

        importer
            .import(
                &accounts_source("tw_accounts.csv").into(),
                &destination,
                &ImportOptions::default().with_ignored_lines(1),
            )
            .unwrap();
        importer
            .import(
                &accounts_source("tw_accounts.increment.csv").into(),
                &destination,
                &ImportOptions::default()
                    .with_ignored_lines(1)
                    .incremental(true),
            )
            .unwrap();

        assert_eq!(count(&conn, "main.accounts"), 6);
        assert_eq!(
            scalar(&conn, "SELECT name FROM main.accounts WHERE id = '2'"),
            serde_json::json!("bobby")
        );
        assert_eq!(
            scalar(&conn, "SELECT status FROM main.accounts WHERE id = '4'"),
            serde_json::json!("closed")
        );
        assert_eq!(
            scalar(&conn, "SELECT name FROM main.accounts WHERE id = '1'"),
            serde_json::json!("alice")
        );
        assert_eq!(leftover_tables(&conn), 0);
    }
}

mod conversion_tests {
    use super::*;

    #[test]
    fn test_cast_failure_keeps_destination_rows() {
        let destination = TableDefinition::from_ddl(
            "CREATE TABLE main.events (id VARCHAR PRIMARY KEY, created_at TIMESTAMP)",
            DialectKind::Duckdb,
        )
        .unwrap();
        let conn = setup(&destination);
        conn.execute("INSERT INTO main.events VALUES ('1', TIMESTAMP '2024-01-01 00:00:00')")
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("events.csv");
        std::fs::write(&csv, "id,created_at\n2,xxx\n").unwrap();
        let source = FileSource::new(
            csv.to_string_lossy().into_owned(),
            vec!["id".into(), "created_at".into()],
        );
        let options = ImportOptions::default()
            .with_ignored_lines(1)
            .with_cast_value_types(CastValueTypes::Cast);

        let err = Importer::new(&conn, &DuckdbDialect)
            .import(&source.into(), &destination, &options)
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::ValueConversion);
        assert!(err.to_string().starts_with("Load error: "));
        assert_eq!(count(&conn, "main.events"), 1);
        assert_eq!(leftover_tables(&conn), 0);
    }

    #[test]
    fn test_cast_into_typed_destination() {
        let destination = TableDefinition::from_ddl(
            "CREATE TABLE main.events (id VARCHAR PRIMARY KEY, created_at TIMESTAMP)",
            DialectKind::Duckdb,
        )
        .unwrap();
        let conn = setup(&destination);

        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("events.csv");
        std::fs::write(&csv, "id,created_at\n1,2024-05-01 10:00:00\n2,2024-05-02 11:30:00\n")
            .unwrap();
        let source = FileSource::new(
            csv.to_string_lossy().into_owned(),
            vec!["id".into(), "created_at".into()],
        );
        let options = ImportOptions::default()
            .with_ignored_lines(1)
            .with_cast_value_types(CastValueTypes::Cast);

        let state = Importer::new(&conn, &DuckdbDialect)
            .import(&source.into(), &destination, &options)
            .unwrap();
        assert_eq!(state.imported_rows_count, 2);
        assert_eq!(
            count(&conn, "main.events WHERE created_at > TIMESTAMP '2024-05-02 00:00:00'"),
            1
        );
    }
}

mod timestamp_tests {
    use super::*;

    #[test]
    fn test_timestamp_column_is_filled() {
        let destination = TableDefinition::from_ddl(
            "CREATE TABLE main.accounts (id VARCHAR PRIMARY KEY, name VARCHAR, status VARCHAR, _timestamp TIMESTAMP)",
            DialectKind::Duckdb,
        )
        .unwrap();
        let conn = setup(&destination);
        let options = ImportOptions::default()
            .with_ignored_lines(1)
            .with_timestamp(true);

        let state = Importer::new(&conn, &DuckdbDialect)
            .import(&accounts_source("tw_accounts.csv").into(), &destination, &options)
            .unwrap();

        assert!(state.timestamp.is_some());
        assert_eq!(count(&conn, "main.accounts WHERE _timestamp IS NULL"), 0);
        assert_eq!(
            conn.fetch_count(
                "SELECT COUNT(DISTINCT _timestamp) AS \"count\" FROM main.accounts"
            )
            .unwrap(),
            1
        );
    }
}

mod ctas_tests {
    use super::*;

    fn audited_table(name: &str) -> TableDefinition {
        TableDefinition::from_ddl(
            &format!(
                "CREATE TABLE main.{} (id VARCHAR PRIMARY KEY, name VARCHAR, status VARCHAR, _timestamp TIMESTAMP)",
                name
            ),
            DialectKind::Duckdb,
        )
        .unwrap()
    }

    fn load(conn: &DuckDbConnection, destination: &TableDefinition, options: &ImportOptions) {
        Importer::new(conn, &DuckdbDialect)
            .import(&accounts_source("tw_accounts.csv").into(), destination, options)
            .unwrap();
    }

    #[test]
    fn test_ctas_and_insert_produce_same_table() {
        let swapped = audited_table("swapped");
        let truncated = audited_table("truncated");
        let conn = setup(&swapped);
        conn.execute(&DuckdbDialect.render_create_table(&truncated))
            .unwrap();
        let options = ImportOptions::default()
            .with_ignored_lines(1)
            .with_cast_value_types(CastValueTypes::Cast);

        load(&conn, &swapped, &options.clone().with_dedup_strategy(DedupStrategy::Ctas));
        load(&conn, &truncated, &options.with_dedup_strategy(DedupStrategy::TmpTable));

        assert_eq!(
            rows(&conn, "SELECT id, name, status FROM main.swapped ORDER BY id"),
            rows(&conn, "SELECT id, name, status FROM main.truncated ORDER BY id")
        );
        assert_eq!(column_types(&conn, "swapped"), column_types(&conn, "truncated"));
        assert_eq!(leftover_tables(&conn), 0);
    }

    #[test]
    fn test_ctas_keeps_timestamp_column() {
        let destination = audited_table("accounts");
        let conn = setup(&destination);
        let options = ImportOptions::default()
            .with_ignored_lines(1)
            .with_dedup_strategy(DedupStrategy::Ctas)
            .with_cast_value_types(CastValueTypes::Cast);

        load(&conn, &destination, &options);

        let columns: Vec<serde_json::Value> = column_types(&conn, "accounts")
            .into_iter()
            .map(|row| row["column_name"].clone())
            .collect();
        assert_eq!(
            columns,
            vec![
                serde_json::json!("id"),
                serde_json::json!("name"),
                serde_json::json!("status"),
                serde_json::json!("_timestamp"),
            ]
        );
        assert_eq!(
            column_types(&conn, "accounts")[3]["data_type"],
            serde_json::json!("TIMESTAMP")
        );
        assert_eq!(count(&conn, "main.accounts"), 4);
    }

    #[test]
    fn test_ctas_fills_shared_timestamp() {
        let destination = audited_table("accounts");
        let conn = setup(&destination);
        let options = ImportOptions::default()
            .with_ignored_lines(1)
            .with_timestamp(true)
            .with_dedup_strategy(DedupStrategy::Ctas)
            .with_cast_value_types(CastValueTypes::Cast);

        load(&conn, &destination, &options);

        assert_eq!(count(&conn, "main.accounts WHERE _timestamp IS NULL"), 0);
        assert_eq!(
            conn.fetch_count("SELECT COUNT(DISTINCT _timestamp) AS \"count\" FROM main.accounts")
                .unwrap(),
            1
        );
        assert_eq!(
            column_types(&conn, "accounts")[3]["data_type"],
            serde_json::json!("TIMESTAMP")
        );
    }
}

mod dedup_tests {
    use super::*;

    #[test]
    fn test_composite_key_keeps_one_row_per_key() {
        let destination = TableDefinition::from_ddl(
            "CREATE TABLE main.visits (VisitID VARCHAR, Value VARCHAR, MenuItem VARCHAR, PRIMARY KEY (VisitID, Value, MenuItem))",
            DialectKind::Duckdb,
        )
        .unwrap();
        let conn = setup(&destination);
        let dir = tempfile::tempdir().unwrap();
        let csv = write_csv(&dir, "visits.csv", "VisitID,Value,MenuItem\n1,1,1\n1,1,1\n2,1,1\n");
        let source = FileSource::new(
            csv,
            vec!["VisitID".into(), "Value".into(), "MenuItem".into()],
        );

        let state = Importer::new(&conn, &DuckdbDialect)
            .import(&source.into(), &destination, &ImportOptions::default().with_ignored_lines(1))
            .unwrap();

        assert_eq!(state.imported_rows_count, 2);
        assert_eq!(count(&conn, "main.visits"), 2);
    }
}

mod null_handling_tests {
    use super::*;

    #[test]
    fn test_empty_values_to_null_only_for_listed_columns() {
        let destination = accounts_table();
        let conn = setup(&destination);
        let dir = tempfile::tempdir().unwrap();
        let csv = write_csv(&dir, "accounts.csv", "id,name,status\n1,,\n2,bob,open\n");
        let source = FileSource::new(csv, vec!["id".into(), "name".into(), "status".into()]);
        let options = ImportOptions::default()
            .with_ignored_lines(1)
            .with_convert_empty_values_to_null(["name"]);

        Importer::new(&conn, &DuckdbDialect)
            .import(&source.into(), &destination, &options)
            .unwrap();

        assert_eq!(count(&conn, "main.accounts WHERE name IS NULL"), 1);
        assert_eq!(count(&conn, "main.accounts WHERE status IS NULL"), 0);
        assert_eq!(
            scalar(&conn, "SELECT status FROM main.accounts WHERE id = '1'"),
            serde_json::json!("")
        );
    }
}
