//! Database connection abstraction
//!
//! The importers only ever hand SQL text to a [`Connection`]. Two
//! implementations ship with the crate:
//! - [`RecordingConnection`]: in-memory, records every statement; used for
//!   dry runs and exact-SQL tests
//! - `DuckDbConnection`: embedded DuckDB (feature `duckdb-backend`)
//!
//! Calls block until the statement completes. One connection serves one
//! import at a time.

use serde::{Deserialize, Serialize};

#[cfg(feature = "duckdb-backend")]
pub mod duckdb;

pub mod recording;

#[cfg(feature = "duckdb-backend")]
pub use self::duckdb::DuckDbConnection;

pub use recording::RecordingConnection;

/// Error type for database operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum DatabaseError {
    /// Failed to connect to database
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Statement execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Result did not have the expected shape
    #[error("Unexpected result: {0}")]
    UnexpectedResult(String),
}

impl DatabaseError {
    /// Driver message without the variant prefix
    pub fn message(&self) -> &str {
        match self {
            DatabaseError::ConnectionFailed(m)
            | DatabaseError::QueryFailed(m)
            | DatabaseError::UnexpectedResult(m) => m,
        }
    }
}

/// Result type for database operations
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Query result row as a JSON value
pub type QueryRow = serde_json::Value;

/// Query result set
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryResult {
    /// Column names
    pub columns: Vec<String>,
    /// Rows of data
    pub rows: Vec<QueryRow>,
    /// Execution time in milliseconds
    pub execution_time_ms: u64,
}

impl QueryResult {
    /// Create a new query result
    pub fn new(columns: Vec<String>, rows: Vec<QueryRow>) -> Self {
        Self {
            columns,
            rows,
            execution_time_ms: 0,
        }
    }

    /// Create an empty result
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First column of the first row
    pub fn scalar(&self) -> Option<&serde_json::Value> {
        let column = self.columns.first()?;
        self.rows.first()?.get(column)
    }
}

/// Blocking SQL connection used by the importers
pub trait Connection {
    /// Execute a statement that returns no rows
    ///
    /// # Returns
    /// Number of rows affected, when the driver reports it
    fn execute(&self, sql: &str) -> DatabaseResult<u64>;

    /// Execute a query and collect its rows
    fn query(&self, sql: &str) -> DatabaseResult<QueryResult>;

    /// Run a single-value `COUNT(*)` query
    fn fetch_count(&self, sql: &str) -> DatabaseResult<u64> {
        let result = self.query(sql)?;
        let value = result
            .scalar()
            .ok_or_else(|| DatabaseError::UnexpectedResult("count query returned no rows".into()))?;
        match value {
            serde_json::Value::Number(n) => n.as_u64(),
            serde_json::Value::String(s) => s.parse().ok(),
            _ => None,
        }
        .ok_or_else(|| DatabaseError::UnexpectedResult(format!("not a count: {}", value)))
    }

    /// Get the backend type name
    fn backend_type(&self) -> &'static str;

    /// Check connection health
    fn health_check(&self) -> DatabaseResult<bool> {
        let result = self.query("SELECT 1 AS healthy")?;
        Ok(!result.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct FixedConnection(QueryResult);

    impl Connection for FixedConnection {
        fn execute(&self, _sql: &str) -> DatabaseResult<u64> {
            Ok(0)
        }

        fn query(&self, _sql: &str) -> DatabaseResult<QueryResult> {
            Ok(self.0.clone())
        }

        fn backend_type(&self) -> &'static str {
            "fixed"
        }
    }

    #[test]
    fn test_query_result_scalar() {
        let result = QueryResult::new(vec!["count".into()], vec![json!({"count": 3})]);
        assert_eq!(result.scalar(), Some(&json!(3)));
        assert!(QueryResult::empty().scalar().is_none());
    }

    #[test]
    fn test_fetch_count_accepts_numbers_and_strings() {
        let numeric = FixedConnection(QueryResult::new(
            vec!["count".into()],
            vec![json!({"count": 7})],
        ));
        assert_eq!(numeric.fetch_count("SELECT COUNT(*)").unwrap(), 7);

        // HUGEINT counts come back as strings
        let text = FixedConnection(QueryResult::new(
            vec!["count".into()],
            vec![json!({"count": "12"})],
        ));
        assert_eq!(text.fetch_count("SELECT COUNT(*)").unwrap(), 12);
    }

    #[test]
    fn test_fetch_count_empty_result() {
        let conn = FixedConnection(QueryResult::empty());
        assert!(matches!(
            conn.fetch_count("SELECT COUNT(*)"),
            Err(DatabaseError::UnexpectedResult(_))
        ));
    }

    #[test]
    fn test_error_message_strips_prefix() {
        let err = DatabaseError::QueryFailed("boom".into());
        assert_eq!(err.to_string(), "Query failed: boom");
        assert_eq!(err.message(), "boom");
    }
}
