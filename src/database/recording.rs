//! In-memory recording connection
//!
//! Records every statement it receives instead of running it. Failures can be
//! scripted per statement fragment and `COUNT(*)` queries are answered from a
//! queue, so import sequences can be exercised without a warehouse.

use std::collections::VecDeque;
use std::sync::Mutex;

use super::{Connection, DatabaseError, DatabaseResult, QueryResult};

#[derive(Debug, Default)]
struct Recorded {
    statements: Vec<String>,
    failures: Vec<(String, String)>,
    counts: VecDeque<u64>,
}

/// Connection that records statements
#[derive(Debug, Default)]
pub struct RecordingConnection {
    state: Mutex<Recorded>,
}

impl RecordingConnection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every statement containing `fragment` with the given driver message
    pub fn fail_on(self, fragment: impl Into<String>, message: impl Into<String>) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.failures.push((fragment.into(), message.into()));
        }
        self
    }

    /// Queue answers for subsequent `COUNT(*)` queries
    pub fn with_counts(self, counts: impl IntoIterator<Item = u64>) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.counts.extend(counts);
        }
        self
    }

    /// Statements received so far, in order
    pub fn statements(&self) -> Vec<String> {
        self.state
            .lock()
            .map(|state| state.statements.clone())
            .unwrap_or_default()
    }

    /// Forget recorded statements, keeping scripted failures and counts
    pub fn clear(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.statements.clear();
        }
    }

    fn record(&self, sql: &str) -> DatabaseResult<std::sync::MutexGuard<'_, Recorded>> {
        let mut state = self
            .state
            .lock()
            .map_err(|e| DatabaseError::ConnectionFailed(format!("Lock error: {}", e)))?;
        tracing::debug!(sql = sql, "recording statement");
        state.statements.push(sql.to_string());
        if let Some((_, message)) = state
            .failures
            .iter()
            .find(|(fragment, _)| sql.contains(fragment.as_str()))
        {
            return Err(DatabaseError::QueryFailed(message.clone()));
        }
        Ok(state)
    }
}

impl Connection for RecordingConnection {
    fn execute(&self, sql: &str) -> DatabaseResult<u64> {
        let _state = self.record(sql)?;
        Ok(0)
    }

    fn query(&self, sql: &str) -> DatabaseResult<QueryResult> {
        let mut state = self.record(sql)?;
        if sql.contains("COUNT(*)") {
            let count = state.counts.pop_front().unwrap_or(0);
            return Ok(QueryResult::new(
                vec!["count".to_string()],
                vec![serde_json::json!({ "count": count })],
            ));
        }
        Ok(QueryResult::empty())
    }

    fn backend_type(&self) -> &'static str {
        "recording"
    }
}
