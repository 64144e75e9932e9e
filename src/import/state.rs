//! Import result accumulator

use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Elapsed time of one import phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timer {
    pub name: String,
    pub elapsed_ms: u64,
}

/// Outcome of an import call
///
/// Created when staging starts; the final-table importer overwrites
/// `table_name` and `imported_rows_count` with the destination results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportState {
    pub table_name: String,
    pub imported_rows_count: u64,
    pub imported_columns: Vec<String>,
    pub timers: Vec<Timer>,
    /// Literal written to `_timestamp`, when one was used
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip)]
    started: Vec<(String, Instant)>,
}

impl ImportState {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            imported_rows_count: 0,
            imported_columns: Vec::new(),
            timers: Vec::new(),
            timestamp: None,
            started: Vec::new(),
        }
    }

    pub fn start_timer(&mut self, name: &str) {
        self.started.push((name.to_string(), Instant::now()));
    }

    /// Record the elapsed time of a started timer; unknown names are ignored
    pub fn stop_timer(&mut self, name: &str) {
        if let Some(index) = self.started.iter().position(|(n, _)| n == name) {
            let (name, start) = self.started.remove(index);
            let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
            self.timers.push(Timer { name, elapsed_ms });
        }
    }

    pub fn timer(&self, name: &str) -> Option<&Timer> {
        self.timers.iter().find(|t| t.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timers() {
        let mut state = ImportState::new("stg");
        state.start_timer("stage");
        state.stop_timer("stage");
        state.stop_timer("missing");
        assert!(state.timer("stage").is_some());
        assert_eq!(state.timers.len(), 1);
    }

    #[test]
    fn test_serializes_without_running_timers() {
        let mut state = ImportState::new("accounts");
        state.imported_rows_count = 6;
        state.start_timer("merge");
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["table_name"], "accounts");
        assert_eq!(json["imported_rows_count"], 6);
        assert!(json.get("started").is_none());
        assert!(json.get("timestamp").is_none());
    }
}
