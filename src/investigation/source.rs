// LogDelta - GPL-3.0-or-later
// This file is part of LogDelta.
//
// Copyright (C) 2026 The LogDelta Authors
//
// LogDelta is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// LogDelta is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with LogDelta.  If not, see <https://www.gnu.org/licenses/>.

//! The boundary to the service that executes window queries, plus a
//! file-backed implementation for offline analysis of exported logs.

use super::window::TimeWindow;
use crate::parser::{normalize, CanonicalRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error type returned by query executors
pub type QueryError = Box<dyn std::error::Error + Send + Sync>;

/// Storage tier a query runs against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryTier {
    #[default]
    FrequentSearch,
    Archive,
}

/// Query language of the filter text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuerySyntax {
    #[default]
    DataPrime,
    Lucene,
}

/// One window's query, as handed to the executor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowQuery {
    pub filter: String,
    pub tier: QueryTier,
    pub syntax: QuerySyntax,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Maximum number of events to return
    pub limit: usize,
}

impl WindowQuery {
    #[must_use]
    pub const fn window(&self) -> TimeWindow {
        TimeWindow {
            start: self.start,
            end: self.end,
        }
    }
}

/// Runs a window query and returns raw events of unknown shape.
pub trait QueryExecutor {
    fn execute(&self, query: &WindowQuery) -> Result<Vec<Value>, QueryError>;
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to read events from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path} at line {line}: {source}")]
    Parse {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Serves queries from an exported JSON file.
///
/// The file holds either a JSON array of events or one event per line. Events
/// are matched on their resolved timestamp (events without one never match),
/// and the filter text is applied as a case-insensitive substring of the
/// resolved message.
#[derive(Debug, Clone, Default)]
pub struct JsonFileExecutor {
    events: Vec<Value>,
}

impl JsonFileExecutor {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let contents = std::fs::read_to_string(path).map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let events = parse_events(&contents).map_err(|(line, source)| SourceError::Parse {
            path: path.to_path_buf(),
            line,
            source,
        })?;
        tracing::info!("Loaded {} events from {}", events.len(), path.display());
        Ok(Self { events })
    }

    #[must_use]
    pub const fn from_events(events: Vec<Value>) -> Self {
        Self { events }
    }

    #[must_use]
    pub fn events(&self) -> &[Value] {
        &self.events
    }
}

impl QueryExecutor for JsonFileExecutor {
    fn execute(&self, query: &WindowQuery) -> Result<Vec<Value>, QueryError> {
        let needle = query.filter.trim().to_lowercase();
        let window = query.window();
        let mut record = CanonicalRecord::new();
        let mut matched = Vec::new();

        for event in &self.events {
            if matched.len() >= query.limit {
                break;
            }
            record.reset();
            if !normalize(event, &mut record) {
                continue;
            }
            let in_window = record.timestamp.is_some_and(|ts| window.contains(ts));
            if in_window && (needle.is_empty() || record.message.to_lowercase().contains(&needle))
            {
                matched.push(event.clone());
            }
        }
        Ok(matched)
    }
}

/// Parse a JSON array, or newline-delimited JSON. Errors carry a 1-based line.
pub fn parse_events(contents: &str) -> Result<Vec<Value>, (usize, serde_json::Error)> {
    if contents.trim_start().starts_with('[') {
        return serde_json::from_str(contents).map_err(|e| (e.line(), e));
    }
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| serde_json::from_str(line).map_err(|e| (idx + 1, e)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn query(filter: &str, start: &str, end: &str, limit: usize) -> WindowQuery {
        WindowQuery {
            filter: filter.to_string(),
            tier: QueryTier::default(),
            syntax: QuerySyntax::default(),
            start: crate::parser::parse_timestamp(start).unwrap(),
            end: crate::parser::parse_timestamp(end).unwrap(),
            limit,
        }
    }

    #[test]
    fn test_parse_array_and_ndjson() {
        let array = parse_events(r#"[{"message": "a"}, {"message": "b"}]"#).unwrap();
        assert_eq!(array.len(), 2);

        let lines = parse_events("{\"message\": \"a\"}\n\n{\"message\": \"b\"}\n").unwrap();
        assert_eq!(lines.len(), 2);

        let (line, _) = parse_events("{\"message\": \"a\"}\n{oops\n").unwrap_err();
        assert_eq!(line, 2);
    }

    #[test]
    fn test_window_filter_and_limit() {
        let executor = JsonFileExecutor::from_events(vec![
            json!({"timestamp": "2025-11-20T11:59:00Z", "message": "Payment failed"}),
            json!({"timestamp": "2025-11-20T12:01:00Z", "message": "payment FAILED again"}),
            json!({"timestamp": "2025-11-20T12:02:00Z", "message": "user login"}),
            json!({"timestamp": "2025-11-20T12:03:00Z", "message": "payment failed thrice"}),
            json!({"message": "payment failed, no timestamp"}),
        ]);

        let all = executor
            .execute(&query("", "2025-11-20T12:00:00Z", "2025-11-20T12:30:00Z", 500))
            .unwrap();
        assert_eq!(all.len(), 3);

        let filtered = executor
            .execute(&query("payment failed", "2025-11-20T12:00:00Z", "2025-11-20T12:30:00Z", 500))
            .unwrap();
        assert_eq!(filtered.len(), 2);

        let capped = executor
            .execute(&query("", "2025-11-20T11:00:00Z", "2025-11-20T13:00:00Z", 2))
            .unwrap();
        assert_eq!(capped.len(), 2);
    }

    #[test]
    fn test_window_is_half_open() {
        let executor = JsonFileExecutor::from_events(vec![
            json!({"timestamp": "2025-11-20T12:00:00Z", "message": "at start"}),
            json!({"timestamp": "2025-11-20T12:14:59.999Z", "message": "just inside"}),
            json!({"timestamp": "2025-11-20T12:15:00Z", "message": "at end"}),
        ]);
        let query = query("", "2025-11-20T12:00:00Z", "2025-11-20T12:15:00Z", 500);
        assert!(query.window().contains(query.start));
        assert!(!query.window().contains(query.end));

        let matched = executor.execute(&query).unwrap();
        let messages: Vec<_> = matched.iter().map(|e| e["message"].as_str()).collect();
        assert_eq!(messages, vec![Some("at start"), Some("just inside")]);
    }

    #[test]
    fn test_open_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"message": "one", "timestamp": "2025-11-20T12:00:00Z"}}"#).unwrap();
        writeln!(file, r#"{{"message": "two", "timestamp": "2025-11-20T12:00:01Z"}}"#).unwrap();
        let executor = JsonFileExecutor::open(file.path()).unwrap();
        assert_eq!(executor.events().len(), 2);

        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            JsonFileExecutor::open(&dir.path().join("nope.json")),
            Err(SourceError::Io { .. })
        ));
    }
}
