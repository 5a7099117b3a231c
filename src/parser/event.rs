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

//! Event normalization.
//!
//! Log services return events in several shapes: plain objects, nested
//! `labels`/`metadata`/`user_data` objects, flattened dotted keys, key/value
//! lists, and `user_data` carried as a JSON-encoded string. The normalizer
//! checks the candidates for each semantic field in a fixed priority order
//! and writes the first hit into a [`CanonicalRecord`].

use super::record::{CanonicalRecord, Severity};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Map, Value};

const MESSAGE_KEYS: &[&str] = &["message", "msg", "text", "log"];
const USER_DATA_MESSAGE_KEYS: &[&str] = &["message", "msg", "text"];
const SEVERITY_KEYS: &[&str] = &["severity", "level"];
const APPLICATION_KEYS: &[&str] = &["applicationName", "applicationname", "application", "app"];
const SUBSYSTEM_KEYS: &[&str] = &["subsystemName", "subsystemname", "subsystem"];
const TIMESTAMP_KEYS: &[&str] = &["timestamp", "@timestamp", "time", "_time"];
const TRACE_KEYS: &[&str] = &["trace_id", "traceId", "traceID"];
const SPAN_KEYS: &[&str] = &["span_id", "spanId", "spanID"];

/// Naive timestamps (no offset) are read as UTC.
const NAIVE_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Populate `record` from one event of unknown shape.
///
/// Returns `false` when the event is not a structured object; the record is
/// left untouched in that case. A `true` return with an empty message still
/// means the event must not be clustered.
pub fn normalize(event: &Value, record: &mut CanonicalRecord) -> bool {
    let Some(obj) = event.as_object() else {
        return false;
    };

    let parsed_user_data;
    let user_data = match obj.get("user_data").or_else(|| obj.get("userData")) {
        Some(Value::Object(map)) => Some(map),
        Some(Value::String(raw)) => {
            parsed_user_data = serde_json::from_str::<Map<String, Value>>(raw).ok();
            parsed_user_data.as_ref()
        }
        Some(_) | None => None,
    };

    collect_labels(obj, record);

    if let Some(message) = first_string(obj, MESSAGE_KEYS)
        .or_else(|| user_data.and_then(|ud| first_string(ud, USER_DATA_MESSAGE_KEYS)))
        .or_else(|| first_nested_string(obj, "user_data", USER_DATA_MESSAGE_KEYS))
    {
        record.message.push_str(message);
    }

    record.severity = resolve_severity(obj);

    if let Some(app) = first_string(obj, APPLICATION_KEYS)
        .or_else(|| first_nested_string(obj, "labels", APPLICATION_KEYS))
    {
        record.application.push_str(app);
    }
    if let Some(subsystem) = first_string(obj, SUBSYSTEM_KEYS)
        .or_else(|| first_nested_string(obj, "labels", SUBSYSTEM_KEYS))
    {
        record.subsystem.push_str(subsystem);
    }

    record.timestamp = TIMESTAMP_KEYS
        .iter()
        .filter_map(|key| obj.get(*key).and_then(Value::as_str))
        .chain(lookup(obj, &["metadata", "timestamp"]).and_then(Value::as_str))
        .find_map(parse_timestamp);

    if let Some(trace_id) = user_data
        .and_then(|ud| first_string(ud, TRACE_KEYS))
        .or_else(|| first_nested_string(obj, "user_data", TRACE_KEYS))
        .or_else(|| first_string(obj, TRACE_KEYS))
    {
        record.trace_id.push_str(trace_id);
    }
    if let Some(span_id) = user_data
        .and_then(|ud| first_string(ud, SPAN_KEYS))
        .or_else(|| first_nested_string(obj, "user_data", SPAN_KEYS))
        .or_else(|| first_string(obj, SPAN_KEYS))
    {
        record.span_id.push_str(span_id);
    }

    true
}

/// Parse a timestamp against the accepted formats; first success wins.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, NAIVE_TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

fn resolve_severity(obj: &Map<String, Value>) -> Severity {
    SEVERITY_KEYS
        .iter()
        .filter_map(|key| obj.get(*key))
        .chain(lookup(obj, &["metadata", "severity"]))
        .find_map(severity_from_value)
        .unwrap_or_default()
}

fn severity_from_value(value: &Value) -> Option<Severity> {
    match value {
        Value::String(label) if !label.trim().is_empty() => Some(Severity::from_label(label)),
        Value::Number(number) => number
            .as_i64()
            .or_else(|| {
                number
                    .as_f64()
                    .filter(|f| f.fract() == 0.0)
                    .map(|f| f as i64)
            })
            .map(Severity::from_code),
        Value::String(_)
        | Value::Null
        | Value::Bool(_)
        | Value::Array(_)
        | Value::Object(_) => None,
    }
}

/// Copy scalar `labels.*` values into the record.
fn collect_labels(obj: &Map<String, Value>, record: &mut CanonicalRecord) {
    match obj.get("labels") {
        Some(Value::Object(labels)) => {
            for (key, value) in labels {
                if let Some(text) = scalar_text(value) {
                    record.labels.insert(key.clone(), text);
                }
            }
        }
        Some(Value::Array(items)) => {
            for item in items {
                let key = item.get("key").and_then(Value::as_str);
                let value = item.get("value").and_then(scalar_text);
                if let (Some(key), Some(value)) = (key, value) {
                    record.labels.insert(key.to_string(), value);
                }
            }
        }
        Some(_) | None => {}
    }
    for (key, value) in obj {
        if let Some(label) = key.strip_prefix("labels.") {
            if let Some(text) = scalar_text(value) {
                record.labels.entry(label.to_string()).or_insert(text);
            }
        }
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// First non-empty string among `keys`, directly under `obj`.
fn first_string<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|key| obj.get(*key).and_then(Value::as_str))
        .find(|s| !s.is_empty())
}

/// First non-empty string among `parent.<key>`, in any of the supported encodings.
fn first_nested_string<'a>(
    obj: &'a Map<String, Value>,
    parent: &str,
    keys: &[&str],
) -> Option<&'a str> {
    keys.iter()
        .filter_map(|key| lookup(obj, &[parent, *key]).and_then(Value::as_str))
        .find(|s| !s.is_empty())
}

/// Resolve a field path as a nested object path, a flattened dotted key, or
/// a `[{"key": ..., "value": ...}]` list at the last level.
fn lookup<'a>(obj: &'a Map<String, Value>, path: &[&str]) -> Option<&'a Value> {
    let (first, rest) = path.split_first()?;
    if rest.is_empty() {
        return obj.get(*first);
    }
    if let Some(value) = obj.get(&path.join(".")) {
        return Some(value);
    }
    match obj.get(*first)? {
        Value::Object(inner) => lookup(inner, rest),
        Value::Array(items) if rest.len() == 1 => items
            .iter()
            .find(|item| item.get("key").and_then(Value::as_str) == Some(rest[0]))
            .and_then(|item| item.get("value")),
        Value::Array(_) | Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn normalized(event: &Value) -> CanonicalRecord {
        let mut record = CanonicalRecord::new();
        assert!(normalize(event, &mut record));
        record
    }

    #[test]
    fn test_flat_event() {
        let record = normalized(&json!({
            "timestamp": "2025-11-20T14:23:45.123Z",
            "severity": "Error",
            "applicationName": "checkout",
            "subsystemName": "payments",
            "message": "payment declined",
            "trace_id": "abc123",
        }));
        assert_eq!(record.message, "payment declined");
        assert_eq!(record.severity, Severity::Error);
        assert_eq!(record.application, "checkout");
        assert_eq!(record.subsystem, "payments");
        assert_eq!(record.trace_id, "abc123");
        assert!(record.timestamp.is_some());
    }

    #[test]
    fn test_message_priority() {
        let record = normalized(&json!({"msg": "second", "message": "first", "log": "fourth"}));
        assert_eq!(record.message, "first");

        let record = normalized(&json!({"message": "", "text": "third"}));
        assert_eq!(record.message, "third");
    }

    #[test]
    fn test_nested_user_data_and_labels() {
        let record = normalized(&json!({
            "labels": {"applicationname": "api", "subsystemname": "gateway", "region": "eu-1"},
            "metadata": {"severity": 5, "timestamp": "2025-11-20T14:23:45"},
            "user_data": {"msg": "upstream reset", "traceId": "t-1", "spanId": "s-1"},
        }));
        assert_eq!(record.message, "upstream reset");
        assert_eq!(record.severity, Severity::Error);
        assert_eq!(record.application, "api");
        assert_eq!(record.subsystem, "gateway");
        assert_eq!(record.trace_id, "t-1");
        assert_eq!(record.span_id, "s-1");
        assert_eq!(record.labels.get("region").map(String::as_str), Some("eu-1"));
        assert!(record.timestamp.is_some());
    }

    #[test]
    fn test_user_data_as_json_string() {
        let record = normalized(&json!({
            "userData": "{\"message\": \"cache miss\", \"trace_id\": \"xyz\"}",
        }));
        assert_eq!(record.message, "cache miss");
        assert_eq!(record.trace_id, "xyz");
    }

    #[test]
    fn test_flattened_and_key_value_encodings() {
        let record = normalized(&json!({
            "labels.applicationname": "billing",
            "user_data.message": "invoice stuck",
            "metadata": [{"key": "severity", "value": "Warning"}],
        }));
        assert_eq!(record.application, "billing");
        assert_eq!(record.message, "invoice stuck");
        assert_eq!(record.severity, Severity::Warning);

        let record = normalized(&json!({
            "message": "x",
            "labels": [{"key": "applicationname", "value": "search"}],
        }));
        assert_eq!(record.application, "search");
    }

    #[test]
    fn test_top_level_trace_used_after_user_data() {
        let record = normalized(&json!({
            "message": "m",
            "traceID": "top",
            "user_data": {"trace_id": "nested"},
        }));
        assert_eq!(record.trace_id, "nested");

        let record = normalized(&json!({"message": "m", "traceID": "top"}));
        assert_eq!(record.trace_id, "top");
    }

    #[test]
    fn test_severity_fallbacks() {
        assert_eq!(normalized(&json!({"message": "m"})).severity, Severity::Info);
        assert_eq!(
            normalized(&json!({"message": "m", "severity": "loud"})).severity,
            Severity::Info
        );
        let record = normalized(&json!({"message": "m", "severity": 8}));
        assert_eq!(record.severity.code(), 8);
        assert_eq!(record.severity.name(), "Level 8");
        assert_eq!(
            normalized(&json!({"message": "m", "level": 6.0})).severity,
            Severity::Critical
        );
    }

    #[test]
    fn test_unparseable_timestamp_is_unset() {
        let record = normalized(&json!({"message": "m", "timestamp": "yesterday-ish"}));
        assert!(record.timestamp.is_none());
        assert_eq!(record.message, "m");
    }

    #[test]
    fn test_timestamp_falls_through_bad_fields() {
        let record = normalized(&json!({
            "timestamp": "garbage",
            "@timestamp": "2025-11-20T12:00:00Z",
            "message": "m"
        }));
        assert_eq!(
            record.timestamp.map(|ts| ts.to_rfc3339()).as_deref(),
            Some("2025-11-20T12:00:00+00:00")
        );

        let record = normalized(&json!({
            "time": "  ",
            "metadata": {"timestamp": "2025-11-20T12:30:00"},
            "message": "m"
        }));
        assert_eq!(
            record.timestamp.map(|ts| ts.to_rfc3339()).as_deref(),
            Some("2025-11-20T12:30:00+00:00")
        );
    }

    #[test]
    fn test_timestamp_formats() {
        assert!(parse_timestamp("2025-11-20T14:23:45+02:00").is_some());
        assert!(parse_timestamp("2025-11-20T14:23:45.123456789Z").is_some());
        assert!(parse_timestamp("2025-11-20T14:23:45.5").is_some());
        assert!(parse_timestamp("20/11/2025 14:23").is_none());
    }

    #[test]
    fn test_non_object_event_is_rejected() {
        let mut record = CanonicalRecord::new();
        assert!(!normalize(&json!("just a string"), &mut record));
        assert!(!normalize(&json!([1, 2, 3]), &mut record));
        assert_eq!(record, CanonicalRecord::new());
    }
}
