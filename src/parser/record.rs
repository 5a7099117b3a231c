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

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashMap;

/// Log severity, ordered from least to most severe.
///
/// Numeric codes follow the log service's convention (1 = Debug ... 6 = Critical).
/// Codes outside that range are kept verbatim as [`Severity::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Severity {
    Debug,
    Verbose,
    #[default]
    Info,
    Warning,
    Error,
    Critical,
    Other(i64),
}

impl Severity {
    /// Map a numeric severity code to a level
    #[must_use]
    pub const fn from_code(code: i64) -> Self {
        match code {
            1 => Self::Debug,
            2 => Self::Verbose,
            3 => Self::Info,
            4 => Self::Warning,
            5 => Self::Error,
            6 => Self::Critical,
            other => Self::Other(other),
        }
    }

    /// Resolve a severity label. Numeric strings are treated as codes,
    /// unrecognized names fall back to Info.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        if let Ok(code) = label.parse::<i64>() {
            return Self::from_code(code);
        }
        match label.to_ascii_lowercase().as_str() {
            "debug" => Self::Debug,
            "verbose" | "trace" => Self::Verbose,
            "info" | "information" => Self::Info,
            "warn" | "warning" => Self::Warning,
            "error" | "err" => Self::Error,
            "critical" | "crit" | "fatal" => Self::Critical,
            _ => Self::Info,
        }
    }

    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::Debug => 1,
            Self::Verbose => 2,
            Self::Info => 3,
            Self::Warning => 4,
            Self::Error => 5,
            Self::Critical => 6,
            Self::Other(code) => code,
        }
    }

    #[must_use]
    pub fn name(self) -> Cow<'static, str> {
        match self {
            Self::Debug => Cow::Borrowed("Debug"),
            Self::Verbose => Cow::Borrowed("Verbose"),
            Self::Info => Cow::Borrowed("Info"),
            Self::Warning => Cow::Borrowed("Warning"),
            Self::Error => Cow::Borrowed("Error"),
            Self::Critical => Cow::Borrowed("Critical"),
            Self::Other(code) => Cow::Owned(format!("Level {code}")),
        }
    }
}

/// Canonical view of one log event, extracted from whatever shape the
/// log service returned.
///
/// Instances are recycled through a [`RecordSource`](crate::core::RecordSource):
/// anything derived from a record must be copied out before it is released.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CanonicalRecord {
    pub timestamp: Option<DateTime<Utc>>,
    pub severity: Severity,
    pub application: String,
    pub subsystem: String,
    pub message: String,
    pub trace_id: String,
    pub span_id: String,
    /// Scalar labels attached to the event (`labels.*`)
    pub labels: HashMap<String, String>,
}

impl CanonicalRecord {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear every field in place, keeping allocated capacity for reuse.
    pub fn reset(&mut self) {
        self.timestamp = None;
        self.severity = Severity::default();
        self.application.clear();
        self.subsystem.clear();
        self.message.clear();
        self.trace_id.clear();
        self.span_id.clear();
        self.labels.clear();
    }

    /// Records without a message never contribute to a cluster.
    #[must_use]
    pub fn has_message(&self) -> bool {
        !self.message.is_empty()
    }
}
