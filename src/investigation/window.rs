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

//! Before/after time windows around an incident instant.

use super::InvestigationError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowKind {
    Before,
    After,
}

impl fmt::Display for WindowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Before => f.write_str("before"),
            Self::After => f.write_str("after"),
        }
    }
}

/// Half-open time range `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    #[must_use]
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start <= ts && ts < self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentWindows {
    pub incident: DateTime<Utc>,
    pub before: TimeWindow,
    pub after: TimeWindow,
}

impl IncidentWindows {
    /// Windows of `minutes` on each side of an RFC 3339 incident instant.
    pub fn around(incident: &str, minutes: i64) -> Result<Self, InvestigationError> {
        let parsed = DateTime::parse_from_rfc3339(incident.trim()).map_err(|source| {
            InvestigationError::InvalidIncidentTime {
                value: incident.to_string(),
                source,
            }
        })?;
        Self::at(parsed.with_timezone(&Utc), minutes)
    }

    pub fn at(incident: DateTime<Utc>, minutes: i64) -> Result<Self, InvestigationError> {
        let invalid = || InvestigationError::InvalidWindow { minutes };
        let span = Duration::try_minutes(minutes)
            .filter(|span| *span > Duration::zero())
            .ok_or_else(invalid)?;
        let start = incident.checked_sub_signed(span).ok_or_else(invalid)?;
        let end = incident.checked_add_signed(span).ok_or_else(invalid)?;
        Ok(Self {
            incident,
            before: TimeWindow {
                start,
                end: incident,
            },
            after: TimeWindow {
                start: incident,
                end,
            },
        })
    }

    #[must_use]
    pub const fn window(&self, kind: WindowKind) -> TimeWindow {
        match kind {
            WindowKind::Before => self.before,
            WindowKind::After => self.after,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_windows_around_incident() {
        let windows = IncidentWindows::around("2025-11-20T12:00:00Z", 15).unwrap();
        assert_eq!(windows.before.start.to_rfc3339(), "2025-11-20T11:45:00+00:00");
        assert_eq!(windows.before.end, windows.incident);
        assert_eq!(windows.after.start, windows.incident);
        assert_eq!(windows.after.end.to_rfc3339(), "2025-11-20T12:15:00+00:00");

        assert!(windows.after.contains(windows.incident));
        assert!(!windows.before.contains(windows.incident));
    }

    #[test]
    fn test_offset_is_normalized_to_utc() {
        let windows = IncidentWindows::around("2025-11-20T14:00:00+02:00", 5).unwrap();
        assert_eq!(windows.incident.to_rfc3339(), "2025-11-20T12:00:00+00:00");
    }

    #[test]
    fn test_rejects_malformed_input() {
        assert!(matches!(
            IncidentWindows::around("around noon", 15),
            Err(InvestigationError::InvalidIncidentTime { .. })
        ));
        assert!(matches!(
            IncidentWindows::around("2025-11-20T12:00:00Z", 0),
            Err(InvestigationError::InvalidWindow { minutes: 0 })
        ));
    }

    #[test]
    fn test_rejects_spans_past_the_calendar() {
        assert!(matches!(
            IncidentWindows::around("2025-11-20T12:00:00Z", 1_000_000_000_000),
            Err(InvestigationError::InvalidWindow {
                minutes: 1_000_000_000_000
            })
        ));
        assert!(matches!(
            IncidentWindows::around("2025-11-20T12:00:00Z", i64::MAX),
            Err(InvestigationError::InvalidWindow { .. })
        ));
        // Near the end of the representable range only the after side overflows.
        assert!(IncidentWindows::at(DateTime::<Utc>::MAX_UTC, 1).is_err());
    }
}
