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

//! Folding normalized events into template clusters.

use crate::anomaly::RootCauseCategory;
use crate::core::record_pool::RecordSource;
use crate::core::template::{extract, ExtractedTemplate, Fingerprint};
use crate::parser::{normalize, CanonicalRecord, Severity};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Limits applied while folding events into a cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterSettings {
    /// Literal messages kept per cluster
    pub max_samples: usize,
    /// Sample messages are cut to this many characters
    pub max_sample_chars: usize,
}

impl Default for ClusterSettings {
    fn default() -> Self {
        Self {
            max_samples: 3,
            max_sample_chars: 200,
        }
    }
}

/// Events sharing one template, with aggregated statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogCluster {
    pub fingerprint: Fingerprint,
    pub template: String,
    pub count: u64,
    pub first_seen: Option<DateTime<Utc>>,
    pub last_seen: Option<DateTime<Utc>>,
    /// Highest severity code observed
    pub severity: i64,
    pub severity_name: String,
    pub applications: Vec<String>,
    pub subsystems: Vec<String>,
    pub samples: Vec<String>,
    pub sample_trace_ids: Vec<String>,
    pub root_cause: RootCauseCategory,
}

/// Worst severity first, then most frequent.
pub(crate) fn by_impact(a: &LogCluster, b: &LogCluster) -> Ordering {
    b.severity
        .cmp(&a.severity)
        .then_with(|| b.count.cmp(&a.count))
}

/// Mutable per-fingerprint state while a window is being folded
struct ClusterAccumulator {
    fingerprint: Fingerprint,
    template: String,
    count: u64,
    first_seen: Option<DateTime<Utc>>,
    last_seen: Option<DateTime<Utc>>,
    severity: Option<Severity>,
    applications: BTreeSet<String>,
    subsystems: BTreeSet<String>,
    samples: Vec<String>,
    sample_trace_ids: Vec<String>,
}

impl ClusterAccumulator {
    const fn new(fingerprint: Fingerprint, template: String) -> Self {
        Self {
            fingerprint,
            template,
            count: 0,
            first_seen: None,
            last_seen: None,
            severity: None,
            applications: BTreeSet::new(),
            subsystems: BTreeSet::new(),
            samples: Vec::new(),
            sample_trace_ids: Vec::new(),
        }
    }

    fn fold(&mut self, record: &CanonicalRecord, settings: ClusterSettings) {
        self.count += 1;

        // Ties keep the label seen first.
        match self.severity {
            Some(current) if record.severity.code() <= current.code() => {}
            Some(_) | None => self.severity = Some(record.severity),
        }

        if !record.application.is_empty() && !self.applications.contains(&record.application) {
            self.applications.insert(record.application.clone());
        }
        if !record.subsystem.is_empty() && !self.subsystems.contains(&record.subsystem) {
            self.subsystems.insert(record.subsystem.clone());
        }

        if self.samples.len() < settings.max_samples {
            self.samples.push(
                record
                    .message
                    .chars()
                    .take(settings.max_sample_chars)
                    .collect(),
            );
        }
        if !record.trace_id.is_empty()
            && self.sample_trace_ids.len() < settings.max_samples
            && !self.sample_trace_ids.contains(&record.trace_id)
        {
            self.sample_trace_ids.push(record.trace_id.clone());
        }

        if let Some(ts) = record.timestamp {
            self.first_seen = Some(self.first_seen.map_or(ts, |first| first.min(ts)));
            self.last_seen = Some(self.last_seen.map_or(ts, |last| last.max(ts)));
        }
    }

    fn finish(self) -> LogCluster {
        let severity = self.severity.unwrap_or_default();
        let root_cause = RootCauseCategory::infer(&self.template);
        LogCluster {
            fingerprint: self.fingerprint,
            template: self.template,
            count: self.count,
            first_seen: self.first_seen,
            last_seen: self.last_seen,
            severity: severity.code(),
            severity_name: severity.name().into_owned(),
            applications: self.applications.into_iter().collect(),
            subsystems: self.subsystems.into_iter().collect(),
            samples: self.samples,
            sample_trace_ids: self.sample_trace_ids,
            root_cause,
        }
    }
}

/// Builds one independent cluster collection per call.
pub struct ClusterBuilder<'a> {
    records: &'a dyn RecordSource,
    settings: ClusterSettings,
}

impl<'a> ClusterBuilder<'a> {
    #[must_use]
    pub const fn new(records: &'a dyn RecordSource, settings: ClusterSettings) -> Self {
        Self { records, settings }
    }

    /// Cluster a window of raw events.
    ///
    /// Events that are not objects or have no message are skipped. The result
    /// is ordered by severity (descending), then count (descending).
    #[must_use]
    pub fn cluster(&self, events: &[Value]) -> Vec<LogCluster> {
        profiling::scope!("ClusterBuilder::cluster");
        let mut clusters: IndexMap<Fingerprint, ClusterAccumulator> = IndexMap::new();
        let mut skipped = 0usize;

        for event in events {
            let mut record = self.records.acquire();
            if normalize(event, &mut record) && record.has_message() {
                let ExtractedTemplate {
                    template,
                    fingerprint,
                } = extract(&record.message);
                clusters
                    .entry(fingerprint.clone())
                    .or_insert_with(|| ClusterAccumulator::new(fingerprint, template))
                    .fold(&record, self.settings);
            } else {
                skipped += 1;
            }
            self.records.release(record);
        }

        let mut result: Vec<LogCluster> = clusters
            .into_values()
            .map(ClusterAccumulator::finish)
            .collect();
        result.sort_by(by_impact);

        tracing::debug!(
            events = events.len(),
            skipped,
            clusters = result.len(),
            "Clustered log window"
        );
        result
    }
}
