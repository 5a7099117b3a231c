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

//! The full investigation pipeline: fetch both windows, cluster them,
//! compare, and rank candidate root causes.

pub mod source;
pub mod window;

pub use source::{
    JsonFileExecutor, QueryError, QueryExecutor, QuerySyntax, QueryTier, SourceError, WindowQuery,
};
pub use window::{IncidentWindows, TimeWindow, WindowKind};

use crate::anomaly::{rank, CausalHypothesis, DeltaAnalysis, DeltaAnalyzer};
use crate::config::AnalysisConfig;
use crate::core::{ClusterBuilder, LogCluster, RecordPool, RecordSource};
use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Failures surfaced before the clustering pipeline runs.
///
/// Clustering, comparison and ranking themselves never fail.
#[derive(Debug, Error)]
pub enum InvestigationError {
    #[error("Invalid incident timestamp '{value}': {source}")]
    InvalidIncidentTime {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("Window span must be a positive number of minutes, got {minutes}")]
    InvalidWindow { minutes: i64 },

    #[error("Query for the {window} window failed: {source}")]
    QueryFailed {
        window: WindowKind,
        #[source]
        source: QueryError,
    },
}

/// Short record of what a pipeline run did, for downstream reasoning tools
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionTrace {
    pub tool: String,
    pub elapsed_ms: u64,
    pub before_events: usize,
    pub after_events: usize,
    pub before_patterns: usize,
    pub after_patterns: usize,
    pub new_patterns: usize,
    pub spiking_patterns: usize,
}

/// Result of comparing two windows of events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeltaReport {
    pub before_clusters: Vec<LogCluster>,
    pub after_clusters: Vec<LogCluster>,
    pub delta: DeltaAnalysis,
    pub hypotheses: Vec<CausalHypothesis>,
    pub trace: ExecutionTrace,
}

/// Parameters of an incident investigation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvestigationRequest {
    /// RFC 3339 incident instant
    pub incident: String,
    /// Filter text passed to the query executor for both windows
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub tier: QueryTier,
    #[serde(default)]
    pub syntax: QuerySyntax,
    /// Overrides the configured window width
    #[serde(default)]
    pub window_minutes: Option<i64>,
}

impl InvestigationRequest {
    #[must_use]
    pub fn new(incident: impl Into<String>) -> Self {
        Self {
            incident: incident.into(),
            query: String::new(),
            tier: QueryTier::default(),
            syntax: QuerySyntax::default(),
            window_minutes: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Investigation {
    pub windows: IncidentWindows,
    #[serde(flatten)]
    pub report: DeltaReport,
}

/// Entry point shared by concurrent investigation requests.
///
/// The record source is the only state shared between calls. Configuration
/// can be replaced while requests are in flight; each call works on the
/// snapshot it started with.
pub struct Investigator {
    records: Arc<dyn RecordSource>,
    config: ArcSwap<AnalysisConfig>,
}

impl Investigator {
    #[must_use]
    pub fn new(config: AnalysisConfig) -> Self {
        let records = Arc::new(RecordPool::new(config.max_idle_records));
        Self::with_records(config, records)
    }

    #[must_use]
    pub fn with_records(config: AnalysisConfig, records: Arc<dyn RecordSource>) -> Self {
        Self {
            records,
            config: ArcSwap::from_pointee(config),
        }
    }

    #[must_use]
    pub fn config(&self) -> Arc<AnalysisConfig> {
        self.config.load_full()
    }

    pub fn update_config(&self, config: AnalysisConfig) {
        tracing::info!("Analysis configuration updated");
        self.config.store(Arc::new(config));
    }

    /// Cluster both windows, compare them and rank root causes.
    #[must_use]
    pub fn analyze(&self, before: &[Value], after: &[Value]) -> DeltaReport {
        profiling::scope!("Investigator::analyze");
        let started = Instant::now();
        let config = self.config();
        let builder = ClusterBuilder::new(&*self.records, config.cluster);

        let (before_clusters, after_clusters) =
            rayon::join(|| builder.cluster(before), || builder.cluster(after));
        let delta = DeltaAnalyzer::new(config.delta).compare(&before_clusters, &after_clusters);
        let hypotheses = rank(&delta);

        let trace = ExecutionTrace {
            tool: "analyze_log_delta".to_string(),
            elapsed_ms: elapsed_ms(started),
            before_events: before.len(),
            after_events: after.len(),
            before_patterns: before_clusters.len(),
            after_patterns: after_clusters.len(),
            new_patterns: delta.new_patterns.len(),
            spiking_patterns: delta.spiking_patterns.len(),
        };
        tracing::debug!(?trace, "Delta analysis finished");

        DeltaReport {
            before_clusters,
            after_clusters,
            delta,
            hypotheses,
            trace,
        }
    }

    /// Fetch the windows around an incident and analyze them.
    ///
    /// Malformed incident timestamps and failing queries are rejected before
    /// any clustering happens.
    pub fn investigate(
        &self,
        executor: &dyn QueryExecutor,
        request: &InvestigationRequest,
    ) -> Result<Investigation, InvestigationError> {
        let started = Instant::now();
        let config = self.config();
        let minutes = request.window_minutes.unwrap_or(config.window_minutes);
        let windows = IncidentWindows::around(&request.incident, minutes)?;
        tracing::info!(
            incident = %windows.incident,
            minutes,
            query = %request.query,
            "Investigating incident"
        );

        let before = fetch(executor, request, &windows, WindowKind::Before, &config)?;
        let after = fetch(executor, request, &windows, WindowKind::After, &config)?;

        let mut report = self.analyze(&before, &after);
        report.trace.tool = "investigate_incident".to_string();
        report.trace.elapsed_ms = elapsed_ms(started);

        if let Some(top) = report.hypotheses.first() {
            tracing::info!(
                category = %top.category,
                strength = ?top.strength,
                evidence = top.evidence_count,
                "Top root-cause hypothesis"
            );
        }
        Ok(Investigation { windows, report })
    }
}

fn fetch(
    executor: &dyn QueryExecutor,
    request: &InvestigationRequest,
    windows: &IncidentWindows,
    kind: WindowKind,
    config: &AnalysisConfig,
) -> Result<Vec<Value>, InvestigationError> {
    let window = windows.window(kind);
    let query = WindowQuery {
        filter: request.query.clone(),
        tier: request.tier,
        syntax: request.syntax,
        start: window.start,
        end: window.end,
        limit: config.max_events_per_window,
    };
    let mut events = executor
        .execute(&query)
        .map_err(|source| InvestigationError::QueryFailed { window: kind, source })?;
    if events.len() > query.limit {
        tracing::warn!(
            "{kind} window returned {} events, keeping the first {}",
            events.len(),
            query.limit
        );
        events.truncate(query.limit);
    }
    tracing::debug!("Fetched {} events for the {kind} window", events.len());
    Ok(events)
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anomaly::{RootCauseCategory, Strength};
    use crate::core::Unpooled;
    use serde_json::json;

    struct FixedExecutor {
        before: Vec<Value>,
        after: Vec<Value>,
    }

    impl QueryExecutor for FixedExecutor {
        fn execute(&self, query: &WindowQuery) -> Result<Vec<Value>, QueryError> {
            let incident = crate::parser::parse_timestamp("2025-11-20T12:00:00Z").unwrap();
            if query.end <= incident {
                Ok(self.before.clone())
            } else {
                Ok(self.after.clone())
            }
        }
    }

    struct FailingExecutor;

    impl QueryExecutor for FailingExecutor {
        fn execute(&self, _query: &WindowQuery) -> Result<Vec<Value>, QueryError> {
            Err("backend unavailable".into())
        }
    }

    fn repeat(message: &str, severity: i64, n: usize) -> Vec<Value> {
        (0..n)
            .map(|i| {
                json!({
                    "message": format!("{message} {i}"),
                    "severity": severity,
                    "applicationName": "api"
                })
            })
            .collect()
    }

    #[test]
    fn test_investigate_incident() {
        let mut before = repeat("request served in", 3, 20);
        before.extend(repeat("upstream request timed out after", 5, 2));
        let mut after = repeat("request served in", 3, 18);
        after.extend(repeat("upstream request timed out after", 5, 12));
        after.extend(repeat("database deadlock detected on table", 5, 3));

        let investigator = Investigator::new(AnalysisConfig::default());
        let investigation = investigator
            .investigate(
                &FixedExecutor { before, after },
                &InvestigationRequest::new("2025-11-20T12:00:00Z"),
            )
            .unwrap();

        let report = &investigation.report;
        assert_eq!(report.trace.tool, "investigate_incident");
        assert_eq!(report.trace.before_events, 22);
        assert_eq!(report.trace.after_events, 33);
        assert_eq!(report.trace.new_patterns, 1);
        assert_eq!(report.trace.spiking_patterns, 1);
        assert_eq!(report.delta.stable_patterns.len(), 1);

        assert_eq!(report.hypotheses[0].category, RootCauseCategory::Timeout);
        assert_eq!(report.hypotheses[0].strength, Strength::Strong);
        assert_eq!(report.hypotheses[1].category, RootCauseCategory::DatabaseFailure);
        assert_eq!(report.hypotheses[1].strength, Strength::Weak);
    }

    #[test]
    fn test_window_cap() {
        let events = repeat("tick", 3, 40);
        let mut config = AnalysisConfig::default();
        config.max_events_per_window = 10;
        let investigator = Investigator::with_records(config, Arc::new(Unpooled));
        let investigation = investigator
            .investigate(
                &FixedExecutor {
                    before: events.clone(),
                    after: events,
                },
                &InvestigationRequest::new("2025-11-20T12:00:00Z"),
            )
            .unwrap();
        assert_eq!(investigation.report.trace.before_events, 10);
        assert_eq!(investigation.report.before_clusters[0].count, 10);
    }

    #[test]
    fn test_errors_before_clustering() {
        let investigator = Investigator::new(AnalysisConfig::default());
        let err = investigator
            .investigate(&FailingExecutor, &InvestigationRequest::new("2025-11-20T12:00:00Z"))
            .unwrap_err();
        assert!(matches!(
            err,
            InvestigationError::QueryFailed {
                window: WindowKind::Before,
                ..
            }
        ));

        let err = investigator
            .investigate(&FailingExecutor, &InvestigationRequest::new("not a time"))
            .unwrap_err();
        assert!(matches!(err, InvestigationError::InvalidIncidentTime { .. }));
    }

    #[test]
    fn test_config_swap() {
        let investigator = Investigator::new(AnalysisConfig::default());
        let mut config = AnalysisConfig::default();
        config.delta.spike_ratio = 10.0;
        investigator.update_config(config);

        let before = repeat("job queued", 3, 5);
        let after = repeat("job queued", 3, 15);
        let report = investigator.analyze(&before, &after);
        assert!(report.delta.spiking_patterns.is_empty());
        assert_eq!(report.delta.stable_patterns.len(), 1);
        assert_eq!(report.trace.tool, "analyze_log_delta");
    }
}
