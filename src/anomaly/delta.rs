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

//! Before/after comparison of two cluster collections.

use crate::core::cluster::{by_impact, LogCluster};
use crate::core::Fingerprint;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Ratio bands used to classify patterns present in both windows
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeltaThresholds {
    /// after/before ratio at or above which a pattern is spiking
    pub spike_ratio: f64,
    /// after/before ratio at or below which a pattern is fading
    pub fade_ratio: f64,
}

impl Default for DeltaThresholds {
    fn default() -> Self {
        Self {
            spike_ratio: 2.0,
            fade_ratio: 0.5,
        }
    }
}

/// A pattern present in both windows whose volume changed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternShift {
    /// The after-window cluster
    pub cluster: LogCluster,
    pub before_count: u64,
    pub after_count: u64,
    pub ratio: f64,
}

/// What changed between the before and after windows
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeltaAnalysis {
    /// Only in the after window, worst and most frequent first
    pub new_patterns: Vec<LogCluster>,
    /// Only in the before window
    pub disappeared_patterns: Vec<LogCluster>,
    /// Both windows, ratio >= spike ratio, highest ratio first
    pub spiking_patterns: Vec<PatternShift>,
    /// Both windows, ratio strictly between the fade and spike ratios
    pub stable_patterns: Vec<LogCluster>,
    /// Both windows, ratio <= fade ratio, lowest ratio first
    pub fading_patterns: Vec<PatternShift>,
}

/// Compare two windows with the default thresholds.
#[must_use]
pub fn compare_delta(before: &[LogCluster], after: &[LogCluster]) -> DeltaAnalysis {
    DeltaAnalyzer::default().compare(before, after)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DeltaAnalyzer {
    thresholds: DeltaThresholds,
}

impl DeltaAnalyzer {
    #[must_use]
    pub const fn new(thresholds: DeltaThresholds) -> Self {
        Self { thresholds }
    }

    #[must_use]
    pub fn compare(&self, before: &[LogCluster], after: &[LogCluster]) -> DeltaAnalysis {
        profiling::scope!("DeltaAnalyzer::compare");
        let before_map: HashMap<&Fingerprint, &LogCluster> =
            before.iter().map(|c| (&c.fingerprint, c)).collect();
        let after_map: HashMap<&Fingerprint, &LogCluster> =
            after.iter().map(|c| (&c.fingerprint, c)).collect();

        let mut delta = DeltaAnalysis::default();

        for cluster in after {
            let Some(previous) = before_map.get(&cluster.fingerprint) else {
                delta.new_patterns.push(cluster.clone());
                continue;
            };
            // Counts only grow from folded events, so a known pattern is never zero.
            if previous.count == 0 {
                continue;
            }
            let ratio = cluster.count as f64 / previous.count as f64;
            let shift = || PatternShift {
                cluster: cluster.clone(),
                before_count: previous.count,
                after_count: cluster.count,
                ratio,
            };
            if ratio >= self.thresholds.spike_ratio {
                delta.spiking_patterns.push(shift());
            } else if ratio > self.thresholds.fade_ratio {
                delta.stable_patterns.push(cluster.clone());
            } else {
                delta.fading_patterns.push(shift());
            }
        }

        delta.disappeared_patterns = before
            .iter()
            .filter(|c| !after_map.contains_key(&c.fingerprint))
            .cloned()
            .collect();

        delta.new_patterns.sort_by(by_impact);
        delta.spiking_patterns.sort_by(|a, b| b.ratio.total_cmp(&a.ratio));
        delta.fading_patterns.sort_by(|a, b| a.ratio.total_cmp(&b.ratio));

        tracing::debug!(
            new = delta.new_patterns.len(),
            disappeared = delta.disappeared_patterns.len(),
            spiking = delta.spiking_patterns.len(),
            stable = delta.stable_patterns.len(),
            fading = delta.fading_patterns.len(),
            "Compared windows"
        );
        delta
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::anomaly::RootCauseCategory;

    pub(crate) fn fake_cluster(template: &str, count: u64, severity: i64) -> LogCluster {
        LogCluster {
            fingerprint: Fingerprint::of(template),
            template: template.to_string(),
            count,
            first_seen: None,
            last_seen: None,
            severity,
            severity_name: String::new(),
            applications: Vec::new(),
            subsystems: Vec::new(),
            samples: Vec::new(),
            sample_trace_ids: Vec::new(),
            root_cause: RootCauseCategory::infer(template),
        }
    }

    #[test]
    fn test_new_disappeared_spiking() {
        let before = vec![fake_cluster("A", 10, 3), fake_cluster("B", 4, 3)];
        let after = vec![fake_cluster("A", 25, 3), fake_cluster("C", 6, 3)];
        let delta = compare_delta(&before, &after);

        assert_eq!(delta.new_patterns.len(), 1);
        assert_eq!(delta.new_patterns[0].template, "C");
        assert_eq!(delta.new_patterns[0].count, 6);

        assert_eq!(delta.disappeared_patterns.len(), 1);
        assert_eq!(delta.disappeared_patterns[0].template, "B");

        assert_eq!(delta.spiking_patterns.len(), 1);
        let spike = &delta.spiking_patterns[0];
        assert_eq!(spike.cluster.template, "A");
        assert_eq!(spike.before_count, 10);
        assert_eq!(spike.after_count, 25);
        assert!((spike.ratio - 2.5).abs() < f64::EPSILON);
        assert!(delta.stable_patterns.is_empty());
    }

    #[test]
    fn test_ratio_band_boundaries() {
        let before = vec![
            fake_cluster("exactly double", 5, 3),
            fake_cluster("slightly up", 10, 3),
            fake_cluster("exactly half", 10, 3),
            fake_cluster("collapsed", 10, 3),
        ];
        let after = vec![
            fake_cluster("exactly double", 10, 3),
            fake_cluster("slightly up", 19, 3),
            fake_cluster("exactly half", 5, 3),
            fake_cluster("collapsed", 1, 3),
        ];
        let delta = compare_delta(&before, &after);

        let spiking: Vec<_> = delta
            .spiking_patterns
            .iter()
            .map(|s| s.cluster.template.as_str())
            .collect();
        assert_eq!(spiking, vec!["exactly double"]);
        let stable: Vec<_> = delta.stable_patterns.iter().map(|c| c.template.as_str()).collect();
        assert_eq!(stable, vec!["slightly up"]);
        let fading: Vec<_> = delta
            .fading_patterns
            .iter()
            .map(|s| s.cluster.template.as_str())
            .collect();
        assert_eq!(fading, vec!["collapsed", "exactly half"]);
        assert!(delta.new_patterns.is_empty());
        assert!(delta.disappeared_patterns.is_empty());
    }

    #[test]
    fn test_orderings() {
        let before = vec![fake_cluster("x", 1, 3), fake_cluster("y", 2, 3)];
        let after = vec![
            fake_cluster("x", 3, 3),
            fake_cluster("y", 20, 3),
            fake_cluster("n1", 50, 3),
            fake_cluster("n2", 2, 5),
            fake_cluster("n3", 9, 5),
        ];
        let delta = compare_delta(&before, &after);
        let spiking: Vec<_> = delta
            .spiking_patterns
            .iter()
            .map(|s| s.cluster.template.as_str())
            .collect();
        assert_eq!(spiking, vec!["y", "x"]);
        let new: Vec<_> = delta.new_patterns.iter().map(|c| c.template.as_str()).collect();
        assert_eq!(new, vec!["n3", "n2", "n1"]);
    }

    #[test]
    fn test_empty_windows() {
        let delta = compare_delta(&[], &[]);
        assert_eq!(delta, DeltaAnalysis::default());

        let before = vec![fake_cluster("gone", 3, 3)];
        let delta = compare_delta(&before, &[]);
        assert_eq!(delta.disappeared_patterns.len(), 1);
    }
}
