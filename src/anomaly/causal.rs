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

//! Ranking of candidate root causes from a delta analysis.

use super::delta::DeltaAnalysis;
use super::root_cause::RootCauseCategory;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// At most this many hypotheses are returned
pub const MAX_HYPOTHESES: usize = 3;

/// Evidence above this makes the top hypothesis strong
const STRONG_EVIDENCE: u64 = 10;
/// Evidence above this makes any hypothesis at least moderate
const MODERATE_EVIDENCE: u64 = 5;

const INSUFFICIENT_SIGNAL: &str =
    "Insufficient signal to determine a root cause: widen the time window or broaden the query";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strength {
    Strong,
    Moderate,
    Weak,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CausalHypothesis {
    pub description: String,
    pub strength: Strength,
    pub category: RootCauseCategory,
    /// Occurrences backing this hypothesis
    pub evidence_count: u64,
}

/// Rank root-cause categories by the volume of new and spiking patterns.
///
/// Disappeared, stable and fading patterns carry no evidence. Spiking patterns
/// contribute their after-window count.
#[must_use]
pub fn rank(delta: &DeltaAnalysis) -> Vec<CausalHypothesis> {
    let mut evidence: BTreeMap<RootCauseCategory, u64> = BTreeMap::new();
    for cluster in &delta.new_patterns {
        *evidence.entry(cluster.root_cause).or_insert(0) += cluster.count;
    }
    for spike in &delta.spiking_patterns {
        *evidence.entry(spike.cluster.root_cause).or_insert(0) += spike.after_count;
    }
    evidence.remove(&RootCauseCategory::Unknown);

    // BTreeMap iteration is in scan order, so the stable sort breaks ties by it.
    let mut ranked: Vec<(RootCauseCategory, u64)> =
        evidence.into_iter().filter(|(_, count)| *count > 0).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.truncate(MAX_HYPOTHESES);

    if ranked.is_empty() {
        return vec![CausalHypothesis {
            description: INSUFFICIENT_SIGNAL.to_string(),
            strength: Strength::Weak,
            category: RootCauseCategory::Unknown,
            evidence_count: 0,
        }];
    }

    ranked
        .into_iter()
        .enumerate()
        .map(|(position, (category, count))| CausalHypothesis {
            description: category.explanation(),
            strength: strength_for(position, count),
            category,
            evidence_count: count,
        })
        .collect()
}

const fn strength_for(position: usize, count: u64) -> Strength {
    if position == 0 && count > STRONG_EVIDENCE {
        Strength::Strong
    } else if position == 0 || count > MODERATE_EVIDENCE {
        Strength::Moderate
    } else {
        Strength::Weak
    }
}
