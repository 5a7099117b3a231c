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

//! `LogDelta` - log template mining and before/after delta analysis for
//! incident root-cause investigation.
//!
//! Raw events of unknown shape are normalized into canonical records,
//! reduced to templates, folded into clusters per time window, compared
//! across the windows around an incident, and turned into a short ranked
//! list of root-cause hypotheses.

pub mod anomaly;
pub mod config;
pub mod core;
pub mod investigation;
pub mod parser;

pub use crate::anomaly::{
    compare_delta, rank, CausalHypothesis, DeltaAnalysis, RootCauseCategory, Strength,
};
pub use crate::config::AnalysisConfig;
pub use crate::core::{extract, ClusterBuilder, Fingerprint, LogCluster, RecordPool, RecordSource};
pub use crate::investigation::{
    DeltaReport, ExecutionTrace, Investigation, InvestigationError, InvestigationRequest,
    Investigator,
};
