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

pub mod cluster;
pub mod record_pool;
pub mod template;

pub use cluster::{ClusterBuilder, ClusterSettings, LogCluster};
pub use record_pool::{PoolStats, RecordPool, RecordSource, Unpooled};
pub use template::{extract, ExtractedTemplate, Fingerprint};
