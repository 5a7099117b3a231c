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

use crate::anomaly::DeltaThresholds;
use crate::core::cluster::ClusterSettings;
use crate::core::record_pool::DEFAULT_MAX_IDLE;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Analysis settings, stored as JSON in the user's config directory.
///
/// Every field has a default, so partial files are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub cluster: ClusterSettings,
    pub delta: DeltaThresholds,
    /// Width of each of the before/after windows around an incident
    pub window_minutes: i64,
    /// Events fetched per window
    pub max_events_per_window: usize,
    /// Idle canonical records kept by the shared pool
    pub max_idle_records: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            cluster: ClusterSettings::default(),
            delta: DeltaThresholds::default(),
            window_minutes: 15,
            max_events_per_window: 500,
            max_idle_records: DEFAULT_MAX_IDLE,
        }
    }
}

impl AnalysisConfig {
    /// Get the path to the user config file
    #[must_use]
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("logdelta").join("config.json"))
    }

    /// Load the user config, returning defaults if it is missing or unreadable
    #[must_use]
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        if !path.exists() {
            tracing::info!("No config found at {}, using defaults", path.display());
            return Self::default();
        }
        Self::load_from(&path).unwrap_or_else(|e| {
            tracing::warn!("{e}; using defaults");
            Self::default()
        })
    }

    /// Load config from an explicit file
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self =
            serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        tracing::info!(
            "Loaded config from {} (window {}m, {} events/window)",
            path.display(),
            config.window_minutes,
            config.max_events_per_window
        );
        Ok(config)
    }
}
