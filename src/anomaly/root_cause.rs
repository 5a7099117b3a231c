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

//! Keyword-based root-cause classification of templates.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Failure category inferred from a template.
///
/// Variant order is the classification scan order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RootCauseCategory {
    MemoryPressure,
    Timeout,
    NetworkFailure,
    StorageFailure,
    AuthFailure,
    CodeBug,
    RateLimited,
    DnsFailure,
    TlsFailure,
    DatabaseFailure,
    CpuPressure,
    K8sOrchestration,
    Unknown,
}

/// First matching row wins, so more specific categories come first.
const KEYWORD_TABLE: &[(RootCauseCategory, &[&str])] = &[
    (
        RootCauseCategory::MemoryPressure,
        &[
            "out of memory",
            "oomkilled",
            "oom-kill",
            "oom kill",
            "cannot allocate memory",
            "memory limit",
            "heap space",
            "memory pressure",
            "memory exhausted",
        ],
    ),
    (
        RootCauseCategory::Timeout,
        &["timed out", "timeout", "deadline exceeded", "took too long"],
    ),
    (
        RootCauseCategory::NetworkFailure,
        &[
            "connection refused",
            "connection reset",
            "broken pipe",
            "network unreachable",
            "no route to host",
            "econnrefused",
            "econnreset",
            "connection closed",
        ],
    ),
    (
        RootCauseCategory::StorageFailure,
        &[
            "no space left",
            "disk full",
            "i/o error",
            "read-only file system",
            "disk pressure",
            "volume mount",
        ],
    ),
    (
        RootCauseCategory::AuthFailure,
        &[
            "unauthorized",
            "forbidden",
            "permission denied",
            "access denied",
            "authentication failed",
            "invalid token",
            "token expired",
        ],
    ),
    (
        RootCauseCategory::CodeBug,
        &[
            "panic",
            "null pointer",
            "nullpointerexception",
            "segmentation fault",
            "index out of range",
            "undefined is not",
            "traceback",
            "unhandled exception",
            "stack trace",
        ],
    ),
    (
        RootCauseCategory::RateLimited,
        &["rate limit", "ratelimit", "too many requests", "quota exceeded"],
    ),
    (
        RootCauseCategory::DnsFailure,
        &["no such host", "dns", "name resolution", "could not resolve"],
    ),
    (
        RootCauseCategory::TlsFailure,
        &["certificate", "x509", "tls handshake", "ssl"],
    ),
    (
        RootCauseCategory::DatabaseFailure,
        &[
            "database",
            "sql",
            "deadlock",
            "connection pool",
            "postgres",
            "mysql",
            "mongo",
            "redis",
        ],
    ),
    (
        RootCauseCategory::CpuPressure,
        &["cpu throttl", "high cpu", "cpu usage", "cpu limit"],
    ),
    (
        RootCauseCategory::K8sOrchestration,
        &[
            "crashloopbackoff",
            "back-off restarting",
            "imagepullbackoff",
            "evicted",
            "liveness",
            "readiness",
            "failedscheduling",
        ],
    ),
];

impl RootCauseCategory {
    /// Classify a template. Matching is a case-insensitive substring scan.
    #[must_use]
    pub fn infer(template: &str) -> Self {
        let lowered = template.to_lowercase();
        KEYWORD_TABLE
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|kw| lowered.contains(kw)))
            .map_or(Self::Unknown, |(category, _)| *category)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MemoryPressure => "MEMORY_PRESSURE",
            Self::Timeout => "TIMEOUT",
            Self::NetworkFailure => "NETWORK_FAILURE",
            Self::StorageFailure => "STORAGE_FAILURE",
            Self::AuthFailure => "AUTH_FAILURE",
            Self::CodeBug => "CODE_BUG",
            Self::RateLimited => "RATE_LIMITED",
            Self::DnsFailure => "DNS_FAILURE",
            Self::TlsFailure => "TLS_FAILURE",
            Self::DatabaseFailure => "DATABASE_FAILURE",
            Self::CpuPressure => "CPU_PRESSURE",
            Self::K8sOrchestration => "K8S_ORCHESTRATION",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Operator-facing explanation used in causal hypotheses
    #[must_use]
    pub fn explanation(self) -> String {
        let text = match self {
            Self::MemoryPressure => {
                "Memory exhaustion — check container/pod memory limits and for memory leaks"
            }
            Self::Timeout => {
                "Timeouts — check downstream latency, saturated dependencies and timeout settings"
            }
            Self::NetworkFailure => {
                "Network failures — check connectivity between services, network policies and peer health"
            }
            Self::StorageFailure => {
                "Storage failure — check disk space, volume mounts and filesystem health"
            }
            Self::AuthFailure => {
                "Authentication/authorization failures — check credentials, token expiry and RBAC changes"
            }
            Self::CodeBug => {
                "Application error — check the latest deployment for regressions (panics, unhandled exceptions)"
            }
            Self::RateLimited => {
                "Rate limiting — check request volume, quotas and client retry behaviour"
            }
            Self::DnsFailure => {
                "DNS resolution failures — check DNS service health and service discovery records"
            }
            Self::TlsFailure => {
                "TLS/certificate problems — check certificate expiry, CA bundles and TLS configuration"
            }
            Self::DatabaseFailure => {
                "Database problems — check database health, connection pool saturation and slow queries"
            }
            Self::CpuPressure => {
                "CPU pressure — check CPU limits, throttling and hot loops"
            }
            Self::K8sOrchestration => {
                "Orchestration problems — check pod restarts, health checks, evictions and scheduling events"
            }
            Self::Unknown => return format!("Unknown issue category: {}", self.as_str()),
        };
        text.to_string()
    }
}

impl fmt::Display for RootCauseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
