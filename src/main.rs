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

use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use logdelta::config::AnalysisConfig;
use logdelta::investigation::{JsonFileExecutor, QuerySyntax, QueryTier};
use logdelta::{InvestigationRequest, Investigator};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[cfg(feature = "ram-profiling")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TierArg {
    Frequent,
    Archive,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SyntaxArg {
    Dataprime,
    Lucene,
}

#[derive(Parser, Debug)]
#[command(name = "logdelta")]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ")"))]
#[command(
    about = "Cluster log events around an incident and rank likely root causes",
    long_about = None
)]
struct Args {
    /// Events from the window before the incident (JSON array or one event per line)
    #[arg(long, value_name = "FILE", requires = "after", conflicts_with = "events")]
    before: Option<PathBuf>,

    /// Events from the window after the incident
    #[arg(long, value_name = "FILE", requires = "before")]
    after: Option<PathBuf>,

    /// A single export to split around --incident
    #[arg(long, value_name = "FILE", requires = "incident")]
    events: Option<PathBuf>,

    /// Incident instant (RFC 3339), used with --events
    #[arg(long, value_name = "TIMESTAMP", conflicts_with = "before")]
    incident: Option<String>,

    /// Width of each window in minutes (defaults to the configured value)
    #[arg(long, conflicts_with = "before")]
    window_minutes: Option<i64>,

    /// Case-insensitive text every event message must contain
    #[arg(long, default_value = "", conflicts_with = "before")]
    query: String,

    #[arg(
        long,
        value_enum,
        default_value = "frequent",
        conflicts_with = "before"
    )]
    tier: TierArg,

    #[arg(
        long,
        value_enum,
        default_value = "dataprime",
        conflicts_with = "before"
    )]
    syntax: SyntaxArg,

    /// Read settings from this file instead of the user config directory
    #[arg(long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Print single-line JSON
    #[arg(long)]
    compact: bool,

    /// Path for the DHAT heap profiling output (only used when built with --features ram-profiling)
    #[cfg(feature = "ram-profiling")]
    #[arg(
        long = "profile-output",
        value_name = "PROFILE_FILE",
        default_value = "dhat-heap.json"
    )]
    profile_output: PathBuf,
}

fn main() -> anyhow::Result<()> {
    // Set RUST_LOG to override (e.g., RUST_LOG=debug). Logs go to stderr,
    // stdout carries the JSON report.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    tracing::info!(
        "LogDelta starting up (version {}, {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH")
    );

    #[cfg(feature = "ram-profiling")]
    let _profiler = {
        tracing::info!("RAM profiling enabled, output: {:?}", args.profile_output);
        dhat::Profiler::builder()
            .file_name(args.profile_output.clone())
            .build()
    };

    #[cfg(feature = "cpu-profiling")]
    {
        tracing::info!("CPU profiling enabled with Tracy - run Tracy profiler to connect");
    }

    let config = match &args.config {
        Some(path) => AnalysisConfig::load_from(path)?,
        None => AnalysisConfig::load(),
    };
    let investigator = Investigator::new(config);

    let report = match (&args.before, &args.after, &args.events) {
        (Some(before), Some(after), None) => {
            let before = JsonFileExecutor::open(before)?;
            let after = JsonFileExecutor::open(after)?;
            serde_json::to_value(investigator.analyze(before.events(), after.events()))?
        }
        (None, None, Some(events)) => {
            let Some(incident) = &args.incident else {
                bail!("--events requires --incident");
            };
            let executor = JsonFileExecutor::open(events)?;
            let request = InvestigationRequest {
                incident: incident.clone(),
                query: args.query.clone(),
                tier: match args.tier {
                    TierArg::Frequent => QueryTier::FrequentSearch,
                    TierArg::Archive => QueryTier::Archive,
                },
                syntax: match args.syntax {
                    SyntaxArg::Dataprime => QuerySyntax::DataPrime,
                    SyntaxArg::Lucene => QuerySyntax::Lucene,
                },
                window_minutes: args.window_minutes,
            };
            let investigation = investigator
                .investigate(&executor, &request)
                .with_context(|| format!("Investigation of {} failed", events.display()))?;
            serde_json::to_value(investigation)?
        }
        _ => bail!("Pass either --before and --after, or --events with --incident"),
    };

    let rendered = if args.compact {
        serde_json::to_string(&report)?
    } else {
        serde_json::to_string_pretty(&report)?
    };
    println!("{rendered}");
    Ok(())
}
