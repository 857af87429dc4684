//! `textmirror status` — mirror freshness visibility.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use textmirror_sync::{list_sources, staleness::format_system_time_age, ConversionPair};

/// Arguments for `textmirror status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Path to the YAML configuration file.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub fn run(self) -> Result<()> {
        let config = super::load_config(self.config)?;

        let mut directories = Vec::new();
        for target in &config.targets {
            directories.push(build_directory_status(&target.path, config.recursive)?);
        }

        let report = StatusReport {
            stale_count: directories
                .iter()
                .flat_map(|d| d.rows.iter())
                .filter(|r| r.state != MirrorState::Mirrored)
                .count(),
            source_count: directories.iter().map(|d| d.rows.len()).sum(),
            directories,
        };

        if self.json {
            print_json(report)?;
            return Ok(());
        }

        print_table(report);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MirrorState {
    Mirrored,
    Stale,
    NeverMirrored,
}

impl MirrorState {
    fn of(pair: &ConversionPair) -> Self {
        if pair.derived_modified_at.is_none() {
            MirrorState::NeverMirrored
        } else if pair.needs_conversion() {
            MirrorState::Stale
        } else {
            MirrorState::Mirrored
        }
    }

    fn key(self) -> &'static str {
        match self {
            MirrorState::Mirrored => "mirrored",
            MirrorState::Stale => "stale",
            MirrorState::NeverMirrored => "never_mirrored",
        }
    }

    fn label(self) -> &'static str {
        match self {
            MirrorState::Mirrored => "MIRRORED",
            MirrorState::Stale => "STALE",
            MirrorState::NeverMirrored => "NEVER MIRRORED",
        }
    }

    fn indicator(self) -> String {
        match self {
            MirrorState::Mirrored => "■".green().bold().to_string(),
            MirrorState::Stale => "■".yellow().bold().to_string(),
            MirrorState::NeverMirrored => "■".bright_black().bold().to_string(),
        }
    }
}

#[derive(Debug, Clone)]
struct SourceStatus {
    source: PathBuf,
    state: MirrorState,
    source_modified_at: SystemTime,
    mirror_age: String,
}

#[derive(Debug, Clone)]
struct DirectoryStatus {
    path: PathBuf,
    exists: bool,
    rows: Vec<SourceStatus>,
}

#[derive(Debug, Clone)]
struct StatusReport {
    source_count: usize,
    stale_count: usize,
    directories: Vec<DirectoryStatus>,
}

fn build_directory_status(dir: &Path, recursive: bool) -> Result<DirectoryStatus> {
    if !dir.exists() {
        return Ok(DirectoryStatus {
            path: dir.to_path_buf(),
            exists: false,
            rows: Vec::new(),
        });
    }

    let sources = list_sources(dir, recursive)
        .with_context(|| format!("failed to list sources under {}", dir.display()))?;

    let mut rows = Vec::new();
    for source in sources {
        let pair = ConversionPair::probe(&source)
            .with_context(|| format!("failed to stat {}", source.display()))?;
        rows.push(SourceStatus {
            state: MirrorState::of(&pair),
            mirror_age: pair
                .derived_modified_at
                .map(format_system_time_age)
                .unwrap_or_else(|| "never".to_string()),
            source_modified_at: pair.source_modified_at,
            source,
        });
    }
    rows.sort_by(|a, b| a.source.cmp(&b.source));

    Ok(DirectoryStatus {
        path: dir.to_path_buf(),
        exists: true,
        rows,
    })
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct StatusReportJson {
    summary: StatusSummaryJson,
    directories: Vec<DirectoryStatusJson>,
}

#[derive(Serialize)]
struct StatusSummaryJson {
    directories: usize,
    sources: usize,
    stale: usize,
}

#[derive(Serialize)]
struct DirectoryStatusJson {
    path: String,
    exists: bool,
    sources: Vec<SourceStatusJson>,
}

#[derive(Serialize)]
struct SourceStatusJson {
    source: String,
    status: &'static str,
    mirror_age: String,
    source_modified_at_unix: u64,
}

#[derive(Tabled)]
struct StatusTableRow {
    #[tabled(rename = "source")]
    source: String,
    #[tabled(rename = "status")]
    status: String,
    #[tabled(rename = "mirrored")]
    mirrored: String,
    #[tabled(rename = "source modified")]
    source_modified: String,
}

fn print_json(report: StatusReport) -> Result<()> {
    let payload = StatusReportJson {
        summary: StatusSummaryJson {
            directories: report.directories.len(),
            sources: report.source_count,
            stale: report.stale_count,
        },
        directories: report
            .directories
            .into_iter()
            .map(|dir| DirectoryStatusJson {
                path: dir.path.display().to_string(),
                exists: dir.exists,
                sources: dir
                    .rows
                    .into_iter()
                    .map(|row| SourceStatusJson {
                        source: row.source.display().to_string(),
                        status: row.state.key(),
                        mirror_age: row.mirror_age,
                        source_modified_at_unix: unix_seconds(row.source_modified_at),
                    })
                    .collect(),
            })
            .collect(),
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize status JSON")?
    );
    Ok(())
}

fn print_table(report: StatusReport) {
    println!(
        "textmirror v{} | {} directories | {} sources | {} stale",
        env!("CARGO_PKG_VERSION"),
        report.directories.len(),
        report.source_count,
        report.stale_count,
    );
    println!(
        "Indicators: {} MIRRORED  {} STALE  {} NEVER MIRRORED",
        MirrorState::Mirrored.indicator(),
        MirrorState::Stale.indicator(),
        MirrorState::NeverMirrored.indicator(),
    );

    for dir in report.directories {
        println!();
        if !dir.exists {
            println!(
                "{} {}",
                dir.path.display().to_string().bold(),
                "(directory missing)".red()
            );
            continue;
        }
        println!("{}", dir.path.display().to_string().bold());
        if dir.rows.is_empty() {
            println!("  no source documents");
            continue;
        }

        let rows: Vec<StatusTableRow> = dir
            .rows
            .into_iter()
            .map(|row| StatusTableRow {
                source: row
                    .source
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| row.source.display().to_string()),
                status: row.state.label().to_string(),
                mirrored: row.mirror_age,
                source_modified: local_timestamp(row.source_modified_at),
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
    }
}

fn local_timestamp(timestamp: SystemTime) -> String {
    DateTime::<Local>::from(timestamp)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

fn unix_seconds(timestamp: SystemTime) -> u64 {
    timestamp
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
