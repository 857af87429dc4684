//! Staleness decisions for source/derived pairs.
//!
//! The filesystem is the source of truth: a [`ConversionPair`] is probed
//! from disk every time a decision is needed and never cached, so memory
//! and disk cannot drift apart.

use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// `<dir>/<stem>.pdf` → `<dir>/<stem>.txt`: same base name, sibling location.
pub fn derived_path(source: &Path) -> PathBuf {
    source.with_extension("txt")
}

/// The relationship between one source document and its derived text
/// artifact at a single point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionPair {
    pub source: PathBuf,
    pub derived: PathBuf,
    pub source_modified_at: SystemTime,
    /// `None` when the derived artifact does not exist yet.
    pub derived_modified_at: Option<SystemTime>,
}

impl ConversionPair {
    /// Probe the current pair state from disk.
    ///
    /// Fails if the source itself cannot be stat'ed; a missing derived
    /// artifact is a normal state, not an error.
    pub fn probe(source: &Path) -> io::Result<Self> {
        let source_modified_at = std::fs::metadata(source)?.modified()?;
        let derived = derived_path(source);
        let derived_modified_at = match std::fs::metadata(&derived) {
            Ok(meta) => Some(meta.modified()?),
            Err(err) if err.kind() == io::ErrorKind::NotFound => None,
            Err(err) => return Err(err),
        };
        Ok(Self {
            source: source.to_path_buf(),
            derived,
            source_modified_at,
            derived_modified_at,
        })
    }

    pub fn needs_conversion(&self) -> bool {
        needs_conversion(self.source_modified_at, self.derived_modified_at)
    }
}

/// Decide whether the derived artifact must be regenerated.
///
/// A missing derived artifact always needs work; otherwise only a source
/// strictly newer than the derived artifact does. Equal timestamps count as
/// reconciled, so a pass that just converted a file never reconverts it.
/// Timestamps are compared exactly as the filesystem reports them, at
/// whatever granularity it has; no clock-skew or timezone normalization.
pub fn needs_conversion(
    source_modified_at: SystemTime,
    derived_modified_at: Option<SystemTime>,
) -> bool {
    match derived_modified_at {
        None => true,
        Some(derived) => source_modified_at > derived,
    }
}

/// Format age from a filesystem timestamp, compact (`12s`, `3m`, `5h`, `2d`).
pub fn format_system_time_age(timestamp: SystemTime) -> String {
    let age = SystemTime::now()
        .duration_since(timestamp)
        .unwrap_or_default();
    format_seconds(age.as_secs())
}

fn format_seconds(seconds: u64) -> String {
    if seconds < 60 {
        return format!("{seconds}s");
    }
    if seconds < 60 * 60 {
        return format!("{}m", seconds / 60);
    }
    if seconds < 60 * 60 * 24 {
        return format!("{}h", seconds / (60 * 60));
    }
    format!("{}d", seconds / (60 * 60 * 24))
}
