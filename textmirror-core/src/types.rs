//! Domain types for the textmirror configuration.
//!
//! All path fields use `PathBuf`; never `&str` or `String` for filesystem paths.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Watch targets
// ---------------------------------------------------------------------------

/// One configured directory to monitor.
///
/// Constructed once from configuration at startup and immutable for the
/// process lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchTarget {
    /// Absolute path to the watched directory.
    pub path: PathBuf,
    /// Create the directory on disk before watching if it does not exist.
    pub ensure_exists: bool,
}

impl WatchTarget {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ensure_exists: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// What to do with the rest of the process when one directory's notification
/// subscription is lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WatcherLossPolicy {
    /// Log the loss and keep watching the remaining directories.
    #[default]
    Continue,
    /// Shut the whole process down.
    Exit,
}

impl fmt::Display for WatcherLossPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WatcherLossPolicy::Continue => write!(f, "continue"),
            WatcherLossPolicy::Exit => write!(f, "exit"),
        }
    }
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// Fully resolved runtime configuration.
///
/// Produced by [`crate::config::load`]; paths are absolute and the target
/// list is non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub targets: Vec<WatchTarget>,
    /// Scan and watch subdirectories too. Off by default: only PDFs directly
    /// under each watched directory are mirrored.
    pub recursive: bool,
    pub on_watcher_loss: WatcherLossPolicy,
    /// Upper bound on one conversion call, extraction and write included.
    pub conversion_timeout: Duration,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loss_policy_display() {
        assert_eq!(WatcherLossPolicy::Continue.to_string(), "continue");
        assert_eq!(WatcherLossPolicy::Exit.to_string(), "exit");
    }

    #[test]
    fn loss_policy_serde_roundtrip() {
        let yaml = serde_yaml::to_string(&WatcherLossPolicy::Exit).expect("serialize");
        assert_eq!(yaml.trim(), "exit");
        let parsed: WatcherLossPolicy = serde_yaml::from_str("continue").expect("deserialize");
        assert_eq!(parsed, WatcherLossPolicy::Continue);
    }

    #[test]
    fn watch_target_defaults_to_ensure_exists() {
        let target = WatchTarget::new("/srv/scans");
        assert!(target.ensure_exists);
        assert_eq!(target.path, PathBuf::from("/srv/scans"));
    }
}
