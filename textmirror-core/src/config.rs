//! YAML configuration loading.
//!
//! # Document shape
//!
//! ```yaml
//! watch_directories:                 # preferred multi-directory form
//!   - /srv/scans/inbox
//!   - path: /srv/scans/archive      # detailed entry form
//!     ensure_exists: false
//! watch_directory: /srv/scans       # legacy single-directory form
//! recursive: false
//! on_watcher_loss: continue         # continue | exit
//! conversion_timeout_secs: 120
//! ```
//!
//! `watch_directories` takes precedence when both forms are present; an
//! empty list falls back to `watch_directory`, and a config naming neither
//! is rejected before any watching begins. Relative paths are resolved
//! against the process working directory at load time.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::types::{Config, WatchTarget, WatcherLossPolicy};

const DEFAULT_CONVERSION_TIMEOUT_SECS: u64 = 120;

// ---------------------------------------------------------------------------
// Raw document
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ConfigFile {
    watch_directories: Option<Vec<TargetEntry>>,
    watch_directory: Option<PathBuf>,
    #[serde(default)]
    recursive: bool,
    #[serde(default)]
    on_watcher_loss: WatcherLossPolicy,
    #[serde(default = "default_conversion_timeout_secs")]
    conversion_timeout_secs: u64,
}

/// A `watch_directories` entry: either a bare path string or a mapping with
/// an explicit `ensure_exists` flag.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TargetEntry {
    Bare(PathBuf),
    Detailed {
        path: PathBuf,
        #[serde(default = "default_true")]
        ensure_exists: bool,
    },
}

impl TargetEntry {
    fn into_target(self) -> WatchTarget {
        match self {
            TargetEntry::Bare(path) => WatchTarget {
                path,
                ensure_exists: true,
            },
            TargetEntry::Detailed {
                path,
                ensure_exists,
            } => WatchTarget {
                path,
                ensure_exists,
            },
        }
    }
}

fn default_conversion_timeout_secs() -> u64 {
    DEFAULT_CONVERSION_TIMEOUT_SECS
}

fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Load
// ---------------------------------------------------------------------------

/// Load and resolve the configuration document at `path`.
///
/// Returns `ConfigError::NotFound` if absent, `ConfigError::Parse` (with
/// path context) if malformed YAML, `ConfigError::NoWatchDirectories` if no
/// directory is configured.
pub fn load(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path)?;
    let file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })?;
    resolve(file, path)
}

fn resolve(file: ConfigFile, config_path: &Path) -> Result<Config, ConfigError> {
    let targets: Vec<WatchTarget> = match file.watch_directories {
        Some(entries) if !entries.is_empty() => {
            entries.into_iter().map(TargetEntry::into_target).collect()
        }
        // Empty or absent list: fall back to the legacy single-directory key.
        _ => match file.watch_directory {
            Some(path) => vec![WatchTarget::new(path)],
            None => {
                return Err(ConfigError::NoWatchDirectories {
                    path: config_path.to_path_buf(),
                })
            }
        },
    };

    let targets = targets
        .into_iter()
        .map(|t| {
            Ok(WatchTarget {
                path: absolutize(t.path)?,
                ensure_exists: t.ensure_exists,
            })
        })
        .collect::<Result<Vec<_>, ConfigError>>()?;

    Ok(Config {
        targets,
        recursive: file.recursive,
        on_watcher_loss: file.on_watcher_loss,
        conversion_timeout: Duration::from_secs(file.conversion_timeout_secs),
    })
}

fn absolutize(path: PathBuf) -> Result<PathBuf, ConfigError> {
    if path.is_absolute() {
        Ok(path)
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
