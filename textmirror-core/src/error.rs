//! Error types for textmirror-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from configuration loading.
///
/// Every variant is fatal: the process refuses to start watching with a
/// broken configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure (permission denied, unreadable file, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parse error on load — includes file path and line context from serde_yaml.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The configuration file did not exist at the expected path.
    #[error("config not found at {path}")]
    NotFound { path: PathBuf },

    /// Neither `watch_directories` nor `watch_directory` named a directory.
    #[error("config at {path} defines no watch directories; set 'watch_directories' or 'watch_directory'")]
    NoWatchDirectories { path: PathBuf },
}
