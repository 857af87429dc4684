use std::path::PathBuf;

use thiserror::Error;

/// Error surface for the daemon runtime and per-directory watchers.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("notify error: {0}")]
    Notify(#[from] notify::Error),

    /// Fatal for one watch target: its notification subscription is gone
    /// and no further events will arrive for that directory.
    #[error("watch subscription lost for {path}: {reason}")]
    WatchLost { path: PathBuf, reason: String },

    /// Every configured directory lost its subscription; there is nothing
    /// left to watch.
    #[error("every watched directory lost its subscription")]
    AllWatchersLost,

    #[error("daemon task failure: {0}")]
    Task(String),
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> DaemonError {
    DaemonError::Io {
        path: path.into(),
        source,
    }
}
