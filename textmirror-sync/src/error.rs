//! Error types for textmirror-sync.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use textmirror_extract::ExtractError;

/// All errors that can arise from reconciling one source/derived pair.
///
/// These are per-file errors: the reconciler records them in the file's
/// outcome and moves on, and the next event or sync pass retries from
/// scratch.
#[derive(Debug, Error)]
pub enum SyncError {
    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The extraction collaborator rejected the source document.
    #[error(transparent)]
    Extract(#[from] ExtractError),

    /// The conversion did not finish within the configured bound. The
    /// in-flight worker has been abandoned; its result is discarded.
    #[error("conversion of {path} timed out after {timeout:?}")]
    Timeout { path: PathBuf, timeout: Duration },

    /// The conversion worker thread died without reporting a result.
    #[error("conversion worker for {path} terminated unexpectedly")]
    WorkerLost { path: PathBuf },
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
