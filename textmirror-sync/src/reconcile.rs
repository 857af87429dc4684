//! Directory reconciliation: the startup sync pass and the per-event path.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use textmirror_core::Config;
use textmirror_extract::TextExtractor;

use crate::error::{io_err, SyncError};
use crate::invoke;
use crate::locks::PathLocks;
use crate::staleness::ConversionPair;

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Result of attempting one pair's reconciliation.
///
/// Consumed for logging only; never fed back into scheduling. There is no
/// retry queue: the next event or sync pass re-evaluates from scratch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Nothing to do: derived artifact already current, source gone before
    /// we got to it, or a conversion for the same path already in flight.
    Skipped,
    /// The derived artifact was (re)generated.
    Converted { derived: PathBuf },
    /// The conversion failed; the reason is carried for the log line.
    Failed { reason: String },
}

/// One source file's outcome, with timing for the log line.
#[derive(Debug, Clone)]
pub struct FileOutcome {
    pub source: PathBuf,
    pub outcome: ReconcileOutcome,
    pub duration: Duration,
}

impl FileOutcome {
    pub fn converted(&self) -> bool {
        matches!(self.outcome, ReconcileOutcome::Converted { .. })
    }

    pub fn failed(&self) -> bool {
        matches!(self.outcome, ReconcileOutcome::Failed { .. })
    }
}

// ---------------------------------------------------------------------------
// Reconciler
// ---------------------------------------------------------------------------

/// Drives source/derived pairs back into the reconciled state.
///
/// One instance serves every watched directory; the shared [`PathLocks`]
/// set means two directories that happen to overlap (or a sync pass racing
/// a live event) can never run two conversions of the same file at once.
pub struct Reconciler {
    extractor: Arc<dyn TextExtractor>,
    locks: PathLocks,
    timeout: Duration,
    recursive: bool,
}

impl Reconciler {
    pub fn new(extractor: Arc<dyn TextExtractor>, timeout: Duration, recursive: bool) -> Self {
        Self {
            extractor,
            locks: PathLocks::new(),
            timeout,
            recursive,
        }
    }

    pub fn from_config(config: &Config, extractor: Arc<dyn TextExtractor>) -> Self {
        Self::new(extractor, config.conversion_timeout, config.recursive)
    }

    /// Reconcile every PDF currently under `dir`.
    ///
    /// Enumeration order is unspecified and not to be relied on. Pairs are
    /// processed independently: one file's failure is recorded in its
    /// outcome and the batch continues. Only failure to enumerate the
    /// directory itself is an error.
    pub fn reconcile_all(&self, dir: &Path) -> Result<Vec<FileOutcome>, SyncError> {
        let sources = collect_sources(dir, self.recursive)?;
        Ok(sources
            .iter()
            .map(|source| self.reconcile_one(source))
            .collect())
    }

    /// Reconcile a single source path (the incremental, per-event path).
    ///
    /// A source that no longer exists is a no-op: delete and rename-away
    /// events need no work here, and nothing is ever removed on their
    /// behalf.
    pub fn reconcile_one(&self, source: &Path) -> FileOutcome {
        let started = Instant::now();
        let outcome = self.decide_and_convert(source);
        let duration = started.elapsed();

        match &outcome {
            ReconcileOutcome::Skipped => {
                tracing::debug!(path = %source.display(), "up to date");
            }
            ReconcileOutcome::Converted { derived } => {
                tracing::info!(
                    path = %source.display(),
                    derived = %derived.display(),
                    duration_ms = duration.as_millis() as u64,
                    "converted",
                );
            }
            ReconcileOutcome::Failed { reason } => {
                tracing::error!(
                    path = %source.display(),
                    duration_ms = duration.as_millis() as u64,
                    error = %reason,
                    "conversion failed",
                );
            }
        }

        FileOutcome {
            source: source.to_path_buf(),
            outcome,
            duration,
        }
    }

    fn decide_and_convert(&self, source: &Path) -> ReconcileOutcome {
        let Some(_claim) = self.locks.try_claim(source) else {
            tracing::debug!(path = %source.display(), "conversion already in flight, dropping request");
            return ReconcileOutcome::Skipped;
        };

        let pair = match ConversionPair::probe(source) {
            Ok(pair) => pair,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return ReconcileOutcome::Skipped;
            }
            Err(err) => {
                return ReconcileOutcome::Failed {
                    reason: io_err(source, err).to_string(),
                };
            }
        };

        if !pair.needs_conversion() {
            return ReconcileOutcome::Skipped;
        }

        match invoke::convert(source, &self.extractor, self.timeout) {
            Ok(derived) => ReconcileOutcome::Converted { derived },
            Err(err) => ReconcileOutcome::Failed {
                reason: err.to_string(),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Enumeration
// ---------------------------------------------------------------------------

/// `.pdf`, matched case-insensitively on the extension.
pub fn is_pdf_source(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

/// Enumerate the source documents currently under `dir`, the same listing
/// `reconcile_all` works from. Order is unspecified.
pub fn list_sources(dir: &Path, recursive: bool) -> Result<Vec<PathBuf>, SyncError> {
    collect_sources(dir, recursive)
}

fn collect_sources(root: &Path, recursive: bool) -> Result<Vec<PathBuf>, SyncError> {
    let mut sources = Vec::new();
    let mut dirs = vec![root.to_path_buf()];
    let mut cursor = 0;
    while cursor < dirs.len() {
        let current = dirs[cursor].clone();
        cursor += 1;
        let entries = match std::fs::read_dir(&current) {
            Ok(entries) => entries,
            // A subdirectory deleted mid-walk is not an error; the root
            // itself missing is.
            Err(err) if err.kind() == std::io::ErrorKind::NotFound && current != root => continue,
            Err(err) => return Err(io_err(&current, err)),
        };
        for entry in entries {
            let entry = entry.map_err(|e| io_err(&current, e))?;
            let ty = entry.file_type().map_err(|e| io_err(entry.path(), e))?;
            if ty.is_dir() {
                if recursive {
                    dirs.push(entry.path());
                }
            } else if is_pdf_source(&entry.path()) {
                sources.push(entry.path());
            }
        }
    }
    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;

    use tempfile::TempDir;
    use textmirror_extract::ExtractError;

    struct EchoExtractor;

    impl TextExtractor for EchoExtractor {
        fn extract(&self, source: &Path) -> Result<String, ExtractError> {
            Ok(format!("text of {}", source.display()))
        }
    }

    fn reconciler(recursive: bool) -> Reconciler {
        Reconciler::new(Arc::new(EchoExtractor), Duration::from_secs(5), recursive)
    }

    #[test]
    fn pdf_extension_match_is_case_insensitive() {
        assert!(is_pdf_source(Path::new("/scans/a.pdf")));
        assert!(is_pdf_source(Path::new("/scans/a.PDF")));
        assert!(is_pdf_source(Path::new("/scans/a.Pdf")));
        assert!(!is_pdf_source(Path::new("/scans/a.txt")));
        assert!(!is_pdf_source(Path::new("/scans/apdf")));
        assert!(!is_pdf_source(Path::new("/scans/noext")));
    }

    #[test]
    fn missing_source_is_a_noop() {
        let dir = TempDir::new().expect("tempdir");
        let outcome = reconciler(false).reconcile_one(&dir.path().join("gone.pdf"));
        assert_eq!(outcome.outcome, ReconcileOutcome::Skipped);
        assert!(!dir.path().join("gone.txt").exists());
    }

    #[test]
    fn non_recursive_scan_ignores_subdirectories() {
        let dir = TempDir::new().expect("tempdir");
        fs::write(dir.path().join("top.pdf"), b"%PDF-").expect("write");
        fs::create_dir(dir.path().join("nested")).expect("mkdir");
        fs::write(dir.path().join("nested/deep.pdf"), b"%PDF-").expect("write");

        let outcomes = reconciler(false)
            .reconcile_all(dir.path())
            .expect("reconcile");
        assert_eq!(outcomes.len(), 1);
        assert!(dir.path().join("top.txt").exists());
        assert!(!dir.path().join("nested/deep.txt").exists());
    }

    #[test]
    fn recursive_scan_descends() {
        let dir = TempDir::new().expect("tempdir");
        fs::write(dir.path().join("top.pdf"), b"%PDF-").expect("write");
        fs::create_dir(dir.path().join("nested")).expect("mkdir");
        fs::write(dir.path().join("nested/deep.pdf"), b"%PDF-").expect("write");

        let outcomes = reconciler(true)
            .reconcile_all(dir.path())
            .expect("reconcile");
        assert_eq!(outcomes.len(), 2);
        assert!(dir.path().join("nested/deep.txt").exists());
    }

    #[test]
    fn enumerating_a_missing_directory_is_an_error() {
        let dir = TempDir::new().expect("tempdir");
        let missing = dir.path().join("nope");
        let err = reconciler(false)
            .reconcile_all(&missing)
            .expect_err("must fail");
        assert!(matches!(err, SyncError::Io { .. }));
    }

    #[test]
    fn non_pdf_files_are_not_candidates() {
        let dir = TempDir::new().expect("tempdir");
        fs::write(dir.path().join("notes.txt"), "notes").expect("write");
        fs::write(dir.path().join("image.png"), b"png").expect("write");

        let outcomes = reconciler(false)
            .reconcile_all(dir.path())
            .expect("reconcile");
        assert!(outcomes.is_empty());
    }
}
