//! Conversion invoker: one extraction call, one atomic write.
//!
//! ## Write protocol
//!
//! 1. Stat the source and remember its mtime.
//! 2. Run the extractor.
//! 3. Write the text to `<derived>.textmirror.tmp`.
//! 4. Rename to the derived path (atomic on POSIX).
//! 5. Stamp the derived mtime with the source mtime captured in step 1.
//!
//! The derived file is therefore either absent or fully written; a
//! staleness probe running concurrently can never mistake a half-written
//! artifact for an up-to-date one. Stamping (step 5) makes the pair's
//! timestamps equal, which the oracle treats as reconciled; if the source
//! is rewritten while a conversion is in flight, its mtime moves past the
//! stamp and the next event or pass converts again instead of being fooled
//! by a fresher-looking derived file.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;

use filetime::FileTime;

use textmirror_extract::TextExtractor;

use crate::error::{io_err, SyncError};
use crate::staleness::derived_path;

const TMP_SUFFIX: &str = ".textmirror.tmp";

/// Convert one source document, writing the derived artifact atomically.
///
/// The extraction and write run on a worker thread bounded by `timeout`.
/// On timeout the worker is abandoned: it discards its result instead of
/// renaming into place, its tmp file is removed, and the caller gets
/// [`SyncError::Timeout`] immediately so its per-path claim is released
/// without waiting for the extractor.
pub fn convert(
    source: &Path,
    extractor: &Arc<dyn TextExtractor>,
    timeout: Duration,
) -> Result<PathBuf, SyncError> {
    let (tx, rx) = mpsc::channel();
    let abandoned = Arc::new(AtomicBool::new(false));

    let worker_source = source.to_path_buf();
    let worker_extractor = Arc::clone(extractor);
    let worker_abandoned = Arc::clone(&abandoned);
    std::thread::spawn(move || {
        let result = extract_and_write(
            &worker_source,
            worker_extractor.as_ref(),
            &worker_abandoned,
            timeout,
        );
        let _ = tx.send(result);
    });

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(mpsc::RecvTimeoutError::Timeout) => {
            abandoned.store(true, Ordering::SeqCst);
            Err(SyncError::Timeout {
                path: source.to_path_buf(),
                timeout,
            })
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => Err(SyncError::WorkerLost {
            path: source.to_path_buf(),
        }),
    }
}

fn extract_and_write(
    source: &Path,
    extractor: &dyn TextExtractor,
    abandoned: &AtomicBool,
    timeout: Duration,
) -> Result<PathBuf, SyncError> {
    let source_modified_at = std::fs::metadata(source)
        .and_then(|meta| meta.modified())
        .map_err(|e| io_err(source, e))?;

    let text = extractor.extract(source)?;

    let derived = derived_path(source);
    if abandoned.load(Ordering::SeqCst) {
        // Caller already returned a timeout; this result goes nowhere.
        return Err(SyncError::Timeout {
            path: source.to_path_buf(),
            timeout,
        });
    }

    let tmp = PathBuf::from(format!("{}{}", derived.display(), TMP_SUFFIX));
    std::fs::write(&tmp, &text).map_err(|e| io_err(&tmp, e))?;

    if abandoned.load(Ordering::SeqCst) {
        let _ = std::fs::remove_file(&tmp);
        return Err(SyncError::Timeout {
            path: source.to_path_buf(),
            timeout,
        });
    }

    if let Err(e) = std::fs::rename(&tmp, &derived) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(&derived, e));
    }

    filetime::set_file_mtime(&derived, FileTime::from_system_time(source_modified_at))
        .map_err(|e| io_err(&derived, e))?;

    Ok(derived)
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;
    use textmirror_extract::ExtractError;

    struct FixedExtractor(&'static str);

    impl TextExtractor for FixedExtractor {
        fn extract(&self, _source: &Path) -> Result<String, ExtractError> {
            Ok(self.0.to_string())
        }
    }

    struct SlowExtractor {
        delay: Duration,
    }

    impl TextExtractor for SlowExtractor {
        fn extract(&self, _source: &Path) -> Result<String, ExtractError> {
            std::thread::sleep(self.delay);
            Ok("slow text".to_string())
        }
    }

    fn extractor(inner: impl TextExtractor + 'static) -> Arc<dyn TextExtractor> {
        Arc::new(inner)
    }

    #[test]
    fn writes_derived_artifact_next_to_source() {
        let dir = TempDir::new().expect("tempdir");
        let source = dir.path().join("doc.pdf");
        std::fs::write(&source, b"%PDF-").expect("write source");

        let derived = convert(
            &source,
            &extractor(FixedExtractor("extracted text")),
            Duration::from_secs(5),
        )
        .expect("convert");

        assert_eq!(derived, dir.path().join("doc.txt"));
        let text = std::fs::read_to_string(&derived).expect("read derived");
        assert_eq!(text, "extracted text");
    }

    #[test]
    fn derived_mtime_matches_source_mtime() {
        let dir = TempDir::new().expect("tempdir");
        let source = dir.path().join("doc.pdf");
        std::fs::write(&source, b"%PDF-").expect("write source");

        let derived = convert(
            &source,
            &extractor(FixedExtractor("text")),
            Duration::from_secs(5),
        )
        .expect("convert");

        let source_mtime = std::fs::metadata(&source).unwrap().modified().unwrap();
        let derived_mtime = std::fs::metadata(&derived).unwrap().modified().unwrap();
        assert_eq!(derived_mtime, source_mtime);
    }

    #[test]
    fn tmp_file_is_cleaned_up() {
        let dir = TempDir::new().expect("tempdir");
        let source = dir.path().join("doc.pdf");
        std::fs::write(&source, b"%PDF-").expect("write source");

        convert(
            &source,
            &extractor(FixedExtractor("text")),
            Duration::from_secs(5),
        )
        .expect("convert");

        let tmp = dir.path().join(format!("doc.txt{TMP_SUFFIX}"));
        assert!(!tmp.exists(), "tmp file must be removed after rename");
    }

    #[test]
    fn timeout_abandons_the_worker() {
        let dir = TempDir::new().expect("tempdir");
        let source = dir.path().join("doc.pdf");
        std::fs::write(&source, b"%PDF-").expect("write source");

        let slow = extractor(SlowExtractor {
            delay: Duration::from_millis(400),
        });
        let err = convert(&source, &slow, Duration::from_millis(50)).expect_err("must time out");
        assert!(matches!(err, SyncError::Timeout { .. }));

        // Give the abandoned worker time to finish and observe the flag.
        std::thread::sleep(Duration::from_millis(600));
        let derived = dir.path().join("doc.txt");
        let tmp = dir.path().join(format!("doc.txt{TMP_SUFFIX}"));
        assert!(!derived.exists(), "abandoned worker must not publish a result");
        assert!(!tmp.exists(), "abandoned worker must clean its tmp file");
    }

    #[test]
    fn missing_source_fails_with_io_context() {
        let dir = TempDir::new().expect("tempdir");
        let source = dir.path().join("gone.pdf");

        let err = convert(
            &source,
            &extractor(FixedExtractor("text")),
            Duration::from_secs(5),
        )
        .expect_err("must fail");
        assert!(matches!(err, SyncError::Io { .. }));
    }
}
