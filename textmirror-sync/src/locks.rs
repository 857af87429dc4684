//! Per-path mutual exclusion for reconciliation.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Process-local set of source paths with a reconciliation in flight.
///
/// Acquisition never blocks: a caller that finds the path claimed backs off
/// and lets the next event or sync pass re-evaluate from disk. Claims
/// release on drop, so no exit path (error, timeout, panic) leaks one.
#[derive(Debug, Default, Clone)]
pub struct PathLocks {
    held: Arc<Mutex<HashSet<PathBuf>>>,
}

impl PathLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to claim `path`. Returns `None` when a reconciliation for the
    /// same path is already running somewhere in this process.
    pub fn try_claim(&self, path: &Path) -> Option<PathClaim> {
        let mut held = lock_set(&self.held);
        if held.insert(path.to_path_buf()) {
            Some(PathClaim {
                held: Arc::clone(&self.held),
                path: path.to_path_buf(),
            })
        } else {
            None
        }
    }
}

/// RAII claim on one source path.
#[derive(Debug)]
pub struct PathClaim {
    held: Arc<Mutex<HashSet<PathBuf>>>,
    path: PathBuf,
}

impl Drop for PathClaim {
    fn drop(&mut self) {
        lock_set(&self.held).remove(&self.path);
    }
}

// A claim holder that panicked poisons the mutex; the set itself is still
// coherent, so recover the guard rather than propagate the panic.
fn lock_set(held: &Mutex<HashSet<PathBuf>>) -> std::sync::MutexGuard<'_, HashSet<PathBuf>> {
    held.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
