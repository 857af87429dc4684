//! Daemon runtime: per-directory watchers supervised over one shared
//! reconciler, with an initial catch-up pass per directory.

mod error;
mod runtime;
pub mod watcher;

pub use error::DaemonError;
pub use runtime::{run, start_blocking};
pub use watcher::{TargetWatcher, WatcherState};
