//! Per-directory filesystem event watching.

use std::path::{Path, PathBuf};

use notify::{recommended_watcher, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use textmirror_core::WatchTarget;
use textmirror_sync::is_pdf_source;

use crate::error::DaemonError;

/// Lifecycle of one directory's watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherState {
    Stopped,
    Watching,
}

/// Owns one directory's notify subscription.
///
/// Events buffer in the channel from the moment [`TargetWatcher::start`]
/// returns, so anything that happens on disk during the initial sync pass
/// is delivered afterwards instead of being lost to it.
pub struct TargetWatcher {
    target: WatchTarget,
    state: WatcherState,
    // Held for its side effect: dropping it tears the subscription down.
    watcher: Option<RecommendedWatcher>,
    events: mpsc::UnboundedReceiver<notify::Result<Event>>,
}

impl TargetWatcher {
    /// Subscribe to the target directory and enter the Watching state.
    pub fn start(target: WatchTarget, recursive: bool) -> Result<Self, DaemonError> {
        let (event_tx, events) = mpsc::unbounded_channel::<notify::Result<Event>>();
        let mut watcher = recommended_watcher(move |event| {
            let _ = event_tx.send(event);
        })?;
        let mode = if recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };
        watcher.watch(&target.path, mode)?;
        tracing::info!(path = %target.path.display(), "watching directory");

        Ok(Self {
            target,
            state: WatcherState::Watching,
            watcher: Some(watcher),
            events,
        })
    }

    pub fn state(&self) -> WatcherState {
        self.state
    }

    pub fn path(&self) -> &Path {
        &self.target.path
    }

    /// Wait for the next batch of qualifying source paths.
    ///
    /// Returns `Err` once the subscription is lost: the watched directory
    /// disappeared or the notification channel closed. Losing the
    /// subscription is fatal for this target; it never silently stops
    /// producing events.
    pub async fn next_sources(&mut self) -> Result<Vec<PathBuf>, DaemonError> {
        loop {
            let Some(event) = self.events.recv().await else {
                self.stop();
                return Err(self.lost("notification channel closed"));
            };

            match event {
                Ok(event) => {
                    let sources = qualifying_sources(&event);
                    if !sources.is_empty() {
                        return Ok(sources);
                    }
                }
                Err(err) => {
                    tracing::warn!(
                        path = %self.target.path.display(),
                        error = %err,
                        "watcher event error",
                    );
                }
            }

            // Removal of the watched directory itself surfaces as ordinary
            // remove events (or errors); either way the subscription is dead
            // once the directory is gone.
            if !self.target.path.exists() {
                self.stop();
                return Err(self.lost("watched directory no longer exists"));
            }
        }
    }

    /// Tear the subscription down and enter the Stopped state.
    pub fn stop(&mut self) {
        self.watcher = None;
        self.state = WatcherState::Stopped;
    }

    fn lost(&self, reason: &str) -> DaemonError {
        DaemonError::WatchLost {
            path: self.target.path.clone(),
            reason: reason.to_string(),
        }
    }
}

/// Extract the source paths an event qualifies for reconciliation.
///
/// Creation, content modification, and move-into events qualify; removals
/// do not (a deleted source needs no work, and nothing is ever deleted on
/// its behalf). Paths must carry a `.pdf` extension, matched
/// case-insensitively.
fn qualifying_sources(event: &Event) -> Vec<PathBuf> {
    if !is_relevant_event_kind(&event.kind) {
        return Vec::new();
    }
    event
        .paths
        .iter()
        .filter(|path| is_pdf_source(path))
        .cloned()
        .collect()
}

fn is_relevant_event_kind(kind: &EventKind) -> bool {
    matches!(kind, EventKind::Create(_) | EventKind::Modify(_))
}
