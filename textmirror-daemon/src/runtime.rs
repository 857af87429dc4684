//! Daemon runtime: one initial sync pass plus one supervised watcher task
//! per configured directory.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::Instant;

use textmirror_core::{Config, WatchTarget, WatcherLossPolicy};
use textmirror_extract::TextExtractor;
use textmirror_sync::Reconciler;

use crate::error::{io_err, DaemonError};
use crate::watcher::TargetWatcher;

/// Sliding per-path window for collapsing rapid event bursts.
const DEBOUNCE_WINDOW: Duration = Duration::from_millis(500);

/// Start the daemon runtime and block the current thread until it exits.
pub fn start_blocking(config: Config, extractor: Arc<dyn TextExtractor>) -> Result<(), DaemonError> {
    init_tracing();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    runtime.block_on(run(config, extractor))
}

/// Run the daemon runtime until an external signal (or total watcher loss)
/// ends it.
pub async fn run(config: Config, extractor: Arc<dyn TextExtractor>) -> Result<(), DaemonError> {
    ensure_watch_dirs(&config)?;

    tracing::info!(directories = config.targets.len(), "starting watch service");
    for (index, target) in config.targets.iter().enumerate() {
        tracing::info!(index = index + 1, path = %target.path.display(), "watch target");
    }

    // One reconciler serves every directory; the shared per-path claim set
    // keeps overlapping targets from converting the same file twice.
    let reconciler = Arc::new(Reconciler::from_config(&config, extractor));
    let (shutdown_tx, _) = broadcast::channel::<()>(16);

    let mut handles = Vec::new();
    for target in config.targets.clone() {
        let shutdown = shutdown_tx.clone();
        let reconciler = Arc::clone(&reconciler);
        let policy = config.on_watcher_loss;
        let recursive = config.recursive;
        handles.push(tokio::spawn(async move {
            let result =
                watch_target_task(target, recursive, reconciler, shutdown.subscribe()).await;
            if let Err(err) = &result {
                tracing::error!(error = %err, "watch target lost");
                if policy == WatcherLossPolicy::Exit {
                    let _ = shutdown.send(());
                }
            }
            result
        }));
    }

    let signal_handle = {
        let shutdown = shutdown_tx.clone();
        tokio::spawn(async move {
            let mut shutdown_rx = shutdown.subscribe();
            tokio::select! {
                _ = shutdown_rx.recv() => Ok(()),
                signal = tokio::signal::ctrl_c() => {
                    match signal {
                        Ok(()) => {
                            tracing::info!("received ctrl-c, shutting down");
                            let _ = shutdown.send(());
                            Ok(())
                        }
                        Err(err) => Err(DaemonError::Task(format!("ctrl-c handler failed: {err}"))),
                    }
                }
            }
        })
    };

    let total = handles.len();
    let mut task_errors = Vec::new();
    for handle in handles {
        match handle.await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => task_errors.push(err),
            Err(join_err) => {
                task_errors.push(DaemonError::Task(format!("watch task join failure: {join_err}")))
            }
        }
    }

    // All watcher tasks are done; release the signal listener too.
    let _ = shutdown_tx.send(());
    handle_join("signal_handler", signal_handle.await)?;

    if !task_errors.is_empty() {
        if config.on_watcher_loss == WatcherLossPolicy::Exit {
            return Err(task_errors.remove(0));
        }
        if task_errors.len() == total {
            return Err(DaemonError::AllWatchersLost);
        }
    }
    Ok(())
}

/// One directory's full lifetime: subscribe, catch up, then follow events.
///
/// The subscription is registered *before* the initial pass, so events
/// raised while the pass runs buffer in the watcher's channel and are
/// handled afterwards; the pass and the event stream can never race for
/// the same directory.
async fn watch_target_task(
    target: WatchTarget,
    recursive: bool,
    reconciler: Arc<Reconciler>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DaemonError> {
    let mut watcher = TargetWatcher::start(target.clone(), recursive)?;

    let sync_dir = target.path.clone();
    let sync_reconciler = Arc::clone(&reconciler);
    let outcomes = tokio::task::spawn_blocking(move || sync_reconciler.reconcile_all(&sync_dir))
        .await
        .map_err(|err| DaemonError::Task(format!("initial sync join error: {err}")))?;
    match outcomes {
        Ok(outcomes) => {
            tracing::info!(
                path = %target.path.display(),
                files = outcomes.len(),
                converted = outcomes.iter().filter(|o| o.converted()).count(),
                failed = outcomes.iter().filter(|o| o.failed()).count(),
                "initial sync complete",
            );
        }
        // A failed enumeration leaves the watcher running: files that show
        // up later still get mirrored.
        Err(err) => {
            tracing::error!(path = %target.path.display(), error = %err, "initial sync failed");
        }
    }

    let mut debounce = HashMap::<PathBuf, Instant>::new();
    let result = loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break Ok(()),
            next = watcher.next_sources() => {
                let sources = match next {
                    Ok(sources) => sources,
                    Err(err) => break Err(err),
                };
                for source in sources {
                    if !should_process_event(&mut debounce, &source, Instant::now()) {
                        continue;
                    }
                    let reconciler = Arc::clone(&reconciler);
                    tokio::task::spawn_blocking(move || reconciler.reconcile_one(&source))
                        .await
                        .map_err(|err| {
                            DaemonError::Task(format!("reconcile join error: {err}"))
                        })?;
                }
            }
        }
    };

    watcher.stop();
    result
}

fn ensure_watch_dirs(config: &Config) -> Result<(), DaemonError> {
    for target in &config.targets {
        if target.ensure_exists && !target.path.exists() {
            tracing::info!(path = %target.path.display(), "creating watched directory");
            fs::create_dir_all(&target.path).map_err(|e| io_err(&target.path, e))?;
        }
    }
    Ok(())
}

fn should_process_event(
    debounce: &mut HashMap<PathBuf, Instant>,
    path: &std::path::Path,
    now: Instant,
) -> bool {
    should_process_event_with_threshold(debounce, path, now, DEBOUNCE_WINDOW)
}

fn should_process_event_with_threshold(
    debounce: &mut HashMap<PathBuf, Instant>,
    path: &std::path::Path,
    now: Instant,
    threshold: Duration,
) -> bool {
    debounce.retain(|_, seen_at| now.duration_since(*seen_at) <= Duration::from_secs(30));
    match debounce.get(path) {
        Some(last_seen) if now.duration_since(*last_seen) < threshold => false,
        _ => {
            debounce.insert(path.to_path_buf(), now);
            true
        }
    }
}

fn handle_join(
    task: &str,
    result: Result<Result<(), DaemonError>, tokio::task::JoinError>,
) -> Result<(), DaemonError> {
    match result {
        Ok(inner) => inner,
        Err(err) => Err(DaemonError::Task(format!("{task} task join failure: {err}"))),
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}
