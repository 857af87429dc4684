//! `textmirror sync` — one reconcile pass over every configured directory.
//!
//! Useful under cron, or to seed the mirrors before the watch service runs
//! for the first time. Per-file failures are reported and do not fail the
//! pass; the next pass retries them from scratch.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;

use textmirror_extract::PdfTextExtractor;
use textmirror_sync::{FileOutcome, ReconcileOutcome, Reconciler};

/// Arguments for `textmirror sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Path to the YAML configuration file.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl SyncArgs {
    pub fn run(self) -> Result<()> {
        let config = super::load_config(self.config)?;
        let reconciler = Reconciler::from_config(&config, Arc::new(PdfTextExtractor));

        for target in &config.targets {
            if target.ensure_exists && !target.path.exists() {
                std::fs::create_dir_all(&target.path)
                    .with_context(|| format!("failed to create {}", target.path.display()))?;
            }
            match reconciler.reconcile_all(&target.path) {
                Ok(outcomes) => print_outcomes(&target.path, &outcomes),
                // One directory failing to enumerate must not abort the rest.
                Err(err) => eprintln!("✗ {}: {err}", target.path.display()),
            }
        }

        Ok(())
    }
}

fn print_outcomes(dir: &Path, outcomes: &[FileOutcome]) {
    let converted = outcomes.iter().filter(|o| o.converted()).count();
    let failed = outcomes.iter().filter(|o| o.failed()).count();
    let up_to_date = outcomes.len() - converted - failed;

    if outcomes.is_empty() {
        println!("✓ '{}' — no source documents", dir.display());
        return;
    }

    println!(
        "✓ '{}' — {converted} converted, {up_to_date} up to date, {failed} failed",
        dir.display()
    );

    for outcome in outcomes {
        match &outcome.outcome {
            ReconcileOutcome::Converted { derived } => println!("  ✎  {}", derived.display()),
            ReconcileOutcome::Skipped => println!("  ·  {}", outcome.source.display()),
            ReconcileOutcome::Failed { reason } => {
                println!("  ✗  {}: {reason}", outcome.source.display())
            }
        }
    }
}
