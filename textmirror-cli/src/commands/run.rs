//! `textmirror run` — foreground watch service.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;

use textmirror_daemon::start_blocking;
use textmirror_extract::PdfTextExtractor;

/// Arguments for `textmirror run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the YAML configuration file.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl RunArgs {
    pub fn run(self) -> Result<()> {
        let config = super::load_config(self.config)?;
        start_blocking(config, Arc::new(PdfTextExtractor))
            .context("watch service exited with error")
    }
}
