pub mod run;
pub mod status;
pub mod sync;

use std::path::PathBuf;

use anyhow::{Context, Result};

use textmirror_core::{config, Config};

/// Resolve `--config`, falling back to `~/.textmirror/config.yaml`.
pub(crate) fn load_config(explicit: Option<PathBuf>) -> Result<Config> {
    let path = match explicit {
        Some(path) => path,
        None => dirs::home_dir()
            .context("could not determine home directory")?
            .join(".textmirror")
            .join("config.yaml"),
    };
    config::load(&path).with_context(|| format!("failed to load config from {}", path.display()))
}
