//! textmirror — keep plain-text mirrors of PDFs in watched directories.
//!
//! # Usage
//!
//! ```text
//! textmirror run [--config <path>]
//! textmirror sync [--config <path>]
//! textmirror status [--config <path>] [--json]
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{run::RunArgs, status::StatusArgs, sync::SyncArgs};

#[derive(Parser, Debug)]
#[command(
    name = "textmirror",
    version,
    about = "Keep plain-text mirrors of PDFs in watched directories",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Watch the configured directories in the foreground, mirroring PDFs
    /// to text as they appear and change.
    Run(RunArgs),

    /// Run one reconcile pass over every configured directory, then exit.
    Sync(SyncArgs),

    /// Show mirror freshness per directory without converting anything.
    Status(StatusArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => args.run(),
        Commands::Sync(args) => args.run(),
        Commands::Status(args) => args.run(),
    }
}
