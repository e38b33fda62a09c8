//! Gistify — mirror local text files to GitHub gists, one gist per file.
//!
//! # Usage
//!
//! ```text
//! gistify sync <pattern> [--public] [--dry-run] [--root <dir>] [--store <path>]
//! gistify status [--store <path>] [--json]
//! ```
//!
//! `sync` reads the access token from `GISTIFY_TOKEN`. Set `RUST_LOG=info`
//! to see each remote call.

mod commands;
mod gist;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{status::StatusArgs, sync::SyncArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "gistify",
    version,
    about = "Create or update one GitHub gist per matching local file",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create, update, or skip a gist for every file matching a pattern.
    Sync(SyncArgs),

    /// Show which tracked files changed since their last sync.
    Status(StatusArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Sync(args) => args.run(),
        Commands::Status(args) => args.run(),
    }
}
