//! `gistify sync` — push matching files to gists.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use gistify_core::{store, store::DEFAULT_STORE_FILE, SnippetId};
use gistify_sync::{
    files, Credential, Engine, Outcome, OutcomeEntry, RemoteError, RemoteSnippet,
    SnippetClient, SyncConfig,
};

use crate::gist::GistClient;

/// Arguments for `gistify sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Regular expression matched against each file path under `--root`.
    pub pattern: String,

    /// Create gists as public instead of secret.
    #[arg(long)]
    pub public: bool,

    /// Show what would be created or updated without contacting GitHub.
    #[arg(long)]
    pub dry_run: bool,

    /// Directory to search recursively.
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Metadata state file.
    #[arg(long, default_value = DEFAULT_STORE_FILE)]
    pub store: PathBuf,
}

impl SyncArgs {
    pub fn run(self) -> Result<()> {
        let config = SyncConfig::new(&self.store, self.public)
            .with_dry_run(self.dry_run)
            .with_credential(Credential::from_env());
        config.validate()?;

        let candidates = files::collect_candidates(&self.root, &self.pattern)
            .with_context(|| format!("could not search files in dir {}", self.root.display()))?;
        println!("Files to be processed: {}", candidates.len());

        // A corrupt state file is reported before any network round trip.
        store::load_at(&self.store)
            .with_context(|| format!("could not read state file {}", self.store.display()))?;

        let result = match config.credential.clone() {
            Some(credential) if !config.dry_run => {
                let client = GistClient::from_env(&credential);
                let login = client
                    .authenticated_user()
                    .context("could not authenticate with GISTIFY_TOKEN")?;
                log::info!("authenticated as {login}");
                Engine::new(config, &client)?.run(&candidates, print_outcome)
            }
            _ => Engine::new(config, &Offline)?.run(&candidates, print_outcome),
        };
        let result = result.with_context(|| {
            format!("could not sync gists (state file {})", self.store.display())
        })?;

        let prefix = if self.dry_run { "[dry-run] " } else { "" };
        println!("{prefix}✓ {}", summarize(&result.report));
        Ok(())
    }
}

/// Stand-in client for dry runs; the engine never calls it.
struct Offline;

impl SnippetClient for Offline {
    fn create(&self, _: &str, _: &str, _: bool) -> Result<RemoteSnippet, RemoteError> {
        Err(RemoteError::Transport("dry run is offline".to_string()))
    }

    fn update(&self, _: &SnippetId, _: &str, _: &str) -> Result<RemoteSnippet, RemoteError> {
        Err(RemoteError::Transport("dry run is offline".to_string()))
    }
}

fn print_outcome(entry: &OutcomeEntry) {
    let line = status_line(entry);
    let line = line.as_str();
    let painted = match entry.outcome {
        Outcome::Created => line.green(),
        Outcome::Updated => line.yellow(),
        Outcome::Recreated => line.cyan(),
        Outcome::SkippedUnchanged | Outcome::SkippedEmpty => line.bright_black(),
        Outcome::WouldCreate | Outcome::WouldUpdate => line.normal(),
    };
    println!("{painted}");
}

fn status_line(entry: &OutcomeEntry) -> String {
    let url = entry.url.as_deref().unwrap_or("-");
    match entry.outcome {
        Outcome::Created | Outcome::Updated | Outcome::Recreated => {
            format!("{:<9} {url} for file {}", entry.outcome.label(), entry.path)
        }
        Outcome::SkippedUnchanged => format!("Skipping  {url} {} (file unchanged)", entry.path),
        Outcome::SkippedEmpty => format!("Skipping (no content): {}", entry.path),
        Outcome::WouldCreate => format!("[dry-run] would create gist for file {}", entry.path),
        Outcome::WouldUpdate => {
            format!("[dry-run] would update {url} for file {}", entry.path)
        }
    }
}

fn summarize(report: &[OutcomeEntry]) -> String {
    let count = |wanted: &[Outcome]| {
        report
            .iter()
            .filter(|e| wanted.contains(&e.outcome))
            .count()
    };
    format!(
        "{} created, {} updated, {} recreated, {} skipped",
        count(&[Outcome::Created, Outcome::WouldCreate]),
        count(&[Outcome::Updated, Outcome::WouldUpdate]),
        count(&[Outcome::Recreated]),
        count(&[Outcome::SkippedUnchanged, Outcome::SkippedEmpty]),
    )
}
