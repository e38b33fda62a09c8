//! Reconciliation engine.
//!
//! ## Per-file protocol
//!
//! 1. Stat the candidate; a path that cannot be stat'ed vanished after
//!    listing and is skipped without error.
//! 2. Read the content; a stat-able but unreadable file aborts the run.
//! 3. Empty content → `SkippedEmpty`, mapping untouched.
//! 4. Look up the prior record and [`decide`]: create, update, or skip.
//! 5. Dispatch to the [`SnippetClient`]; an update that hits a deleted
//!    snippet falls back to one create (`Recreated`).
//! 6. Upsert the refreshed record into the working mapping. An update keeps
//!    the record's visibility; creates take the run's.
//!
//! The mapping is only written by [`Engine::run`], once, after every file
//! succeeded. A fatal error leaves the state file as it was.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use gistify_core::{store, Mapping, SnippetId, SnippetRecord};

use crate::config::SyncConfig;
use crate::error::{io_err, SyncError};
use crate::remote::{RemoteError, RemoteSnippet, SnippetClient};

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// What happened to one candidate file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// No prior record; a new snippet was created.
    Created,
    /// Prior record was stale; its snippet was updated in place.
    Updated,
    /// Prior snippet no longer existed remotely; a new one replaced it.
    Recreated,
    /// Stored mtime matches the file; nothing sent.
    SkippedUnchanged,
    /// File has no content; nothing sent.
    SkippedEmpty,
    /// Dry run: a snippet would be created.
    WouldCreate,
    /// Dry run: the stored snippet would be updated.
    WouldUpdate,
}

impl Outcome {
    pub fn label(self) -> &'static str {
        match self {
            Outcome::Created => "Created",
            Outcome::Updated => "Updated",
            Outcome::Recreated => "Recreated",
            Outcome::SkippedUnchanged | Outcome::SkippedEmpty => "Skipped",
            Outcome::WouldCreate => "Would create",
            Outcome::WouldUpdate => "Would update",
        }
    }

    /// `true` when the remote service was written to.
    pub fn touched_remote(self) -> bool {
        matches!(
            self,
            Outcome::Created | Outcome::Updated | Outcome::Recreated
        )
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Report line for one processed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutcomeEntry {
    pub path: String,
    pub outcome: Outcome,
    /// Snippet URL, when the file is (or would stay) linked to one.
    pub url: Option<String>,
}

// ---------------------------------------------------------------------------
// Decision
// ---------------------------------------------------------------------------

/// Action chosen for a non-empty file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Create,
    Update(SnippetId),
    SkipUnchanged,
}

/// Compare a prior record against the file's live mtime.
///
/// A record that never received a remote id is treated as absent.
pub fn decide(prior: Option<&SnippetRecord>, mtime: i64) -> Action {
    match prior {
        Some(record) if record.remote_id.is_empty() => Action::Create,
        Some(record) if record.last_modified_at == mtime => Action::SkipUnchanged,
        Some(record) => Action::Update(record.remote_id.clone()),
        None => Action::Create,
    }
}

// ---------------------------------------------------------------------------
// reconcile
// ---------------------------------------------------------------------------

/// Per-run switches for [`reconcile`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileOptions {
    pub is_public: bool,
    pub dry_run: bool,
}

/// New mapping plus one report entry per processed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileResult {
    pub mapping: Mapping,
    pub report: Vec<OutcomeEntry>,
}

struct LocalFile {
    key: String,
    filename: String,
    content: String,
    mtime: i64,
}

/// Reconcile `candidates` against `prior`, strictly in the given order.
///
/// `on_outcome` is invoked as soon as each file is settled so callers can
/// report progress before the run finishes. The first fatal error is
/// returned immediately; remote effects already applied are not undone.
pub fn reconcile<C, F>(
    candidates: &[PathBuf],
    prior: Mapping,
    options: ReconcileOptions,
    client: &C,
    mut on_outcome: F,
) -> Result<ReconcileResult, SyncError>
where
    C: SnippetClient + ?Sized,
    F: FnMut(&OutcomeEntry),
{
    let mut mapping = prior;
    let mut report = Vec::new();

    for path in candidates {
        let Some(file) = read_candidate(path)? else {
            continue;
        };

        if file.content.is_empty() {
            tracing::debug!("empty: {}", file.key);
            let entry = OutcomeEntry {
                path: file.key,
                outcome: Outcome::SkippedEmpty,
                url: None,
            };
            on_outcome(&entry);
            report.push(entry);
            continue;
        }

        let existing = mapping.get(&file.key);
        let prior_url = existing.map(|r| r.remote_url.clone());
        let prior_public = existing.map(|r| r.is_public);
        let action = decide(existing, file.mtime);

        let (snippet, outcome) = match action {
            Action::SkipUnchanged => {
                tracing::debug!("unchanged: {}", file.key);
                let entry = OutcomeEntry {
                    path: file.key,
                    outcome: Outcome::SkippedUnchanged,
                    url: prior_url,
                };
                on_outcome(&entry);
                report.push(entry);
                continue;
            }
            Action::Create if options.dry_run => {
                let entry = OutcomeEntry {
                    path: file.key,
                    outcome: Outcome::WouldCreate,
                    url: None,
                };
                tracing::info!("[dry-run] would create: {}", entry.path);
                on_outcome(&entry);
                report.push(entry);
                continue;
            }
            Action::Update(_) if options.dry_run => {
                let entry = OutcomeEntry {
                    path: file.key,
                    outcome: Outcome::WouldUpdate,
                    url: prior_url,
                };
                tracing::info!("[dry-run] would update: {}", entry.path);
                on_outcome(&entry);
                report.push(entry);
                continue;
            }
            Action::Create => (create(client, &file, options.is_public)?, Outcome::Created),
            Action::Update(id) => match client.update(&id, &file.filename, &file.content) {
                Ok(snippet) => (checked(snippet, &file.key)?, Outcome::Updated),
                Err(RemoteError::NotFound { .. }) => {
                    tracing::warn!(
                        "snippet {id} for {} no longer exists; creating a new one",
                        file.key
                    );
                    (create(client, &file, options.is_public)?, Outcome::Recreated)
                }
                Err(source) => {
                    return Err(SyncError::Remote {
                        path: file.key,
                        source,
                    })
                }
            },
        };

        tracing::info!("{}: {} ({})", outcome, file.key, snippet.url);
        // An edit cannot change a snippet's visibility.
        let is_public = match outcome {
            Outcome::Updated => prior_public.unwrap_or(options.is_public),
            _ => options.is_public,
        };
        let record = SnippetRecord::new(
            snippet.id,
            snippet.url.clone(),
            file.key.clone(),
            file.mtime,
            is_public,
        );
        mapping.insert(file.key.clone(), record);

        let entry = OutcomeEntry {
            path: file.key,
            outcome,
            url: Some(snippet.url),
        };
        on_outcome(&entry);
        report.push(entry);
    }

    Ok(ReconcileResult { mapping, report })
}

fn create<C>(client: &C, file: &LocalFile, is_public: bool) -> Result<RemoteSnippet, SyncError>
where
    C: SnippetClient + ?Sized,
{
    let snippet = client
        .create(&file.filename, &file.content, is_public)
        .map_err(|source| SyncError::Remote {
            path: file.key.clone(),
            source,
        })?;
    checked(snippet, &file.key)
}

/// Every stored record must carry a remote id.
fn checked(snippet: RemoteSnippet, key: &str) -> Result<RemoteSnippet, SyncError> {
    if snippet.id.is_empty() {
        return Err(SyncError::Remote {
            path: key.to_string(),
            source: RemoteError::InvalidResponse("snippet id is empty".to_string()),
        });
    }
    Ok(snippet)
}

/// Stat then read a candidate. `Ok(None)` means it vanished after listing.
fn read_candidate(path: &Path) -> Result<Option<LocalFile>, SyncError> {
    let meta = match std::fs::metadata(path) {
        Ok(meta) => meta,
        Err(e) => {
            tracing::debug!("skipping {}: cannot stat ({e})", path.display());
            return Ok(None);
        }
    };
    let modified = meta.modified().map_err(|e| io_err(path, e))?;
    let mtime = DateTime::<Utc>::from(modified).timestamp();

    let content = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    let key = path.to_string_lossy().into_owned();
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| key.clone());

    Ok(Some(LocalFile {
        key,
        filename,
        content,
        mtime,
    }))
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// A configured sync run: metadata store on one side, remote client on the
/// other.
pub struct Engine<'c, C: SnippetClient + ?Sized> {
    config: SyncConfig,
    client: &'c C,
}

impl<'c, C: SnippetClient + ?Sized> Engine<'c, C> {
    /// Fails with [`SyncError::Precondition`] if the configuration cannot
    /// start a run.
    pub fn new(config: SyncConfig, client: &'c C) -> Result<Self, SyncError> {
        config.validate()?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Load the store, reconcile every candidate, then save the new mapping.
    ///
    /// Dry runs skip the save. Nothing is saved when reconciliation fails.
    pub fn run<F>(
        &self,
        candidates: &[PathBuf],
        on_outcome: F,
    ) -> Result<ReconcileResult, SyncError>
    where
        F: FnMut(&OutcomeEntry),
    {
        let prior = store::load_at(&self.config.store_path)?;
        let options = ReconcileOptions {
            is_public: self.config.is_public,
            dry_run: self.config.dry_run,
        };
        let result = reconcile(candidates, prior, options, self.client, on_outcome)?;

        if !self.config.dry_run {
            store::save_at(&self.config.store_path, &result.mapping)?;
            tracing::debug!(
                "saved {} record(s) to {}",
                result.mapping.len(),
                self.config.store_path.display()
            );
        }
        Ok(result)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
