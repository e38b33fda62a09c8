//! # gistify-sync
//!
//! Reconciliation of local files against remote snippets.
//!
//! Build a [`SyncConfig`], collect candidates with
//! [`files::collect_candidates`], and hand both to an [`Engine`] together with
//! a [`SnippetClient`] implementation. [`staleness`] answers the same
//! question offline for files already tracked.

pub mod config;
pub mod engine;
pub mod error;
pub mod files;
pub mod remote;
pub mod staleness;

pub use config::{Credential, SyncConfig};
pub use engine::{reconcile, Engine, Outcome, OutcomeEntry, ReconcileOptions, ReconcileResult};
pub use error::SyncError;
pub use remote::{RemoteError, RemoteSnippet, SnippetClient};
pub use staleness::RecordStatus;
