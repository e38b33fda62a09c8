//! Error types for gistify-sync.

use std::path::PathBuf;

use thiserror::Error;

use gistify_core::StoreError;

use crate::remote::RemoteError;

/// All errors that can abort a sync run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The run cannot start: missing credential or invalid file pattern.
    #[error("{0}")]
    Precondition(String),

    /// The candidate directory tree could not be walked.
    #[error("failed to walk {root}: {source}")]
    Traversal {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// A candidate file could not be read, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An error from the metadata store (load or save).
    #[error("metadata store error: {0}")]
    Store(#[from] StoreError),

    /// A remote failure that has no local recovery.
    #[error("remote error for {path}: {source}")]
    Remote {
        path: String,
        #[source]
        source: RemoteError,
    },
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
