//! Contract the engine needs from a remote snippet service.

use thiserror::Error;

use gistify_core::SnippetId;

/// Canonical identity of a snippet after a create or update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSnippet {
    pub id: SnippetId,
    pub url: String,
}

/// Failures reported by a [`SnippetClient`].
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The snippet id no longer exists on the remote (deleted out-of-band).
    #[error("snippet {id} not found")]
    NotFound { id: SnippetId },

    /// The service answered with a non-success status.
    #[error("remote returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The request never got a response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The response could not be understood.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Create/update operations against the remote snippet service.
///
/// Calls are blocking; the engine awaits each one before the next file.
pub trait SnippetClient {
    /// Create a new snippet holding one file.
    fn create(
        &self,
        filename: &str,
        content: &str,
        is_public: bool,
    ) -> Result<RemoteSnippet, RemoteError>;

    /// Replace the content of an existing snippet.
    ///
    /// Must return [`RemoteError::NotFound`] when `id` does not exist.
    fn update(
        &self,
        id: &SnippetId,
        filename: &str,
        content: &str,
    ) -> Result<RemoteSnippet, RemoteError>;
}
