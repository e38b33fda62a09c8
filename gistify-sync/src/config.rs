//! Run configuration handed to the [`Engine`](crate::Engine).
//!
//! Everything the engine would otherwise look up from the process
//! environment is gathered here by the caller.

use std::fmt;
use std::path::PathBuf;

use crate::error::SyncError;

/// Environment variable holding the remote service access token.
pub const TOKEN_ENV: &str = "GISTIFY_TOKEN";

/// Opaque access token for the remote snippet service.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a token. Blank tokens are rejected.
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            None
        } else {
            Some(Self(token))
        }
    }

    /// Read the token from [`TOKEN_ENV`]; `None` when unset or blank.
    pub fn from_env() -> Option<Self> {
        std::env::var(TOKEN_ENV).ok().and_then(Self::new)
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Inputs for a single sync run.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Location of the metadata state file.
    pub store_path: PathBuf,
    /// Visibility applied to snippets created or updated by this run.
    pub is_public: bool,
    /// Decide actions only; no remote calls, no state file write.
    pub dry_run: bool,
    pub credential: Option<Credential>,
}

impl SyncConfig {
    pub fn new(store_path: impl Into<PathBuf>, is_public: bool) -> Self {
        Self {
            store_path: store_path.into(),
            is_public,
            dry_run: false,
            credential: None,
        }
    }

    pub fn with_credential(mut self, credential: Option<Credential>) -> Self {
        self.credential = credential;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// A real run needs a credential; a dry run never talks to the remote.
    pub fn validate(&self) -> Result<(), SyncError> {
        if self.credential.is_none() && !self.dry_run {
            return Err(SyncError::Precondition(format!(
                "could not find {TOKEN_ENV} environment variable set"
            )));
        }
        Ok(())
    }
}
