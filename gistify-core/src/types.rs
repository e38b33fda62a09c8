//! Domain types for the snippet mapping.
//!
//! All types are serializable/deserializable via serde + serde_json.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Opaque identifier assigned to a snippet by the remote service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnippetId(pub String);

impl SnippetId {
    /// `true` until the first successful create has assigned an id.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SnippetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for SnippetId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SnippetId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Domain structs
// ---------------------------------------------------------------------------

/// Sync state of one local file: which remote snippet holds it and the file
/// mtime observed when it was last pushed.
///
/// The aliases accept state files written by earlier releases, which used
/// `ID`, `URL`, `Filename`, `Lastmod` and `Public` as keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnippetRecord {
    #[serde(default, alias = "ID")]
    pub remote_id: SnippetId,
    #[serde(default, alias = "URL")]
    pub remote_url: String,
    #[serde(alias = "Filename")]
    pub source_path: String,
    /// Seconds since the Unix epoch, as of the sync that produced this record.
    #[serde(alias = "Lastmod")]
    pub last_modified_at: i64,
    #[serde(default, alias = "Public")]
    pub is_public: bool,
}

impl SnippetRecord {
    pub fn new(
        remote_id: SnippetId,
        remote_url: impl Into<String>,
        source_path: impl Into<String>,
        last_modified_at: i64,
        is_public: bool,
    ) -> Self {
        Self {
            remote_id,
            remote_url: remote_url.into(),
            source_path: source_path.into(),
            last_modified_at,
            is_public,
        }
    }

    /// The stored mtime as a UTC timestamp, if it is in chrono's range.
    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.last_modified_at, 0)
    }
}

/// Local path → snippet record. Sorted so the state file is stable.
pub type Mapping = BTreeMap<String, SnippetRecord>;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
