//! Metadata store — the durable local-path → snippet mapping.
//!
//! # Storage layout
//!
//! A single pretty-printed JSON object in `.gistify` (relative to the
//! working directory unless the caller picks another path):
//!
//! ```text
//! {
//!   "notes/todo.md": {
//!     "remote_id": "aa5a315d61ae9438b18d",
//!     "remote_url": "https://gist.github.com/aa5a315d61ae9438b18d",
//!     "source_path": "notes/todo.md",
//!     "last_modified_at": 1700000000,
//!     "is_public": false
//!   }
//! }
//! ```
//!
//! The file is read once at the start of a run and rewritten in full at the
//! end. Writes go through a sibling temporary file that is renamed over the
//! target, so a failed save never leaves a truncated state file behind.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{io_err, StoreError};
use crate::types::Mapping;

/// File name of the state file when no explicit path is configured.
pub const DEFAULT_STORE_FILE: &str = ".gistify";

/// `<dir>/.gistify` — pure, no I/O.
pub fn store_path_at(dir: &Path) -> PathBuf {
    dir.join(DEFAULT_STORE_FILE)
}

// ---------------------------------------------------------------------------
// Load
// ---------------------------------------------------------------------------

/// Load the mapping stored at `path`.
///
/// Returns an empty mapping if the file does not exist yet, and
/// [`StoreError::CorruptState`] if it exists but cannot be parsed.
pub fn load_at(path: &Path) -> Result<Mapping, StoreError> {
    if !path.exists() {
        return Ok(Mapping::new());
    }
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    serde_json::from_str(&contents).map_err(|source| StoreError::CorruptState {
        path: path.to_path_buf(),
        source,
    })
}

// ---------------------------------------------------------------------------
// Save (atomic)
// ---------------------------------------------------------------------------

/// Atomically replace the state file at `path` with `mapping`.
///
/// Write flow: serialize → temp file in the target's directory → flush →
/// rename over `path`. If any step fails the temp file is deleted on drop and
/// the previous state file is left as it was.
pub fn save_at(path: &Path, mapping: &Mapping) -> Result<(), StoreError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;

    let mut json = serde_json::to_string_pretty(mapping)?;
    json.push('\n');

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| io_err(dir, e))?;
    tmp.write_all(json.as_bytes())
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| io_err(tmp.path(), e))?;
    tmp.persist(path).map_err(|e| io_err(path, e.error))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
