//! Offline staleness of tracked files.
//!
//! Compares each stored record with the file on disk without contacting the
//! remote service. Same rule as the engine: a different mtime means stale.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use gistify_core::{Mapping, SnippetRecord};

/// State of one tracked file relative to its stored record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RecordStatus {
    /// Stored mtime matches the file; the next sync skips it.
    Current,
    /// The file changed since its last sync; the next sync updates it.
    Modified { mtime: i64 },
    /// The file can no longer be stat'ed.
    Missing,
}

impl RecordStatus {
    pub fn label(&self) -> &'static str {
        match self {
            RecordStatus::Current => "CURRENT",
            RecordStatus::Modified { .. } => "MODIFIED",
            RecordStatus::Missing => "MISSING",
        }
    }
}

/// Check one record against the file at its `source_path`.
pub fn check_record(record: &SnippetRecord) -> RecordStatus {
    let path = Path::new(&record.source_path);
    let modified = match std::fs::metadata(path).and_then(|m| m.modified()) {
        Ok(modified) => modified,
        Err(_) => return RecordStatus::Missing,
    };
    let mtime = DateTime::<Utc>::from(modified).timestamp();
    if mtime == record.last_modified_at {
        RecordStatus::Current
    } else {
        RecordStatus::Modified { mtime }
    }
}

/// Check every record, in key order.
pub fn check_all(mapping: &Mapping) -> Vec<(String, RecordStatus)> {
    mapping
        .iter()
        .map(|(key, record)| (key.clone(), check_record(record)))
        .collect()
}

/// Human-readable age of a timestamp ("just now", "5m ago", "3d ago").
pub fn format_age(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - then).num_seconds();
    if secs < 0 {
        return "in the future".to_string();
    }
    match secs {
        0..=59 => "just now".to_string(),
        60..=3_599 => format!("{}m ago", secs / 60),
        3_600..=86_399 => format!("{}h ago", secs / 3_600),
        _ => format!("{}d ago", secs / 86_400),
    }
}
