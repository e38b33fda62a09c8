//! Candidate file discovery: recursive walk + regex filter.

use std::path::{Path, PathBuf};

use regex::Regex;
use walkdir::WalkDir;

use crate::error::SyncError;

/// Compile a candidate pattern, mapping a bad regex to a precondition error.
pub fn compile_pattern(pattern: &str) -> Result<Regex, SyncError> {
    Regex::new(pattern).map_err(|e| {
        SyncError::Precondition(format!("could not compile given regex {pattern}: {e}"))
    })
}

/// Walk `root` recursively and return every non-directory path that matches
/// `pattern`, in file-name order.
///
/// Symlinks are not descended into but are reported; a link to a directory
/// is dropped, a dangling link is kept and left for the engine to skip.
/// Paths under `.` are reported without the leading `./` (`notes/a.md`);
/// any other root is kept as a prefix. The pattern is matched against that
/// reported path. A walk error aborts the whole collection.
pub fn collect_candidates(root: &Path, pattern: &str) -> Result<Vec<PathBuf>, SyncError> {
    let regex = compile_pattern(pattern)?;
    let relative_to_cwd = root == Path::new(".");

    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|source| SyncError::Traversal {
            root: root.to_path_buf(),
            source,
        })?;
        if is_directory(&entry) {
            continue;
        }

        let path = if relative_to_cwd {
            entry
                .path()
                .strip_prefix(root)
                .unwrap_or(entry.path())
                .to_path_buf()
        } else {
            entry.into_path()
        };
        if regex.is_match(&path.to_string_lossy()) {
            files.push(path);
        }
    }

    tracing::debug!("{} candidate(s) under {}", files.len(), root.display());
    Ok(files)
}

fn is_directory(entry: &walkdir::DirEntry) -> bool {
    if entry.path_is_symlink() {
        return std::fs::metadata(entry.path()).is_ok_and(|m| m.is_dir());
    }
    entry.file_type().is_dir()
}
