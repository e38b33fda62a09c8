//! `gistify status` — which tracked files would be pushed by the next sync.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use gistify_core::{store, store::DEFAULT_STORE_FILE, Mapping};
use gistify_sync::{staleness, RecordStatus};

/// Arguments for `gistify status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Metadata state file.
    #[arg(long, default_value = DEFAULT_STORE_FILE)]
    pub store: PathBuf,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub fn run(self) -> Result<()> {
        let mapping = store::load_at(&self.store)
            .with_context(|| format!("failed to load {}", self.store.display()))?;

        let rows = build_rows(&mapping);
        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&rows).context("failed to serialize status JSON")?
            );
            return Ok(());
        }

        print_table(rows);
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct StatusRow {
    path: String,
    #[serde(flatten)]
    status: RecordStatus,
    url: String,
    public: bool,
    last_synced_at: Option<String>,
    #[serde(skip)]
    last_synced_age: String,
}

#[derive(Tabled)]
struct StatusTableRow {
    #[tabled(rename = "file")]
    file: String,
    #[tabled(rename = "status")]
    status: String,
    #[tabled(rename = "visibility")]
    visibility: &'static str,
    #[tabled(rename = "last sync")]
    last_sync: String,
    #[tabled(rename = "gist")]
    url: String,
}

fn build_rows(mapping: &Mapping) -> Vec<StatusRow> {
    let now = Utc::now();
    staleness::check_all(mapping)
        .into_iter()
        .filter_map(|(path, status)| {
            let record = mapping.get(&path)?;
            let synced = record.last_modified();
            Some(StatusRow {
                url: record.remote_url.clone(),
                public: record.is_public,
                last_synced_at: synced.map(|t| t.to_rfc3339()),
                last_synced_age: synced
                    .map(|t| staleness::format_age(t, now))
                    .unwrap_or_else(|| "unknown".to_string()),
                path,
                status,
            })
        })
        .collect()
}

fn print_table(rows: Vec<StatusRow>) {
    let modified = rows
        .iter()
        .filter(|r| matches!(r.status, RecordStatus::Modified { .. }))
        .count();
    let missing = rows
        .iter()
        .filter(|r| matches!(r.status, RecordStatus::Missing))
        .count();

    println!(
        "Gistify v{} | {} tracked | {} modified | {} missing",
        env!("CARGO_PKG_VERSION"),
        rows.len(),
        modified,
        missing,
    );

    if rows.is_empty() {
        println!("No files tracked yet. Run `gistify sync <pattern>` first.");
        return;
    }

    let table_rows: Vec<StatusTableRow> = rows
        .into_iter()
        .map(|row| StatusTableRow {
            file: row.path,
            status: status_indicator(&row.status),
            visibility: if row.public { "public" } else { "secret" },
            last_sync: row.last_synced_age,
            url: row.url,
        })
        .collect();
    let mut table = Table::new(table_rows);
    table.with(Style::rounded());
    println!("{table}");

    if modified > 0 {
        println!("Run 'gistify sync <pattern>' to push modified files.");
    }
}

fn status_indicator(status: &RecordStatus) -> String {
    let label = status.label();
    match status {
        RecordStatus::Current => label.green().to_string(),
        RecordStatus::Modified { .. } => label.yellow().bold().to_string(),
        RecordStatus::Missing => label.bright_black().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gistify_core::{SnippetId, SnippetRecord};

    #[test]
    fn rows_follow_mapping_and_mark_missing_files() {
        let mut mapping = Mapping::new();
        mapping.insert(
            "does/not/exist.txt".to_string(),
            SnippetRecord::new(
                SnippetId::from("X"),
                "https://gist.github.com/X",
                "does/not/exist.txt",
                0,
                true,
            ),
        );

        let rows = build_rows(&mapping);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, RecordStatus::Missing);
        assert!(rows[0].public);
        assert_eq!(
            rows[0].last_synced_at.as_deref(),
            Some("1970-01-01T00:00:00+00:00")
        );
    }

    #[test]
    fn json_row_flattens_status() {
        let row = StatusRow {
            path: "a.txt".to_string(),
            status: RecordStatus::Modified { mtime: 5 },
            url: "u".to_string(),
            public: false,
            last_synced_at: None,
            last_synced_age: "unknown".to_string(),
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["state"], "modified");
        assert_eq!(json["mtime"], 5);
        assert!(json.get("last_synced_age").is_none());
    }
}
