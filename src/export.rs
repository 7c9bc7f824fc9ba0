//! JSON export of an analysis record.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use kollab_common::AnalysisRecord;

/// `analysis-{ticket}.json`; unsaved runs export as `analysis-unsaved.json`.
pub fn file_name(ticket_id: &str) -> String {
    let ticket = ticket_id.trim();
    let ticket = if ticket.is_empty() { "unsaved" } else { ticket };
    let safe: String = ticket
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    format!("analysis-{}.json", safe)
}

/// Pretty-printed JSON in the stored record shape.
pub fn to_json(record: &AnalysisRecord) -> Result<String> {
    serde_json::to_string_pretty(record).context("Failed to serialize analysis")
}

/// Write `record` into `dir` and return the path written.
pub fn write(record: &AnalysisRecord, dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    let path = dir.join(file_name(&record.ticket_id));
    let json = to_json(record)?;
    std::fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), ticket_id = %record.ticket_id, "analysis exported");
    Ok(path)
}
