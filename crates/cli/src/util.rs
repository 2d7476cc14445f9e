//! Shared utilities for CLI commands

use owo_colors::OwoColorize;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use watcher::{EventBatch, Op};

/// Whether a batch should be reported under the extension filter
///
/// An empty filter reports everything.
pub fn is_relevant(batch: &EventBatch, extensions: &[String]) -> bool {
    extensions.is_empty() || batch.contains_any_extension(extensions)
}

/// Render a path relative to the first root containing it
pub fn display_path(path: &Path, roots: &[PathBuf]) -> String {
    roots
        .iter()
        .find_map(|root| path.strip_prefix(root).ok())
        .filter(|rel| !rel.as_os_str().is_empty())
        .unwrap_or(path)
        .display()
        .to_string()
}

/// Current time as milliseconds since the Unix epoch
pub fn now_unix_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// One JSON object per batch, for `--json` output
pub fn batch_to_json(batch: &EventBatch, ts_unix_ms: u64) -> serde_json::Value {
    json!({
        "ts_unix_ms": ts_unix_ms,
        "count": batch.len(),
        "events": batch.events(),
    })
}

/// Colored, fixed-width op label
pub fn format_op(op: Op) -> String {
    let label = format!("{:<6}", op.to_string());
    match op {
        Op::Create => label.green().to_string(),
        Op::Remove => label.red().to_string(),
        Op::Modify => label.yellow().to_string(),
        Op::Rename => label.magenta().to_string(),
        Op::Chmod => label.dimmed().to_string(),
    }
}

/// Human-readable lines for a batch: a header followed by one line per event
pub fn format_batch(batch: &EventBatch, roots: &[PathBuf]) -> Vec<String> {
    let noun = if batch.len() == 1 { "event" } else { "events" };
    let mut lines = Vec::with_capacity(batch.len() + 1);
    lines.push(format!(
        "{} {}",
        "Batch".bold(),
        format!("({} {})", batch.len(), noun).dimmed()
    ));
    for event in batch {
        lines.push(format!(
            "  {} {}",
            format_op(event.op),
            display_path(&event.path, roots)
        ));
    }
    lines
}
