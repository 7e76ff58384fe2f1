//! Transcript file path utilities.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Maximum number of transcripts inspected per render.
pub const MAX_TRANSCRIPTS: usize = 30;

/// Get Claude Code's projects directory (`~/.claude/projects/`).
pub fn projects_dir() -> Option<PathBuf> {
    let home = dirs::home_dir()?;
    Some(home.join(".claude").join("projects"))
}

/// Subagent transcripts carry the parent's model, not the one in use.
fn is_subagent_transcript(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.contains("agent-"))
        .unwrap_or(false)
}

/// Main-session `.jsonl` files under `dir` (recursively), newest first,
/// at most `limit` of them.
pub fn recent_transcripts(dir: &Path, limit: usize) -> Vec<PathBuf> {
    let mut found: Vec<(PathBuf, SystemTime)> = Vec::new();
    collect_transcripts(dir, &mut found);

    found.sort_by(|a, b| b.1.cmp(&a.1));
    found
        .into_iter()
        .take(limit)
        .map(|(path, _)| path)
        .filter(|path| !is_subagent_transcript(path))
        .collect()
}

fn collect_transcripts(dir: &Path, found: &mut Vec<(PathBuf, SystemTime)>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let Ok(file_type) = entry.file_type() else {
            continue;
        };

        if file_type.is_dir() {
            collect_transcripts(&path, found);
            continue;
        }

        // Only consider .jsonl files
        if path.extension().and_then(|s| s.to_str()) != Some("jsonl") {
            continue;
        }

        if let Ok(modified) = entry.metadata().and_then(|m| m.modified()) {
            found.push((path, modified));
        }
    }
}
