//! JSONL transcript parser: which model answered last, and whether extended
//! thinking was used.

use anyhow::Result;
use serde::Deserialize;
use serde_json::Value;
use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::Path;

/// Files larger than this are read from the tail only.
const TAIL_THRESHOLD: u64 = 1024 * 1024;

/// Read lines from a file, seeking near the end for large files.
/// Returns non-empty lines from the file.
fn read_lines_from_end(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path)?;
    let file_size = file.metadata()?.len();

    if file_size == 0 {
        return Ok(Vec::new());
    }

    let mut reader = BufReader::new(file);
    let seek_pos = file_size.saturating_sub(TAIL_THRESHOLD);
    if seek_pos > 0 {
        reader.seek(SeekFrom::Start(seek_pos))?;
        // Skip partial line if we seeked to middle
        let mut _skip = Vec::new();
        reader.read_until(b'\n', &mut _skip)?;
    }

    let mut lines = Vec::new();
    for line in reader.split(b'\n') {
        let line = String::from_utf8_lossy(&line?).into_owned();
        if !line.trim().is_empty() {
            lines.push(line);
        }
    }

    Ok(lines)
}

/// The message structure within a transcript entry.
#[derive(Debug, Clone, Deserialize)]
struct EntryMessage {
    model: Option<String>,
    /// A string for plain user prompts, an array of blocks otherwise.
    #[serde(default)]
    content: Value,
}

impl EntryMessage {
    fn has_thinking(&self) -> bool {
        self.content
            .as_array()
            .map(|blocks| {
                blocks
                    .iter()
                    .any(|b| b.get("type").and_then(|t| t.as_str()) == Some("thinking"))
            })
            .unwrap_or(false)
    }
}

/// A transcript entry (one line from the JSONL file).
#[derive(Debug, Clone, Deserialize)]
struct TranscriptEntry {
    message: Option<EntryMessage>,
}

/// What one transcript says about the model in use.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelUsage {
    /// Last model name seen, e.g. "claude-opus-4-1-20250805"
    pub model: Option<String>,
    /// Whether any assistant turn contained a thinking block
    pub has_thinking: bool,
}

/// Scan one transcript. Lines that are not valid entries are skipped.
pub fn scan_transcript(path: &Path) -> Result<ModelUsage> {
    let mut usage = ModelUsage::default();

    for line in read_lines_from_end(path)? {
        let Ok(entry) = serde_json::from_str::<TranscriptEntry>(&line) else {
            continue;
        };
        let Some(msg) = entry.message else {
            continue;
        };

        if let Some(model) = msg.model.as_deref().filter(|m| !m.is_empty()) {
            usage.model = Some(model.to_string());
        }
        if msg.has_thinking() {
            usage.has_thinking = true;
        }
    }

    Ok(usage)
}
