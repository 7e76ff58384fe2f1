//! Model detection from Claude Code transcripts.
//!
//! Claude Code stores conversation transcripts at:
//! `~/.claude/projects/{encoded-cwd}/{session_id}.jsonl`

mod parser;
mod path;

pub use parser::{scan_transcript, ModelUsage};
pub use path::{projects_dir, recent_transcripts, MAX_TRANSCRIPTS};

use std::path::Path;

/// Model of the most recently active session, from `~/.claude/projects`.
pub fn detect_model() -> ModelUsage {
    match projects_dir() {
        Some(dir) => detect_model_in(&dir),
        None => ModelUsage::default(),
    }
}

/// Walk transcripts newest first and stop at the first one naming a model.
pub fn detect_model_in(dir: &Path) -> ModelUsage {
    for path in recent_transcripts(dir, MAX_TRANSCRIPTS) {
        match scan_transcript(&path) {
            Ok(usage) if usage.model.is_some() => return usage,
            Ok(_) => continue,
            Err(e) => {
                tracing::debug!("Skipping transcript {}: {}", path.display(), e);
                continue;
            }
        }
    }
    ModelUsage::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::{Duration, SystemTime};

    fn write_transcript(path: &Path, content: &str, age_secs: u64) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
        let file = fs::File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() - Duration::from_secs(age_secs))
            .unwrap();
    }

    #[test]
    fn test_detect_model_newest_with_model() {
        let dir = tempfile::tempdir().unwrap();
        write_transcript(
            &dir.path().join("p1/old.jsonl"),
            r#"{"message":{"model":"claude-sonnet-4-5","content":[]}}"#,
            100,
        );
        // Newest file has no model yet; the scan falls through to the next
        write_transcript(
            &dir.path().join("p2/new.jsonl"),
            r#"{"message":{"role":"user","content":"hello"}}"#,
            1,
        );

        let usage = detect_model_in(dir.path());
        assert_eq!(usage.model.as_deref(), Some("claude-sonnet-4-5"));
    }

    #[test]
    fn test_detect_model_ignores_subagents() {
        let dir = tempfile::tempdir().unwrap();
        write_transcript(
            &dir.path().join("p/main.jsonl"),
            r#"{"message":{"model":"claude-opus-4-1","content":[]}}"#,
            50,
        );
        write_transcript(
            &dir.path().join("p/agent-1.jsonl"),
            r#"{"message":{"model":"claude-haiku-4-5","content":[]}}"#,
            1,
        );

        let usage = detect_model_in(dir.path());
        assert_eq!(usage.model.as_deref(), Some("claude-opus-4-1"));
    }

    #[test]
    fn test_detect_model_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(detect_model_in(dir.path()), ModelUsage::default());
    }
}
