//! The usage cache file (`~/.claude-usage.json`).
//!
//! Written by `--update` (usually from cron) and read on every status line
//! render. Keys this crate does not know about are carried through untouched.

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::types::UsageReading;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Get the default cache path (~/.claude-usage.json).
pub fn default_usage_file_path() -> Option<PathBuf> {
    let home = dirs::home_dir()?;
    Some(home.join(".claude-usage.json"))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageCache {
    /// Written as an integer; other tools may store fractions.
    #[serde(default)]
    pub session_percent: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_reset: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_reset_hour: Option<u32>,
    #[serde(default)]
    pub week_percent: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub week_reset: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UsageCache {
    /// Read the cache. Missing, unreadable or malformed files give an
    /// all-null cache.
    pub fn load(path: &Path) -> Self {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                if e.kind() != ErrorKind::NotFound {
                    tracing::warn!("Failed to read {}: {}", path.display(), e);
                }
                return Self::default();
            }
        };

        serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!("Ignoring malformed usage cache {}: {}", path.display(), e);
            Self::default()
        })
    }

    /// Create the cache with null percentages if it does not exist yet.
    ///
    /// Returns true when a file was created.
    pub fn ensure_exists(path: &Path) -> Result<bool> {
        if path.exists() {
            return Ok(false);
        }
        Self::default().save(path)?;
        Ok(true)
    }

    /// Copy every field present in `reading` and stamp `last_updated`.
    pub fn merge(&mut self, reading: &UsageReading, now: NaiveDateTime) {
        if let Some(pct) = reading.session_percent {
            self.session_percent = Some(Number::from(pct));
        }
        if let Some(reset) = reading.session_reset {
            self.session_reset = Some(format_timestamp(reset));
        }
        if let Some(hour) = reading.session_reset_hour {
            self.session_reset_hour = Some(hour);
        }
        if let Some(pct) = reading.week_percent {
            self.week_percent = Some(Number::from(pct));
        }
        if let Some(reset) = reading.week_reset {
            self.week_reset = Some(format_timestamp(reset));
        }
        self.last_updated = Some(format_timestamp(now));
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let mut content =
            serde_json::to_string_pretty(self).context("Failed to serialize usage cache")?;
        content.push('\n');

        fs::write(path, content)
            .with_context(|| format!("Failed to write usage cache: {}", path.display()))
    }
}

fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}
