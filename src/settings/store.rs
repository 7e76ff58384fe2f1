use anyhow::{Context, Result};
use chrono::Local;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use super::{parse_document, ConfigDocument};

/// Sortable, sub-second stamp for backup names.
const BACKUP_STAMP_FORMAT: &str = "%Y%m%d_%H%M%S%.6f";

const MAX_BACKUP_ATTEMPTS: usize = 100;

/// Get the path to Claude's settings.json.
pub fn claude_settings_path() -> Option<PathBuf> {
    let home = dirs::home_dir()?;
    Some(home.join(".claude").join("settings.json"))
}

/// Result of writing the settings file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReport {
    /// Snapshot of the previous file, when one existed and was copied.
    pub backup: Option<PathBuf>,
}

/// A settings.json on disk.
///
/// One install or uninstall reads it once and writes it once; nothing is
/// cached between calls.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store for `~/.claude/settings.json`.
    pub fn user() -> Result<Self> {
        let path = claude_settings_path().context("Could not determine home directory")?;
        Ok(Self::new(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw file bytes, or `None` if the file does not exist.
    pub fn read_raw(&self) -> Result<Option<Vec<u8>>> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| {
                format!("Failed to read settings file: {}", self.path.display())
            }),
        }
    }

    /// Read the document. A missing file yields `None`; a malformed one
    /// (including non-UTF-8 bytes) yields an empty document.
    pub fn load(&self) -> Result<Option<ConfigDocument>> {
        let Some(bytes) = self.read_raw()? else {
            return Ok(None);
        };
        match String::from_utf8(bytes) {
            Ok(raw) => Ok(Some(parse_document(Some(&raw)))),
            Err(e) => {
                tracing::warn!(
                    "{} is not valid UTF-8 ({}); starting from empty",
                    self.path.display(),
                    e
                );
                Ok(Some(parse_document(None)))
            }
        }
    }

    /// Back up the current file (if any) and write `doc` in its place.
    pub fn write(&self, doc: &ConfigDocument) -> Result<WriteReport> {
        let backup = self.backup()?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let mut content =
            serde_json::to_string_pretty(doc).context("Failed to serialize settings")?;
        content.push('\n');

        fs::write(&self.path, content)
            .with_context(|| format!("Failed to write settings file: {}", self.path.display()))?;

        Ok(WriteReport { backup })
    }

    /// Copy the current file to `<path>.backup.<YYYYmmdd_HHMMSS.ffffff>`.
    ///
    /// Snapshots are write-once. If the name is already taken a `-N` suffix
    /// is added, so every call that returns a path wrote that file itself.
    fn backup(&self) -> Result<Option<PathBuf>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to read settings file: {}", self.path.display())
                })
            }
        };

        let stamp = Local::now().format(BACKUP_STAMP_FORMAT).to_string();
        self.snapshot(&bytes, &stamp).map(Some)
    }

    fn snapshot(&self, bytes: &[u8], stamp: &str) -> Result<PathBuf> {
        for attempt in 0..MAX_BACKUP_ATTEMPTS {
            let backup_path = if attempt == 0 {
                backup_path_for(&self.path, stamp)
            } else {
                backup_path_for(&self.path, &format!("{}-{}", stamp, attempt))
            };

            let mut file = match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&backup_path)
            {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(e).with_context(|| {
                        format!("Failed to create backup: {}", backup_path.display())
                    })
                }
            };

            file.write_all(bytes)
                .with_context(|| format!("Failed to write backup: {}", backup_path.display()))?;

            tracing::debug!("Backed up settings to {}", backup_path.display());
            return Ok(backup_path);
        }

        anyhow::bail!(
            "Failed to create backup of {}: too many snapshots named {}",
            self.path.display(),
            stamp
        )
    }
}

fn backup_path_for(path: &Path, stamp: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "settings.json".into());
    name.push(format!(".backup.{}", stamp));
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{apply, remove};
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    fn backups_in(dir: &Path) -> Vec<PathBuf> {
        let mut found: Vec<PathBuf> = fs::read_dir(dir)
            .unwrap()
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.to_string_lossy().contains(".backup."))
            .collect();
        found.sort();
        found
    }

    #[test]
    fn test_claude_settings_path() {
        let path = claude_settings_path();
        assert!(path.is_some());
        assert!(path.unwrap().ends_with(".claude/settings.json"));
    }

    #[test]
    fn test_backup_path_for() {
        let path = backup_path_for(Path::new("/home/u/.claude/settings.json"), "20261018_120000");
        assert_eq!(
            path,
            PathBuf::from("/home/u/.claude/settings.json.backup.20261018_120000")
        );
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_write_creates_file_without_backup() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join(".claude").join("settings.json"));

        let report = store.write(&apply(None, "/usr/bin/claude-statusbar")).unwrap();

        assert!(report.backup.is_none());
        assert!(backups_in(&dir.path().join(".claude")).is_empty());

        let written: Value =
            serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(written["statusLine"]["command"], json!("/usr/bin/claude-statusbar"));
    }

    #[test]
    fn test_write_backs_up_previous_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let original = "{\n  \"theme\":   \"dark\"\n}";
        fs::write(&path, original).unwrap();

        let store = SettingsStore::new(&path);
        let doc = apply(store.load().unwrap(), "/usr/bin/claude-statusbar");
        let report = store.write(&doc).unwrap();

        let backup = report.backup.expect("backup should be taken");
        assert_eq!(fs::read_to_string(&backup).unwrap(), original);
        assert_eq!(backups_in(dir.path()), vec![backup]);
    }

    #[test]
    fn test_malformed_file_is_backed_up_and_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ broken").unwrap();

        let store = SettingsStore::new(&path);
        let doc = apply(store.load().unwrap(), "/usr/bin/claude-statusbar");
        let report = store.write(&doc).unwrap();

        assert_eq!(fs::read_to_string(report.backup.unwrap()).unwrap(), "{ broken");
        let written: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written.as_object().unwrap().len(), 1);
    }

    #[test]
    fn test_non_utf8_file_is_treated_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let raw: &[u8] = b"{\"theme\":\"\xff\"}";
        fs::write(&path, raw).unwrap();

        let store = SettingsStore::new(&path);
        let loaded = store.load().unwrap();
        assert_eq!(loaded, Some(ConfigDocument::new()));

        let report = store.write(&apply(loaded, "/usr/bin/claude-statusbar")).unwrap();

        assert_eq!(fs::read(report.backup.unwrap()).unwrap(), raw);
        let written: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(
            written,
            json!({"statusLine": {
                "type": "command",
                "command": "/usr/bin/claude-statusbar",
                "padding": 0
            }})
        );
    }

    #[test]
    fn test_back_to_back_writes_each_get_a_backup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"theme":"dark"}"#).unwrap();
        let store = SettingsStore::new(&path);

        let first = store
            .write(&apply(store.load().unwrap(), "/usr/bin/claude-statusbar"))
            .unwrap();
        let before_second = fs::read_to_string(&path).unwrap();
        let second = store.write(&remove(store.load().unwrap())).unwrap();

        let first = first.backup.unwrap();
        let second = second.backup.unwrap();
        assert_ne!(first, second);
        assert_eq!(fs::read_to_string(&first).unwrap(), r#"{"theme":"dark"}"#);
        assert_eq!(fs::read_to_string(&second).unwrap(), before_second);
        assert_eq!(backups_in(dir.path()).len(), 2);
    }

    #[test]
    fn test_backup_name_collision_gets_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let store = SettingsStore::new(&path);
        let stamp = "20261018_120000.000000";
        let taken = backup_path_for(&path, stamp);
        fs::write(&taken, "older").unwrap();

        let backup = store.snapshot(b"{}", stamp).unwrap();

        assert_eq!(backup, backup_path_for(&path, "20261018_120000.000000-1"));
        assert_eq!(fs::read_to_string(&backup).unwrap(), "{}");
        assert_eq!(fs::read_to_string(&taken).unwrap(), "older");
    }

    #[test]
    fn test_install_uninstall_cycle_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"theme":"dark","model":"opus"}"#).unwrap();
        let store = SettingsStore::new(&path);

        let doc = apply(store.load().unwrap(), "/usr/bin/claude-statusbar");
        store.write(&doc).unwrap();
        let doc = remove(store.load().unwrap());
        store.write(&doc).unwrap();

        let written: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, json!({"theme": "dark", "model": "opus"}));
    }
}
