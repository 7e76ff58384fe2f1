//! Merge and unmerge the `statusLine` entry in Claude Code's settings.json.
//!
//! The functions here are pure: they take the previous document (if any) and
//! return the next one. Reading, backing up and writing the file is done by
//! [`SettingsStore`].

mod store;

pub use store::{claude_settings_path, SettingsStore, WriteReport};

use serde_json::{json, Map, Value};

/// The only key this crate owns in settings.json.
pub const STATUS_LINE_KEY: &str = "statusLine";

/// Settings document as a JSON object.
pub type ConfigDocument = Map<String, Value>;

/// Parse raw settings text into a document.
///
/// Anything that is not a JSON object at the top level (including invalid
/// JSON) is treated as an empty document so a corrupt settings file never
/// blocks installation.
pub fn parse_document(raw: Option<&str>) -> ConfigDocument {
    let Some(raw) = raw else {
        return Map::new();
    };
    if raw.trim().is_empty() {
        return Map::new();
    }

    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => map,
        Ok(other) => {
            tracing::warn!(
                "settings.json top level is {}, not an object; starting from empty",
                json_kind(&other)
            );
            Map::new()
        }
        Err(e) => {
            tracing::warn!("settings.json is not valid JSON ({}); starting from empty", e);
            Map::new()
        }
    }
}

/// Set `statusLine` to run `command_path`, leaving every other key alone.
/// The path is shell-quoted, since Claude Code runs the command through a shell.
pub fn apply(existing: Option<ConfigDocument>, command_path: &str) -> ConfigDocument {
    let mut doc = existing.unwrap_or_default();
    doc.insert(STATUS_LINE_KEY.to_string(), status_line_value(command_path));
    doc
}

/// Drop `statusLine` if present.
pub fn remove(existing: Option<ConfigDocument>) -> ConfigDocument {
    let mut doc = existing.unwrap_or_default();
    doc.shift_remove(STATUS_LINE_KEY);
    doc
}

/// The command currently configured under `statusLine.command`, if any.
pub fn status_line_command(doc: &ConfigDocument) -> Option<&str> {
    doc.get(STATUS_LINE_KEY)
        .and_then(|sl| sl.get("command"))
        .and_then(|c| c.as_str())
}

fn status_line_value(command_path: &str) -> Value {
    json!({
        "type": "command",
        "command": crate::shell::quote(command_path),
        "padding": 0,
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
