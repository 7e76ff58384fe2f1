//! Register and unregister the periodic `--update` job in the user crontab.
//!
//! [`register`] and [`unregister`] work on the table as a list of lines and
//! never touch the host; [`CronTable`] implementations do the reading and
//! writing.

mod crontab;

pub use crontab::{CronTable, CronUnavailable, SystemCrontab};

#[cfg(test)]
pub use crontab::MemoryCronTable;

/// Substring that identifies every line this crate owns in the crontab.
pub const UNIQUE_MATCH: &str = "claude-statusbar";

/// Marker comment written above the schedule line.
pub const MARKER_COMMENT: &str = "# claude-statusbar: refresh usage cache";

/// Line fragments written by older installers. Removed on unregister only.
const LEGACY_PATTERNS: &[&str] = &[
    "# Claude Statusbar",
    "# claude statusbar auto-update",
    "claude_statusbar.update_usage",
    "claude_statusbar/update_usage.py",
];

/// Build the schedule line that runs `<exe> --update` every `interval_minutes`.
///
/// The path is shell-quoted and `%` is escaped, since cron turns a bare `%`
/// into a newline.
pub fn schedule_line(exe: &str, interval_minutes: u32) -> String {
    let exe = crate::shell::quote(exe).replace('%', r"\%");
    format!(
        "*/{} * * * * {} --update >/dev/null 2>&1",
        interval_minutes, exe
    )
}

/// Append `marker_comment` and `schedule_line` unless a line already contains
/// `unique_match`.
pub fn register(
    table: &[String],
    marker_comment: &str,
    schedule_line: &str,
    unique_match: &str,
) -> Vec<String> {
    let mut lines = table.to_vec();
    if is_registered(table, unique_match) {
        return lines;
    }
    lines.push(marker_comment.to_string());
    lines.push(schedule_line.to_string());
    lines
}

/// Drop every line containing `unique_match`, plus legacy lines.
pub fn unregister(table: &[String], unique_match: &str) -> Vec<String> {
    table
        .iter()
        .filter(|line| !line.contains(unique_match) && !is_legacy_line(line))
        .cloned()
        .collect()
}

pub fn is_registered(table: &[String], unique_match: &str) -> bool {
    table.iter().any(|line| line.contains(unique_match))
}

fn is_legacy_line(line: &str) -> bool {
    LEGACY_PATTERNS.iter().any(|p| line.contains(p))
}

/// Split crontab text into lines, exactly as read.
pub fn parse_table(text: &str) -> Vec<String> {
    text.lines().map(|l| l.to_string()).collect()
}

/// Join lines back into crontab text. cron requires a trailing newline.
pub fn render_table(lines: &[String]) -> String {
    if lines.is_empty() {
        return String::new();
    }
    let mut text = lines.join("\n");
    text.push('\n');
    text
}
