use anyhow::{Context, Result};
use std::fmt;
use std::io::Write;
use std::process::{Command, Stdio};

use super::{parse_table, render_table};

/// Access to the host's periodic-job table.
pub trait CronTable {
    /// Current lines. An absent table reads as empty.
    fn read(&self) -> Result<Vec<String>>;

    /// Replace the whole table with `lines`.
    fn write(&self, lines: &[String]) -> Result<()>;
}

/// The `crontab` binary is not installed on this host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CronUnavailable;

impl fmt::Display for CronUnavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "crontab command not found")
    }
}

impl std::error::Error for CronUnavailable {}

/// User crontab via `crontab -l` / `crontab -`.
pub struct SystemCrontab;

impl Default for SystemCrontab {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemCrontab {
    pub fn new() -> Self {
        Self
    }

    /// Locate `crontab` on PATH.
    pub fn detect() -> std::result::Result<Self, CronUnavailable> {
        which::which("crontab")
            .map(|path| {
                tracing::debug!("Using crontab at {}", path.display());
                Self
            })
            .map_err(|_| CronUnavailable)
    }

    /// `crontab -l` exits non-zero with "no crontab for <user>" when the user
    /// has never installed one.
    fn is_missing_table(stderr: &str) -> bool {
        stderr.to_lowercase().contains("no crontab")
    }
}

impl CronTable for SystemCrontab {
    fn read(&self) -> Result<Vec<String>> {
        let output = Command::new("crontab")
            .arg("-l")
            .output()
            .context("Failed to execute crontab -l")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if Self::is_missing_table(&stderr) {
                return Ok(Vec::new());
            }
            anyhow::bail!("crontab -l failed: {}", stderr.trim());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(parse_table(&stdout))
    }

    fn write(&self, lines: &[String]) -> Result<()> {
        let mut child = Command::new("crontab")
            .arg("-")
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .context("Failed to execute crontab -")?;

        {
            let mut stdin = child.stdin.take().context("Failed to open crontab stdin")?;
            stdin
                .write_all(render_table(lines).as_bytes())
                .context("Failed to write crontab input")?;
        }

        let output = child
            .wait_with_output()
            .context("Failed to wait for crontab")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("crontab - failed: {}", stderr.trim());
        }

        Ok(())
    }
}

/// In-memory table for tests.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryCronTable {
    lines: std::cell::RefCell<Vec<String>>,
    writes: std::cell::Cell<usize>,
}

#[cfg(test)]
impl MemoryCronTable {
    pub fn with_lines(lines: &[&str]) -> Self {
        Self {
            lines: std::cell::RefCell::new(lines.iter().map(|l| l.to_string()).collect()),
            writes: std::cell::Cell::new(0),
        }
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }

    pub fn writes(&self) -> usize {
        self.writes.get()
    }
}

#[cfg(test)]
impl CronTable for MemoryCronTable {
    fn read(&self) -> Result<Vec<String>> {
        Ok(self.lines())
    }

    fn write(&self, lines: &[String]) -> Result<()> {
        *self.lines.borrow_mut() = lines.to_vec();
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }
}
