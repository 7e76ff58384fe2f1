//! Run `claude /usage` in a pseudo-terminal and capture what it prints.

use anyhow::{Context, Result};
use chrono::Local;
use once_cell::sync::Lazy;
use portable_pty::{native_pty_system, ChildKiller, CommandBuilder, PtySize};
use regex::Regex;
use std::io::{Read, Write};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use super::parser::parse_usage_output;
use super::types::UsageReading;
use crate::cli::ClaudeCli;

/// How long to keep reading once output stops arriving.
const DRAIN_IDLE: Duration = Duration::from_millis(300);

/// Fetch usage by running `claude /usage` directly (not interactive mode).
///
/// 1. Spawns Claude in a PTY so it renders as in a terminal
/// 2. Waits `wait` for the usage panel to load
/// 3. Drains the output, sends `/exit`, kills the child
/// 4. Strips escape sequences and parses the text
///
/// Returns the parsed reading and the cleaned text it came from.
pub fn fetch_usage(claude: &ClaudeCli, wait: Duration) -> Result<(UsageReading, String)> {
    let pty_system = native_pty_system();
    let pair = pty_system
        .openpty(PtySize {
            rows: 50,
            cols: 120,
            pixel_width: 0,
            pixel_height: 0,
        })
        .context("Failed to open PTY")?;

    let mut cmd = CommandBuilder::new(claude.program());
    cmd.args(claude.args());
    cmd.arg("/usage");
    cmd.env("TERM", "xterm-256color");
    // Home is trusted by Claude Code, avoids the "trust this folder?" prompt
    if let Some(home) = dirs::home_dir() {
        cmd.cwd(home);
    }

    let mut child = pair
        .slave
        .spawn_command(cmd)
        .with_context(|| format!("Failed to spawn {}", claude.display()))?;
    drop(pair.slave);

    tracing::debug!(
        "Spawned {} /usage with PID {:?}",
        claude.display(),
        child.process_id()
    );

    let mut reader = pair
        .master
        .try_clone_reader()
        .context("Failed to clone PTY reader")?;

    // Reader thread is detached: a blocked read must not hold up the caller
    let (tx, rx) = mpsc::channel::<Vec<u8>>();
    thread::spawn(move || {
        let mut buf = [0u8; 4096];
        loop {
            match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    if tx.send(buf[..n].to_vec()).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::debug!("PTY read error: {}", e);
                    break;
                }
            }
        }
    });

    thread::sleep(wait);

    let mut output = Vec::new();
    loop {
        match rx.recv_timeout(DRAIN_IDLE) {
            Ok(chunk) => output.extend_from_slice(&chunk),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    if let Ok(mut writer) = pair.master.take_writer() {
        let _ = writer.write_all(b"/exit\r");
        let _ = writer.flush();
        thread::sleep(DRAIN_IDLE);
    }

    if let Err(e) = child.kill() {
        tracing::debug!("Failed to kill claude: {}", e);
    }
    let _ = child.wait();

    tracing::debug!("Captured {} bytes of /usage output", output.len());

    let text = strip_ansi(&String::from_utf8_lossy(&output));
    let reading = parse_usage_output(&text, Local::now().naive_local());
    Ok((reading, text))
}

/// Remove OSC and CSI escape sequences.
pub fn strip_ansi(input: &str) -> String {
    static OSC_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\x1b\][^\x07\x1b]*(?:\x07|\x1b\\)").unwrap());
    static CSI_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\x1b\[[0-9;?]*[ -/]*[@-~]").unwrap());

    let without_osc = OSC_RE.replace_all(input, "");
    CSI_RE.replace_all(&without_osc, "").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_ansi_csi() {
        let input = "\x1b[1m\x1b[38;5;208mCurrent session\x1b[0m\n\x1b[2K 72% used";
        assert_eq!(strip_ansi(input), "Current session\n 72% used");
    }

    #[test]
    fn test_strip_ansi_osc() {
        let input = "\x1b]0;claude\x07Usage\x1b]8;;http://x\x1b\\link";
        assert_eq!(strip_ansi(input), "Usagelink");
    }

    #[test]
    fn test_strip_ansi_private_modes() {
        let input = "\x1b[?25l\x1b[?2004hready\x1b[?25h";
        assert_eq!(strip_ansi(input), "ready");
    }

    #[test]
    fn test_strip_ansi_plain_text() {
        assert_eq!(strip_ansi("no escapes here"), "no escapes here");
    }

    #[test]
    #[ignore] // needs Claude Code installed and logged in
    fn test_fetch_usage_live() {
        let config = crate::config::Config::default();
        if let Some(claude) = ClaudeCli::locate(&config) {
            let (_, raw) = fetch_usage(&claude, Duration::from_secs(8)).unwrap();
            assert!(!raw.is_empty());
        }
    }
}
