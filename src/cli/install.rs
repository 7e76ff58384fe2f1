//! Install/uninstall claude-statusbar into the user's environment.
//!
//! Install:
//! 1. Creates the usage cache (~/.claude-usage.json) if missing
//! 2. Points `statusLine` in ~/.claude/settings.json at this binary
//! 3. Registers a cron job that runs `--update` periodically
//!
//! Uninstall reverses 2 and 3 and removes the cache unless asked to keep it.
//! Each step is idempotent and a failing step does not stop the others.

use anyhow::{Context, Result};
use crossterm::style::Stylize;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use crate::config::Config;
use crate::cron::{self, CronTable, CronUnavailable};
use crate::settings::{self, SettingsStore};
use crate::usage::UsageCache;

/// What a step did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Changed(String),
    Unchanged(String),
    Skipped(String),
    Failed(String),
}

impl StepOutcome {
    fn from_result(result: Result<StepOutcome>) -> Self {
        result.unwrap_or_else(|e| StepOutcome::Failed(format!("{:#}", e)))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, StepOutcome::Failed(_))
    }
}

/// One line of the install/uninstall report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub step: &'static str,
    pub outcome: StepOutcome,
}

/// Files and command the installer works on.
#[derive(Debug, Clone)]
pub struct Targets {
    pub settings: SettingsStore,
    pub usage_file: PathBuf,
    /// Absolute path of the status line command.
    pub exe: String,
}

impl Targets {
    /// User-scoped paths and the running executable.
    pub fn user(config: &Config) -> Result<Self> {
        let exe = std::env::current_exe().context("Failed to locate current executable")?;
        let exe = fs::canonicalize(&exe).unwrap_or(exe);
        Ok(Self {
            settings: SettingsStore::user()?,
            usage_file: config
                .usage_file()
                .context("Could not determine home directory")?,
            exe: exe.to_string_lossy().to_string(),
        })
    }
}

pub struct InstallOptions {
    /// Register the periodic refresh job.
    pub cron: bool,
    pub interval_minutes: u32,
}

pub struct UninstallOptions {
    pub keep_cache: bool,
}

/// Install everything. `crontab` is `Err` when the host has no cron.
pub fn install(
    targets: &Targets,
    crontab: std::result::Result<&dyn CronTable, CronUnavailable>,
    opts: &InstallOptions,
) -> Vec<StepReport> {
    let mut reports = Vec::new();

    run_step(&mut reports, "usage cache", || {
        ensure_cache(&targets.usage_file)
    });
    run_step(&mut reports, "statusLine", || {
        apply_status_line(&targets.settings, &targets.exe)
    });
    run_step(&mut reports, "cron", || {
        if !opts.cron {
            return Ok(StepOutcome::Skipped("disabled with --no-cron".to_string()));
        }
        match crontab {
            Ok(table) => register_cron(table, &targets.exe, opts.interval_minutes),
            Err(e) => Ok(StepOutcome::Skipped(format!(
                "{}; run `{} --update` manually to refresh usage",
                e, targets.exe
            ))),
        }
    });

    reports
}

/// Uninstall everything. `crontab` is `Err` when the host has no cron.
pub fn uninstall(
    targets: &Targets,
    crontab: std::result::Result<&dyn CronTable, CronUnavailable>,
    opts: &UninstallOptions,
) -> Vec<StepReport> {
    let mut reports = Vec::new();

    run_step(&mut reports, "statusLine", || {
        remove_status_line(&targets.settings)
    });
    run_step(&mut reports, "cron", || match crontab {
        Ok(table) => unregister_cron(table),
        Err(e) => Ok(StepOutcome::Skipped(e.to_string())),
    });
    run_step(&mut reports, "usage cache", || {
        if opts.keep_cache {
            return Ok(StepOutcome::Skipped("kept with --keep-cache".to_string()));
        }
        remove_cache(&targets.usage_file)
    });

    reports
}

fn run_step<F>(reports: &mut Vec<StepReport>, step: &'static str, f: F)
where
    F: FnOnce() -> Result<StepOutcome>,
{
    let outcome = StepOutcome::from_result(f());
    if let StepOutcome::Failed(msg) = &outcome {
        tracing::warn!("{} step failed: {}", step, msg);
    }
    print_step(step, &outcome);
    reports.push(StepReport { step, outcome });
}

fn print_step(step: &str, outcome: &StepOutcome) {
    match outcome {
        StepOutcome::Changed(msg) => println!("  {} {}: {}", "✓".green(), step, msg),
        StepOutcome::Unchanged(msg) => println!("  {} {}: {}", "✓".dim(), step, msg),
        StepOutcome::Skipped(msg) => println!("  {} {}: skipped ({})", "-".yellow(), step, msg),
        StepOutcome::Failed(msg) => println!("  {} {}: {}", "✗".red(), step, msg),
    }
}

fn ensure_cache(path: &std::path::Path) -> Result<StepOutcome> {
    if UsageCache::ensure_exists(path)? {
        Ok(StepOutcome::Changed(format!("created {}", path.display())))
    } else {
        Ok(StepOutcome::Unchanged(format!("{} exists", path.display())))
    }
}

fn apply_status_line(store: &SettingsStore, exe: &str) -> Result<StepOutcome> {
    let existing = store.load()?;
    let previous = existing
        .as_ref()
        .and_then(settings::status_line_command)
        .map(|s| s.to_string());

    let updated = settings::apply(existing.clone(), exe);
    if existing.as_ref() == Some(&updated) {
        return Ok(StepOutcome::Unchanged(format!(
            "already runs {} ({})",
            exe,
            store.path().display()
        )));
    }

    let report = store.write(&updated)?;

    let command = crate::shell::quote(exe);
    let mut msg = format!("command = {} ({})", command, store.path().display());
    if let Some(previous) = previous.filter(|p| *p != command) {
        msg.push_str(&format!("; replaced {}", previous));
    }
    if let Some(backup) = report.backup {
        msg.push_str(&format!("; backup at {}", backup.display()));
    }
    Ok(StepOutcome::Changed(msg))
}

fn remove_status_line(store: &SettingsStore) -> Result<StepOutcome> {
    let Some(existing) = store.load()? else {
        return Ok(StepOutcome::Unchanged(format!(
            "{} not found",
            store.path().display()
        )));
    };

    if !existing.contains_key(settings::STATUS_LINE_KEY) {
        return Ok(StepOutcome::Unchanged("not configured".to_string()));
    }

    let report = store.write(&settings::remove(Some(existing)))?;

    let mut msg = format!("removed from {}", store.path().display());
    if let Some(backup) = report.backup {
        msg.push_str(&format!("; backup at {}", backup.display()));
    }
    Ok(StepOutcome::Changed(msg))
}

fn register_cron(table: &dyn CronTable, exe: &str, interval_minutes: u32) -> Result<StepOutcome> {
    let lines = table.read()?;
    if cron::is_registered(&lines, cron::UNIQUE_MATCH) {
        return Ok(StepOutcome::Unchanged("already registered".to_string()));
    }

    let schedule = cron::schedule_line(exe, interval_minutes);
    let updated = cron::register(&lines, cron::MARKER_COMMENT, &schedule, cron::UNIQUE_MATCH);
    table.write(&updated)?;

    Ok(StepOutcome::Changed(format!(
        "refreshing every {} minutes",
        interval_minutes
    )))
}

fn unregister_cron(table: &dyn CronTable) -> Result<StepOutcome> {
    let lines = table.read()?;
    let updated = cron::unregister(&lines, cron::UNIQUE_MATCH);
    if updated == lines {
        return Ok(StepOutcome::Unchanged("not registered".to_string()));
    }

    table.write(&updated)?;
    Ok(StepOutcome::Changed(format!(
        "removed {} line(s)",
        lines.len() - updated.len()
    )))
}

fn remove_cache(path: &std::path::Path) -> Result<StepOutcome> {
    match fs::remove_file(path) {
        Ok(()) => Ok(StepOutcome::Changed(format!("removed {}", path.display()))),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(StepOutcome::Unchanged(format!(
            "{} not found",
            path.display()
        ))),
        Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
    }
}
