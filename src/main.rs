use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use crossterm::style::Stylize;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use claude_statusbar::cli::{
    install, uninstall, ClaudeCli, InstallOptions, StepReport, Targets, UninstallOptions,
};
use claude_statusbar::config::Config;
use claude_statusbar::cron::{CronTable, CronUnavailable, SystemCrontab};
use claude_statusbar::statusbar::{StatusJson, StatusLine};
use claude_statusbar::transcript::detect_model;
use claude_statusbar::usage::{fetch_usage, UsageCache};

#[derive(Parser)]
#[command(name = "claude-statusbar")]
#[command(version)]
#[command(about = "Claude subscription usage in your Claude Code status line")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Print without ANSI colors
    #[arg(long)]
    no_color: bool,

    /// Print the status as JSON
    #[arg(long)]
    json: bool,

    /// Fetch fresh usage from `claude /usage` and update the cache
    #[arg(long)]
    update: bool,

    /// Enable debug logging (stderr)
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure the status line, usage cache and refresh job
    Install {
        /// Do not register the periodic refresh job
        #[arg(long)]
        no_cron: bool,
    },
    /// Remove everything `install` set up
    Uninstall {
        /// Leave the usage cache file in place
        #[arg(long)]
        keep_cache: bool,
    },
}

fn setup_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("claude_statusbar=debug")
    } else {
        EnvFilter::new("claude_statusbar=warn")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let config = Config::load_or_default();

    match cli.command {
        Some(Commands::Install { no_cron }) => run_install(&config, no_cron),
        Some(Commands::Uninstall { keep_cache }) => run_uninstall(&config, keep_cache),
        None if cli.update => run_update(&config),
        None => run_status(&config, cli.json, !cli.no_color),
    }
}

fn usage_file(config: &Config) -> Result<std::path::PathBuf> {
    config
        .usage_file()
        .context("Could not determine home directory")
}

fn run_status(config: &Config, json: bool, use_color: bool) -> Result<()> {
    let cache = UsageCache::load(&usage_file(config)?);
    let model = detect_model();

    if json {
        let status = StatusJson::new(&cache, &model);
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        let now = Local::now().naive_local();
        println!("{}", StatusLine::new(&cache, &model, now).render(use_color));
    }

    Ok(())
}

fn run_update(config: &Config) -> Result<()> {
    let claude = ClaudeCli::locate(config)
        .context("Claude not found. Install Claude Code first.")?;
    tracing::debug!("Fetching usage with {}", claude.display());

    let wait = Duration::from_secs(config.fetch_wait_secs());
    let (reading, raw) = fetch_usage(&claude, wait)?;
    if reading.is_empty() {
        anyhow::bail!("Could not parse usage data. Raw output:\n{}", raw);
    }

    let path = usage_file(config)?;
    let mut cache = UsageCache::load(&path);
    cache.merge(&reading, Local::now().naive_local());
    cache.save(&path)?;

    println!("Updated {}:", path.display());
    println!("{}", serde_json::to_string_pretty(&cache)?);

    Ok(())
}

fn run_install(config: &Config, no_cron: bool) -> Result<()> {
    let targets = Targets::user(config)?;
    let system = SystemCrontab::detect();

    println!("Installing claude-statusbar...\n");

    let opts = InstallOptions {
        cron: !no_cron,
        interval_minutes: config.update_interval_minutes(),
    };
    let reports = install(&targets, crontab(&system), &opts);

    match ClaudeCli::locate(config) {
        Some(claude) => tracing::debug!("Found Claude at {}", claude.display()),
        None => println!(
            "\n{} `claude` not found; usage will stay empty until Claude Code is installed",
            "Warning:".yellow()
        ),
    }

    print_summary(&reports, "installed");
    println!("Restart Claude Code to see the status line.");
    Ok(())
}

fn run_uninstall(config: &Config, keep_cache: bool) -> Result<()> {
    let targets = Targets::user(config)?;
    let system = SystemCrontab::detect();

    println!("Uninstalling claude-statusbar...\n");

    let reports = uninstall(&targets, crontab(&system), &UninstallOptions { keep_cache });

    print_summary(&reports, "uninstalled");
    Ok(())
}

fn crontab(
    system: &std::result::Result<SystemCrontab, CronUnavailable>,
) -> std::result::Result<&dyn CronTable, CronUnavailable> {
    match system {
        Ok(table) => Ok(table),
        Err(e) => Err(*e),
    }
}

fn print_summary(reports: &[StepReport], verb: &str) {
    let failed = reports.iter().filter(|r| r.outcome.is_failed()).count();
    if failed == 0 {
        println!("\n{} claude-statusbar {}", "✓".green(), verb);
    } else {
        println!(
            "\n{} claude-statusbar {} with {} failed step(s); see above",
            "!".yellow(),
            verb,
            failed
        );
    }
}
