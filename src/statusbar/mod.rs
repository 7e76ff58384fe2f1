//! Status line rendering.
//!
//! Output format:
//! ```text
//! 🤖Op+T | 📊16% ⏱️2h30m | 📆13% ⏱️5d21h
//! ```
//! - `Op+T`: model (Opus) with extended thinking
//! - `📊16% ⏱️2h30m`: session usage and time until it resets
//! - `📆13% ⏱️5d21h`: weekly usage and time until it resets

mod time;

pub use time::{next_hour, parse_timestamp, time_until};

use chrono::NaiveDateTime;
use crossterm::style::{Color, StyledContent, Stylize};
use serde::Serialize;
use serde_json::Number;

use crate::transcript::ModelUsage;
use crate::usage::UsageCache;

/// Short model label: `Op`, `So`, `Ha` (or `?`), plus `+T` with thinking.
pub fn format_model(model: Option<&str>, has_thinking: bool) -> String {
    let Some(model) = model else {
        return "?".to_string();
    };

    let lower = model.to_lowercase();
    let name = if lower.contains("opus") {
        "Op"
    } else if lower.contains("sonnet") {
        "So"
    } else if lower.contains("haiku") {
        "Ha"
    } else {
        "?"
    };

    if has_thinking {
        format!("{}+T", name)
    } else {
        name.to_string()
    }
}

/// Color for a usage percentage; `None` when unknown (rendered dim).
pub fn usage_color(percent: Option<f64>) -> Option<Color> {
    let pct = percent?;
    Some(if pct >= 80.0 {
        Color::DarkRed
    } else if pct >= 50.0 {
        Color::DarkYellow
    } else {
        Color::DarkGreen
    })
}

fn format_percent(percent: Option<f64>) -> String {
    match percent {
        Some(pct) => format!("{}%", pct),
        None => "?%".to_string(),
    }
}

fn paint(text: String, percent: Option<f64>) -> StyledContent<String> {
    match usage_color(percent) {
        Some(color) => text.with(color),
        None => text.dim(),
    }
}

/// Everything shown on the status line, resolved against one `now`.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusLine {
    pub model: String,
    pub session_percent: Option<f64>,
    pub session_reset: String,
    pub week_percent: Option<f64>,
    pub week_reset: String,
}

impl StatusLine {
    pub fn new(cache: &UsageCache, model: &ModelUsage, now: NaiveDateTime) -> Self {
        Self {
            model: format_model(model.model.as_deref(), model.has_thinking),
            session_percent: cache.session_percent.as_ref().and_then(Number::as_f64),
            session_reset: time_until(session_reset_target(cache, now), now),
            week_percent: cache.week_percent.as_ref().and_then(Number::as_f64),
            week_reset: time_until(
                cache.week_reset.as_deref().and_then(parse_timestamp),
                now,
            ),
        }
    }

    pub fn render(&self, use_color: bool) -> String {
        let session = format!("📊{}", format_percent(self.session_percent));
        let week = format!("📆{}", format_percent(self.week_percent));

        if !use_color {
            return format!(
                "🤖{} | {} ⏱️{} | {} ⏱️{}",
                self.model, session, self.session_reset, week, self.week_reset
            );
        }

        format!(
            "{} | {} ⏱️{} | {} ⏱️{}",
            format!("🤖{}", self.model).with(Color::DarkCyan),
            paint(session, self.session_percent),
            self.session_reset,
            paint(week, self.week_percent),
            self.week_reset
        )
    }
}

/// Session reset: the full timestamp when it is still ahead, otherwise the
/// next occurrence of the cached reset hour.
fn session_reset_target(cache: &UsageCache, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let stamped = cache.session_reset.as_deref().and_then(parse_timestamp);
    if let Some(ts) = stamped.filter(|ts| *ts > now) {
        return Some(ts);
    }
    cache
        .session_reset_hour
        .and_then(|hour| next_hour(hour, now))
        .or(stamped)
}

/// Machine-readable status (`--json`).
#[derive(Debug, Clone, Serialize)]
pub struct StatusJson {
    pub model: Option<String>,
    pub model_short: String,
    pub has_thinking: bool,
    pub session_percent: Option<Number>,
    pub session_reset_hour: Option<u32>,
    pub week_percent: Option<Number>,
    pub week_reset: Option<String>,
    pub last_updated: Option<String>,
}

impl StatusJson {
    pub fn new(cache: &UsageCache, model: &ModelUsage) -> Self {
        Self {
            model: model.model.clone(),
            model_short: format_model(model.model.as_deref(), model.has_thinking),
            has_thinking: model.has_thinking,
            session_percent: cache.session_percent.clone(),
            session_reset_hour: cache.session_reset_hour,
            week_percent: cache.week_percent.clone(),
            week_reset: cache.week_reset.clone(),
            last_updated: cache.last_updated.clone(),
        }
    }
}
