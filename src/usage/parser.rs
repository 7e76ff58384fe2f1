//! Parse Claude Code `/usage` output captured from a PTY.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::types::UsageReading;

static SESSION_PERCENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)Current session\s+[█░▓▏▎▍▌▋▊▉\s]*(\d{1,3})%\s*used").unwrap()
});
static SESSION_RESET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?si)Current session.*?Resets?\s+(\d{1,2})(?::(\d{2}))?\s*(am|pm)").unwrap()
});
static WEEK_PERCENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)Current week \(all models\)\s+[█░▓▏▎▍▌▋▊▉\s]*(\d{1,3})%\s*used").unwrap()
});
static WEEK_RESET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?si)Current week.*?Resets?\s+([a-z]{3,9})\s+(\d{1,2}),?\s*(\d{1,2})(?::(\d{2}))?\s*(am|pm)",
    )
    .unwrap()
});

/// Parse `/usage` text into a reading. Reset times are resolved against `now`
/// (local wall clock) to their next occurrence.
///
/// Expected format:
/// ```text
///   Current session
///   ████████████████████████████████████               72% used
///   Resets 1:59am (Asia/Tokyo)
///
///   Current week (all models)
///   ███████████▌                                       23% used
///   Resets Mar 3, 12am (Asia/Tokyo)
/// ```
pub fn parse_usage_output(text: &str, now: NaiveDateTime) -> UsageReading {
    let mut reading = UsageReading::default();

    if let Some(caps) = SESSION_PERCENT_RE.captures(text) {
        reading.session_percent = caps[1].parse().ok().filter(|p: &u8| *p <= 100);
    }

    if let Some(caps) = SESSION_RESET_RE.captures(text) {
        if let Some(time) = clock_time(&caps, 1, 2, 3) {
            let mut target = now.date().and_time(time);
            if target <= now {
                target += Duration::days(1);
            }
            reading.session_reset = Some(target);
            reading.session_reset_hour = Some(time.hour());
        }
    }

    if let Some(caps) = WEEK_PERCENT_RE.captures(text) {
        reading.week_percent = caps[1].parse().ok().filter(|p: &u8| *p <= 100);
    }

    if let Some(caps) = WEEK_RESET_RE.captures(text) {
        reading.week_reset = week_reset(&caps, now);
    }

    reading
}

fn week_reset(caps: &Captures, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let month = month_number(&caps[1])?;
    let day: u32 = caps[2].parse().ok()?;
    let time = clock_time(caps, 3, 4, 5)?;

    let this_year = NaiveDate::from_ymd_opt(now.year(), month, day)?.and_time(time);
    if this_year >= now {
        return Some(this_year);
    }
    Some(NaiveDate::from_ymd_opt(now.year() + 1, month, day)?.and_time(time))
}

/// Build a 24h time from `hour`, optional `minute` and `am`/`pm` groups.
fn clock_time(caps: &Captures, hour: usize, minute: usize, meridiem: usize) -> Option<NaiveTime> {
    let hour: u32 = caps.get(hour)?.as_str().parse().ok()?;
    let minute: u32 = match caps.get(minute) {
        Some(m) => m.as_str().parse().ok()?,
        None => 0,
    };
    if !(1..=12).contains(&hour) {
        return None;
    }

    let pm = caps.get(meridiem)?.as_str().eq_ignore_ascii_case("pm");
    let hour24 = match (pm, hour) {
        (false, 12) => 0,
        (true, 12) => 12,
        (true, h) => h + 12,
        (false, h) => h,
    };
    NaiveTime::from_hms_opt(hour24, minute, 0)
}

fn month_number(name: &str) -> Option<u32> {
    const MONTHS: [&str; 12] = [
        "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
    ];
    let prefix = name.get(..3)?.to_ascii_lowercase();
    MONTHS
        .iter()
        .position(|m| *m == prefix)
        .map(|i| i as u32 + 1)
}
