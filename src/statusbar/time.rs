//! Countdown formatting for reset times.

use chrono::{DateTime, Duration, NaiveDateTime, NaiveTime};

/// Parse a cached timestamp. Accepts naive ISO-8601 (with `T` or space,
/// optional fractional seconds) and RFC 3339 with an offset or `Z`; offsets
/// are dropped and the wall-clock time kept.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(ts);
        }
    }
    DateTime::parse_from_rfc3339(s).ok().map(|d| d.naive_local())
}

/// Next time the wall clock reads `hour:00`. If that is now or already past
/// today, it is tomorrow.
pub fn next_hour(hour: u32, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let target = now.date().and_time(NaiveTime::from_hms_opt(hour, 0, 0)?);
    if now >= target {
        Some(target + Duration::days(1))
    } else {
        Some(target)
    }
}

/// Human-readable time until `target`: `5d21h`, `2h30m`, `45m`, `now`, or
/// `?` when unknown.
pub fn time_until(target: Option<NaiveDateTime>, now: NaiveDateTime) -> String {
    let Some(target) = target else {
        return "?".to_string();
    };
    if target <= now {
        return "now".to_string();
    }

    let total_minutes = (target - now).num_minutes();
    let total_hours = total_minutes / 60;
    let days = total_hours / 24;

    if days > 0 {
        format!("{}d{}h", days, total_hours % 24)
    } else if total_hours > 0 {
        format!("{}h{:02}m", total_hours, total_minutes % 60)
    } else {
        format!("{}m", total_minutes)
    }
}
