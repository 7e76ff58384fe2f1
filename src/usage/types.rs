//! Usage data parsed from Claude Code `/usage` output.

use chrono::NaiveDateTime;

/// Values extracted from one `/usage` capture. Missing fields were not found
/// in the output and must not overwrite cached values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UsageReading {
    /// "Current session" percentage (0-100)
    pub session_percent: Option<u8>,
    /// Next session reset, local time
    pub session_reset: Option<NaiveDateTime>,
    /// Hour (0-23) of the session reset
    pub session_reset_hour: Option<u32>,
    /// "Current week (all models)" percentage (0-100)
    pub week_percent: Option<u8>,
    /// Next weekly reset, local time
    pub week_reset: Option<NaiveDateTime>,
}

impl UsageReading {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}
