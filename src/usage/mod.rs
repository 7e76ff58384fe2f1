//! Usage cache and the `--update` refresh path.
//!
//! `--update` runs `claude /usage` in a PTY, parses the panel, and merges the
//! result into `~/.claude-usage.json`. The status line only ever reads the
//! cache.

pub mod cache;
pub mod fetcher;
pub mod parser;
pub mod types;

pub use cache::{default_usage_file_path, UsageCache};
pub use fetcher::{fetch_usage, strip_ansi};
pub use parser::parse_usage_output;
pub use types::UsageReading;
