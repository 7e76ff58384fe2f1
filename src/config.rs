use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

const DEFAULT_UPDATE_INTERVAL_MINUTES: u32 = 15;
const DEFAULT_FETCH_WAIT_SECS: u64 = 8;

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Command and arguments used to launch Claude Code for `/usage`.
    /// Default: auto-detected `claude`
    /// Example: ["npx", "claude"]
    pub claude_command: Option<Vec<String>>,

    /// Minutes between cron refreshes. Default: 15
    pub update_interval_minutes: Option<u32>,

    /// Seconds to wait for `/usage` to render. Default: 8
    pub fetch_wait_secs: Option<u64>,

    /// Usage cache location. Default: ~/.claude-usage.json
    pub usage_file: Option<PathBuf>,
}

impl Config {
    /// Load configuration from ~/.config/claude-statusbar/config.toml
    ///
    /// - File missing: returns default config (Ok)
    /// - File exists but invalid TOML: returns Err so caller can show warning
    /// - Field missing: uses the built-in default
    pub fn load() -> Result<Self> {
        let path = match Self::config_path() {
            Some(p) => p,
            None => return Ok(Self::default()),
        };

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load, falling back to defaults with a warning on error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!("{:#}; using defaults", e);
            Self::default()
        })
    }

    /// Returns (program, args) when a launch command is configured.
    /// - None, empty array or blank program → None (auto-detect)
    /// - ["prog", "arg1", ...] → ("prog", ["arg1", ...])
    pub fn claude_program_and_args(&self) -> Option<(&str, &[String])> {
        match &self.claude_command {
            Some(cmd) if !cmd.is_empty() && !cmd[0].trim().is_empty() => {
                Some((&cmd[0], &cmd[1..]))
            }
            _ => None,
        }
    }

    /// Cron cadence, clamped so `*/N` stays a valid minute step.
    pub fn update_interval_minutes(&self) -> u32 {
        self.update_interval_minutes
            .unwrap_or(DEFAULT_UPDATE_INTERVAL_MINUTES)
            .clamp(1, 59)
    }

    pub fn fetch_wait_secs(&self) -> u64 {
        self.fetch_wait_secs.unwrap_or(DEFAULT_FETCH_WAIT_SECS)
    }

    /// Configured cache path, or ~/.claude-usage.json.
    pub fn usage_file(&self) -> Option<PathBuf> {
        self.usage_file
            .clone()
            .or_else(crate::usage::default_usage_file_path)
    }

    fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|d| {
            d.join(".config")
                .join("claude-statusbar")
                .join("config.toml")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.claude_program_and_args().is_none());
        assert_eq!(config.update_interval_minutes(), 15);
        assert_eq!(config.fetch_wait_secs(), 8);
        assert!(config
            .usage_file()
            .unwrap()
            .ends_with(".claude-usage.json"));
    }

    #[test]
    fn test_load_valid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, r#"claude_command = ["npx", "claude"]"#).unwrap();
        writeln!(file, "update_interval_minutes = 5").unwrap();
        writeln!(file, "fetch_wait_secs = 12").unwrap();
        writeln!(file, r#"usage_file = "/tmp/usage.json""#).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let config: Config = toml::from_str(&content).unwrap();
        let (prog, args) = config.claude_program_and_args().unwrap();
        assert_eq!(prog, "npx");
        assert_eq!(args, &["claude".to_string()]);
        assert_eq!(config.update_interval_minutes(), 5);
        assert_eq!(config.fetch_wait_secs(), 12);
        assert_eq!(config.usage_file(), Some(PathBuf::from("/tmp/usage.json")));
    }

    #[test]
    fn test_load_invalid_toml() {
        let invalid = "claude_command = [[[invalid";
        let result: std::result::Result<Config, _> = toml::from_str(invalid);
        assert!(result.is_err());
    }

    #[test]
    fn test_load_toml_missing_field() {
        let content = "# empty config\n";
        let config: Config = toml::from_str(content).unwrap();
        assert!(config.claude_program_and_args().is_none());
        assert_eq!(config.update_interval_minutes(), 15);
    }

    #[test]
    fn test_claude_program_empty_array() {
        let config = Config {
            claude_command: Some(vec![]),
            ..Default::default()
        };
        assert!(config.claude_program_and_args().is_none());
    }

    #[test]
    fn test_claude_program_whitespace_only() {
        let config = Config {
            claude_command: Some(vec!["  ".to_string()]),
            ..Default::default()
        };
        assert!(config.claude_program_and_args().is_none());
    }

    #[test]
    fn test_update_interval_is_clamped() {
        let zero = Config {
            update_interval_minutes: Some(0),
            ..Default::default()
        };
        let huge = Config {
            update_interval_minutes: Some(120),
            ..Default::default()
        };
        assert_eq!(zero.update_interval_minutes(), 1);
        assert_eq!(huge.update_interval_minutes(), 59);
    }
}
