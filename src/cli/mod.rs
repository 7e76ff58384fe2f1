mod install;

pub use install::{
    install, uninstall, InstallOptions, StepOutcome, StepReport, Targets, UninstallOptions,
};

use crate::config::Config;
use std::fs;
use std::path::{Path, PathBuf};

/// How to launch Claude Code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaudeCli {
    program: String,
    args: Vec<String>,
}

impl ClaudeCli {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Find a way to run `claude`.
    ///
    /// Search order:
    /// 1. `claude_command` from config
    /// 2. `claude` on PATH
    /// 3. Common install locations (npm global, ~/.local, nvm, /usr/local, /usr)
    /// 4. `npx claude`
    ///
    /// cron runs with a minimal PATH, so step 3 matters for `--update`.
    pub fn locate(config: &Config) -> Option<Self> {
        if let Some((program, args)) = config.claude_program_and_args() {
            return Some(Self::new(program, args.to_vec()));
        }

        if let Ok(path) = which::which("claude") {
            return Some(Self::from_path(&path));
        }

        let home = dirs::home_dir();
        if let Some(path) = first_existing(&candidate_paths(home.as_deref())) {
            return Some(Self::from_path(&path));
        }

        if which::which("npx").is_ok() {
            return Some(Self::new("npx", vec!["claude".to_string()]));
        }

        None
    }

    fn from_path(path: &Path) -> Self {
        Self::new(path.to_string_lossy(), Vec::new())
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Shell-style rendering for messages.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(|a| a.as_str()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Well-known `claude` locations, in preference order.
fn candidate_paths(home: Option<&Path>) -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Some(home) = home {
        paths.push(home.join(".npm-global").join("bin").join("claude"));
        paths.push(home.join(".local").join("bin").join("claude"));
        paths.push(home.join(".claude").join("local").join("claude"));

        let nvm_versions = home.join(".nvm").join("versions").join("node");
        if let Ok(entries) = fs::read_dir(&nvm_versions) {
            let mut versions: Vec<PathBuf> = entries.flatten().map(|e| e.path()).collect();
            // Newest node version first
            versions.sort();
            versions.reverse();
            for version in versions {
                paths.push(version.join("bin").join("claude"));
            }
        }
    }

    paths.push(PathBuf::from("/usr/local/bin/claude"));
    paths.push(PathBuf::from("/usr/bin/claude"));
    paths
}

fn first_existing(paths: &[PathBuf]) -> Option<PathBuf> {
    paths.iter().find(|p| p.is_file()).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locate_prefers_config() {
        let config = Config {
            claude_command: Some(vec!["my-claude".to_string(), "--profile".to_string()]),
            ..Default::default()
        };
        let cli = ClaudeCli::locate(&config).unwrap();
        assert_eq!(cli.program(), "my-claude");
        assert_eq!(cli.args(), &["--profile".to_string()]);
        assert_eq!(cli.display(), "my-claude --profile");
    }

    #[test]
    fn test_candidate_paths_order() {
        let home = Path::new("/home/test");
        let paths = candidate_paths(Some(home));
        assert_eq!(paths[0], home.join(".npm-global/bin/claude"));
        assert_eq!(paths[1], home.join(".local/bin/claude"));
        assert_eq!(paths.last().unwrap(), &PathBuf::from("/usr/bin/claude"));
    }

    #[test]
    fn test_candidate_paths_include_nvm_versions() {
        let dir = tempfile::tempdir().unwrap();
        let node = dir.path().join(".nvm/versions/node");
        fs::create_dir_all(node.join("v18.0.0/bin")).unwrap();
        fs::create_dir_all(node.join("v20.1.0/bin")).unwrap();

        let paths = candidate_paths(Some(dir.path()));
        let v20 = paths
            .iter()
            .position(|p| p.ends_with("v20.1.0/bin/claude"))
            .unwrap();
        let v18 = paths
            .iter()
            .position(|p| p.ends_with("v18.0.0/bin/claude"))
            .unwrap();
        assert!(v20 < v18);
    }

    #[test]
    fn test_first_existing() {
        let dir = tempfile::tempdir().unwrap();
        let local_bin = dir.path().join(".local/bin");
        fs::create_dir_all(&local_bin).unwrap();
        fs::write(local_bin.join("claude"), "#!/bin/sh\n").unwrap();

        let found = first_existing(&candidate_paths(Some(dir.path())));
        assert_eq!(found, Some(local_bin.join("claude")));
    }

    #[test]
    fn test_first_existing_none() {
        let dir = tempfile::tempdir().unwrap();
        let paths = vec![dir.path().join("nope"), dir.path().join("also-nope")];
        assert!(first_existing(&paths).is_none());
    }
}
