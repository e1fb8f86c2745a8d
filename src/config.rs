//! Tool configuration loaded from `<root>/config.json`.
//!
//! Every field is optional. Values resolve in priority order: the config
//! file, then the matching environment variable, then the built-in default.
use crate::paths::BagPaths;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;

/// Environment fallback for the remote location.
pub const REMOTE_ENV: &str = "BAG_REMOTE";
/// Environment fallback for the remote transfer command.
pub const REMOTE_COMMAND_ENV: &str = "BAG_REMOTE_COMMAND";
/// Transfer command used when nothing else is configured.
pub const DEFAULT_REMOTE_COMMAND: &str = "rclone";
/// Editor used when neither the config nor the environment names one.
pub const DEFAULT_EDITOR: &str = "vim";

/// On-disk shape of `config.json`.
#[derive(Debug, Default, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct BagConfig {
    /// Remote directory in the transfer tool's syntax, e.g. `gdrive:bag`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<String>,
    /// Transfer command line, split with shell-words.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_command: Option<String>,
    /// Editor command line, split with shell-words.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editor: Option<String>,
}

impl BagConfig {
    /// Load the config, treating a missing file as all defaults.
    pub fn load(paths: &BagPaths) -> Result<Self> {
        let path = paths.config_path();
        if !path.is_file() {
            return Ok(Self::default());
        }
        let bytes = fs::read(&path).with_context(|| format!("read config {}", path.display()))?;
        let config: BagConfig = serde_json::from_slice(&bytes)
            .with_context(|| format!("parse config JSON {}", path.display()))?;
        Ok(config)
    }

    /// Remote location, if syncing is configured at all.
    pub fn remote(&self) -> Option<String> {
        non_empty(self.remote.clone()).or_else(|| env_value(REMOTE_ENV))
    }

    /// Transfer command split into program and leading arguments.
    pub fn remote_command(&self) -> Result<Vec<String>> {
        let raw = non_empty(self.remote_command.clone())
            .or_else(|| env_value(REMOTE_COMMAND_ENV))
            .unwrap_or_else(|| DEFAULT_REMOTE_COMMAND.to_string());
        split_command(&raw)
    }

    /// Editor command split into program and leading arguments.
    pub fn editor_command(&self) -> Result<Vec<String>> {
        if let Some(raw) = non_empty(self.editor.clone()) {
            return split_command(&raw);
        }
        for var in ["VISUAL", "EDITOR"] {
            if let Some(raw) = env_value(var) {
                if let Ok(parts) = shell_words::split(&raw) {
                    if !parts.is_empty() {
                        return Ok(parts);
                    }
                }
            }
        }
        Ok(vec![DEFAULT_EDITOR.to_string()])
    }
}

fn split_command(raw: &str) -> Result<Vec<String>> {
    let parts = shell_words::split(raw).with_context(|| format!("parse command: {raw}"))?;
    match parts.first() {
        Some(program) if !program.trim().is_empty() => Ok(parts),
        _ => Err(anyhow!("command is empty: {raw:?}")),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

fn env_value(var: &str) -> Option<String> {
    non_empty(std::env::var(var).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_config_is_default() {
        let dir = TempDir::new().expect("tempdir");
        let paths = BagPaths::new(dir.path().to_path_buf());
        let config = BagConfig::load(&paths).expect("load");
        assert_eq!(config, BagConfig::default());
    }

    #[test]
    fn config_values_parse_and_split() {
        let dir = TempDir::new().expect("tempdir");
        let paths = BagPaths::new(dir.path().to_path_buf());
        fs::write(
            paths.config_path(),
            r#"{"remote": "gdrive:bag", "remote_command": "rclone --config '/etc/my rclone.conf'", "editor": "nano -w"}"#,
        )
        .expect("write config");

        let config = BagConfig::load(&paths).expect("load");
        assert_eq!(config.remote(), Some("gdrive:bag".to_string()));
        assert_eq!(
            config.remote_command().expect("remote command"),
            vec!["rclone", "--config", "/etc/my rclone.conf"]
        );
        assert_eq!(config.editor_command().expect("editor"), vec!["nano", "-w"]);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let dir = TempDir::new().expect("tempdir");
        let paths = BagPaths::new(dir.path().to_path_buf());
        fs::write(paths.config_path(), r#"{"remtoe": "typo:bag"}"#).expect("write config");
        assert!(BagConfig::load(&paths).is_err());
    }

    #[test]
    fn empty_command_is_an_error() {
        let config = BagConfig {
            remote_command: Some("''".to_string()),
            ..BagConfig::default()
        };
        assert!(config.remote_command().is_err());
        assert!(split_command("   ").is_err());
        assert!(split_command("'' --verbose").is_err());
        assert_eq!(split_command("'my editor' -w").expect("split"), vec!["my editor", "-w"]);
    }
}
