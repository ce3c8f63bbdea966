//! Coordinator settings
//!
//! Settings live in `<vault>/.vault-sync/config.toml`. Every key is
//! optional; a missing file is the same as an empty one.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use vault_fs::VaultPath;

/// Location of the settings file relative to the vault root.
pub const CONFIG_PATH: &str = ".vault-sync/config.toml";

/// Longest accepted automatic interval: one year, in minutes.
pub const MAX_INTERVAL_MINUTES: u64 = 365 * 24 * 60;

/// Settings consumed by the coordinator. Read-only once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Template for backup commit messages
    pub commit_message: String,
    /// `chrono` format string substituted for `{{date}}`
    pub commit_date_format: String,
    /// Minutes between automatic backups, 0 disables them
    #[serde(deserialize_with = "interval_minutes")]
    pub auto_backup_interval: u64,
    /// Minutes between automatic pulls, 0 disables them
    #[serde(deserialize_with = "interval_minutes")]
    pub auto_pull_interval: u64,
    pub pull_on_start: bool,
    pub disable_push: bool,
    pub pull_before_push: bool,
    /// Hide informational messages. Errors are always shown.
    pub disable_popups: bool,
    /// Use the in-process backend instead of the `git` executable
    pub standalone: bool,
    pub cli: CliSettings,
    pub in_process: InProcessSettings,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            commit_message: "vault backup: {{date}}".to_string(),
            commit_date_format: "%Y-%m-%d %H:%M:%S".to_string(),
            auto_backup_interval: 0,
            auto_pull_interval: 0,
            pull_on_start: false,
            disable_push: false,
            pull_before_push: true,
            disable_popups: false,
            standalone: false,
            cli: CliSettings::default(),
            in_process: InProcessSettings::default(),
        }
    }
}

/// Settings for the native `git` driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliSettings {
    pub git_path: String,
}

impl Default for CliSettings {
    fn default() -> Self {
        Self {
            git_path: "git".to_string(),
        }
    }
}

/// Settings for the in-process driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InProcessSettings {
    pub author_name: Option<String>,
    pub author_email: Option<String>,
    pub remote: String,
}

impl Default for InProcessSettings {
    fn default() -> Self {
        Self {
            author_name: None,
            author_email: None,
            remote: "origin".to_string(),
        }
    }
}

impl SyncSettings {
    /// Parse settings from TOML text. `origin` names the source in errors.
    pub fn parse(content: &str, origin: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|source| Error::Config {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Load settings from an explicit file. A missing file yields defaults.
    pub fn load_file(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::parse(&content, path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No settings file, using defaults");
                Ok(Self::default())
            }
            Err(source) => Err(Error::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Load the settings stored inside a vault.
    pub fn load(vault_root: &Path) -> Result<Self> {
        Self::load_file(&Self::path_in(vault_root))
    }

    pub fn path_in(vault_root: &Path) -> PathBuf {
        vault_root.join(CONFIG_PATH)
    }

    pub fn auto_backup_period(&self) -> Option<Duration> {
        minutes(self.auto_backup_interval)
    }

    pub fn auto_pull_period(&self) -> Option<Duration> {
        minutes(self.auto_pull_interval)
    }

    /// Render the commit message template for the given changed files.
    pub fn format_commit_message<Tz>(&self, changed: &[VaultPath], now: &DateTime<Tz>) -> String
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        let mut message = self.commit_message.clone();
        if message.contains("{{date}}") {
            let date = now.format(&self.commit_date_format).to_string();
            message = message.replace("{{date}}", &date);
        }
        if message.contains("{{numFiles}}") {
            message = message.replace("{{numFiles}}", &changed.len().to_string());
        }
        if message.contains("{{files}}") {
            let files = changed
                .iter()
                .map(VaultPath::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            message = message.replace("{{files}}", &files);
        }
        message
    }
}

fn interval_minutes<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = u64::deserialize(deserializer)?;
    if value > MAX_INTERVAL_MINUTES {
        return Err(serde::de::Error::custom(format!(
            "interval of {value} minutes exceeds the maximum of {MAX_INTERVAL_MINUTES}"
        )));
    }
    Ok(value)
}

fn minutes(value: u64) -> Option<Duration> {
    let value = value.min(MAX_INTERVAL_MINUTES);
    (value > 0).then(|| Duration::from_secs(value * 60))
}
