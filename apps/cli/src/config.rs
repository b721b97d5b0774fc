//! Command line configuration.
//!
//! Optional defaults are read from TOML:
//! - Linux/macOS: `~/.config/void-cloud/config.toml`
//! - Windows: `%APPDATA%/void-cloud/config.toml`
//!
//! A flag beats its environment variable (handled by clap), which beats the
//! file, which beats the built-in default.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Production platform endpoint.
pub const DEFAULT_SERVER: &str = "https://play.void.dev/";

/// Defaults read from the config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Platform endpoint URL.
    pub server: Option<String>,

    /// Organization ID used by `deploy`.
    pub org: Option<String>,

    /// Game ID used by `deploy`.
    pub game: Option<String>,
}

impl Config {
    /// Loads the config file; a missing file yields empty defaults.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&config_path())
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("invalid config file {}", path.display()))?;
        Ok(config)
    }

    /// The server to talk to, given the `--server` flag (or `SERVER`).
    pub fn server(&self, flag: Option<String>) -> String {
        pick(flag, self.server.as_deref()).unwrap_or_else(|| DEFAULT_SERVER.to_string())
    }

    pub fn org(&self, flag: Option<String>) -> String {
        pick(flag, self.org.as_deref()).unwrap_or_default()
    }

    pub fn game(&self, flag: Option<String>) -> String {
        pick(flag, self.game.as_deref()).unwrap_or_default()
    }
}

/// First non-empty value of the flag and the file entry.
fn pick(flag: Option<String>, file: Option<&str>) -> Option<String> {
    flag.filter(|v| !v.is_empty())
        .or_else(|| file.filter(|v| !v.is_empty()).map(str::to_string))
}

/// Returns the platform-specific configuration file path.
pub fn config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        PathBuf::from(appdata).join("void-cloud").join("config.toml")
    }

    #[cfg(not(target_os = "windows"))]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        PathBuf::from(home)
            .join(".config")
            .join("void-cloud")
            .join("config.toml")
    }
}
