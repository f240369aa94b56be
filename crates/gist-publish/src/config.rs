//! Configuration file loading and parsing.
//!
//! Settings live in an optional TOML file. If no config file exists, every
//! setting falls back to a sensible default.
//!
//! ```toml
//! [publish]
//! public = false
//! timestamp_prefix = true
//! commit_message = "Add images"
//!
//! [push]
//! max_attempts = 3
//! retry_delay_ms = 2000
//!
//! [hosting]
//! raw_base_url = "https://gist.githubusercontent.com"
//! pin_revision = true
//!
//! [tools]
//! gh = "gh"
//! git = "git"
//! timeout_seconds = 300
//! ```

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming an alternative config file.
pub const CONFIG_ENV: &str = "GIST_PUBLISH_CONFIG";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PublishConfig {
    /// Gist creation defaults (optional).
    pub publish: Option<PublishSection>,
    /// Push retry behavior (optional).
    pub push: Option<PushConfig>,
    /// Hosted URL construction (optional).
    pub hosting: Option<HostingConfig>,
    /// External program locations (optional).
    pub tools: Option<ToolsConfig>,
}

/// Gist creation defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PublishSection {
    /// Create public gists unless told otherwise (default: false).
    pub public: Option<bool>,
    /// Prefix the markdown filename with a UTC timestamp (default: true).
    pub timestamp_prefix: Option<bool>,
    /// Commit message for the image commit (default: "Add images").
    pub commit_message: Option<String>,
}

/// Push retry configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PushConfig {
    /// Total push attempts including the first (default: 3).
    pub max_attempts: Option<u32>,
    /// Fixed delay between attempts in milliseconds (default: 2000).
    pub retry_delay_ms: Option<u64>,
}

/// Hosted URL configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HostingConfig {
    /// Base of raw file URLs (default: "https://gist.githubusercontent.com").
    pub raw_base_url: Option<String>,
    /// Include the pushed revision in image URLs (default: true).
    pub pin_revision: Option<bool>,
}

/// External program configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolsConfig {
    /// GitHub CLI program (default: "gh").
    pub gh: Option<String>,
    /// Git program (default: "git").
    pub git: Option<String>,
    /// Per-command timeout in seconds (default: 300).
    pub timeout_seconds: Option<u64>,
}

impl PublishConfig {
    pub fn public(&self) -> bool {
        self.publish.as_ref().and_then(|p| p.public).unwrap_or(false)
    }

    pub fn timestamp_prefix(&self) -> bool {
        self.publish
            .as_ref()
            .and_then(|p| p.timestamp_prefix)
            .unwrap_or(true)
    }

    pub fn commit_message(&self) -> String {
        self.publish
            .as_ref()
            .and_then(|p| p.commit_message.clone())
            .unwrap_or_else(|| "Add images".to_string())
    }

    pub fn max_attempts(&self) -> u32 {
        self.push
            .as_ref()
            .and_then(|p| p.max_attempts)
            .unwrap_or(3)
            .max(1)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(
            self.push
                .as_ref()
                .and_then(|p| p.retry_delay_ms)
                .unwrap_or(2000),
        )
    }

    pub fn raw_base_url(&self) -> String {
        self.hosting
            .as_ref()
            .and_then(|h| h.raw_base_url.clone())
            .unwrap_or_else(|| "https://gist.githubusercontent.com".to_string())
            .trim_end_matches('/')
            .to_string()
    }

    pub fn pin_revision(&self) -> bool {
        self.hosting
            .as_ref()
            .and_then(|h| h.pin_revision)
            .unwrap_or(true)
    }

    pub fn gh_program(&self) -> String {
        self.tools
            .as_ref()
            .and_then(|t| t.gh.clone())
            .unwrap_or_else(|| "gh".to_string())
    }

    pub fn git_program(&self) -> String {
        self.tools
            .as_ref()
            .and_then(|t| t.git.clone())
            .unwrap_or_else(|| "git".to_string())
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(
            self.tools
                .as_ref()
                .and_then(|t| t.timeout_seconds)
                .unwrap_or(300),
        )
    }

    /// Load configuration from a file if it exists.
    ///
    /// Returns the default config if the file doesn't exist.
    /// Returns an error if the file exists but is malformed.
    pub fn load(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;

        let config: PublishConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        Ok(config)
    }

    /// Resolve and load the config file.
    ///
    /// Priority: explicit path > `GIST_PUBLISH_CONFIG` > user config dir.
    /// An explicit path must exist.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            if !path.exists() {
                bail!("Config file not found: {}", path.display());
            }
            return Self::load(path);
        }

        if let Ok(path) = env::var(CONFIG_ENV) {
            return Self::load(Path::new(&path));
        }

        match Self::default_path() {
            Ok(path) => Self::load(&path),
            // No config dir on this platform; run with defaults
            Err(_) => Ok(Self::default()),
        }
    }

    /// Default config location: `<config dir>/gist-publish/config.toml`.
    pub fn default_path() -> Result<PathBuf> {
        let config_dir =
            dirs::config_dir().ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("gist-publish").join("config.toml"))
    }
}
