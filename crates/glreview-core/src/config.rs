//! Configuration management for glreview.
//!
//! Non-secret settings live in a TOML file stored in a platform-specific
//! location:
//!
//! - **macOS/Linux**: `~/.config/glreview/config.toml`
//! - **Windows**: `%APPDATA%\glreview\config.toml`
//!
//! The access token is only ever read from `GITLAB_TOKEN`. The environment
//! also overrides the file for `GITLAB_PROJECT_ID` and `GITLAB_URL`.
//!
//! # Example
//!
//! ```ignore
//! use glreview_core::config::{Config, Settings};
//!
//! let config = Config::load()?;
//! let settings = Settings::from_env(&config)?;
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Config file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Config directory name.
const CONFIG_DIR_NAME: &str = "glreview";

/// Environment variable holding the GitLab access token.
pub const TOKEN_ENV: &str = "GITLAB_TOKEN";

/// Environment variable holding the project ID or path.
pub const PROJECT_ID_ENV: &str = "GITLAB_PROJECT_ID";

/// Environment variable overriding the GitLab instance URL.
pub const URL_ENV: &str = "GITLAB_URL";

/// Default GitLab instance URL.
pub const DEFAULT_GITLAB_URL: &str = "https://gitlab.com";

// =============================================================================
// Configuration structures
// =============================================================================

/// Contents of the config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub gitlab: GitLabConfig,
}

/// GitLab section of the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitLabConfig {
    /// GitLab instance URL
    #[serde(default = "default_gitlab_url")]
    pub url: String,
    /// Project ID (numeric or path)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
}

impl Default for GitLabConfig {
    fn default() -> Self {
        Self {
            url: default_gitlab_url(),
            project_id: None,
        }
    }
}

fn default_gitlab_url() -> String {
    DEFAULT_GITLAB_URL.to_string()
}

/// Fully resolved settings needed to talk to GitLab.
#[derive(Clone, PartialEq)]
pub struct Settings {
    pub token: String,
    pub project_id: String,
    pub base_url: String,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("token", &"<redacted>")
            .field("project_id", &self.project_id)
            .field("base_url", &self.base_url)
            .finish()
    }
}

// =============================================================================
// Config implementation
// =============================================================================

impl Config {
    /// Get the configuration directory path.
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join(CONFIG_DIR_NAME))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
    }

    /// Get the configuration file path.
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE_NAME))
    }

    /// Load configuration from the default location.
    ///
    /// Returns a default config if the file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    ///
    /// Returns a default config if the file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = ?path, "Config file does not exist, using defaults");
            return Ok(Self::default());
        }

        debug!(path = ?path, "Loading config");

        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config file: {}", e)))?;

        info!(path = ?path, "Config loaded successfully");
        Ok(config)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        self.save_to(&path)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("Failed to create config directory: {}", e)))?;
        }

        debug!(path = ?path, "Saving config");

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, contents)
            .map_err(|e| Error::Config(format!("Failed to write config file: {}", e)))?;

        info!(path = ?path, "Config saved successfully");
        Ok(())
    }

    /// Set a configuration value by key path.
    ///
    /// Key format: `gitlab.field` (e.g., `gitlab.url`, `gitlab.project_id`)
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match parse_key(key)? {
            "url" => self.gitlab.url = value.trim_end_matches('/').to_string(),
            "project_id" | "project" => self.gitlab.project_id = Some(value.to_string()),
            field => {
                return Err(Error::Config(format!(
                    "Unknown GitLab config field: {}",
                    field
                )))
            }
        }
        Ok(())
    }

    /// Get a configuration value by key path.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        match parse_key(key)? {
            "url" => Ok(Some(self.gitlab.url.clone())),
            "project_id" | "project" => Ok(self.gitlab.project_id.clone()),
            field => Err(Error::Config(format!(
                "Unknown GitLab config field: {}",
                field
            ))),
        }
    }
}

fn parse_key(key: &str) -> Result<&str> {
    match key.split('.').collect::<Vec<_>>().as_slice() {
        ["gitlab", field] => Ok(*field),
        [provider, _] => Err(Error::Config(format!("Unknown provider: {}", provider))),
        _ => Err(Error::Config(format!(
            "Invalid config key '{}'. Expected format: gitlab.field",
            key
        ))),
    }
}

// =============================================================================
// Settings resolution
// =============================================================================

impl Settings {
    /// Resolve settings from the process environment and a loaded config.
    pub fn from_env(config: &Config) -> Result<Self> {
        Self::resolve(config, |name| std::env::var(name).ok())
    }

    /// Resolve settings using `lookup` for environment variables.
    ///
    /// Empty values count as unset.
    pub fn resolve<F>(config: &Config, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.is_empty());

        let token = var(TOKEN_ENV).ok_or_else(|| missing(TOKEN_ENV))?;

        let project_id = var(PROJECT_ID_ENV)
            .or_else(|| config.gitlab.project_id.clone().filter(|v| !v.is_empty()))
            .ok_or_else(|| missing(PROJECT_ID_ENV))?;

        let base_url = var(URL_ENV)
            .unwrap_or_else(|| config.gitlab.url.clone())
            .trim_end_matches('/')
            .to_string();

        debug!(project_id = %project_id, base_url = %base_url, "Resolved settings");

        Ok(Self {
            token,
            project_id,
            base_url,
        })
    }
}

fn missing(name: &str) -> Error {
    Error::Config(format!("{} environment variable is not set", name))
}

// =============================================================================
// Tests
// =============================================================================
