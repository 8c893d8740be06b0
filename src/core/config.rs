//! Application configuration management
//!
//! Handles loading and saving settings for the API transport:
//! - GitHub API base URL
//! - Repository storage location
//! - Network and credential helper timeouts

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::{GhApiError, Result};

/// Public GitHub API endpoint
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Cache subdirectory used when no repository storage is configured
const REPO_STORAGE_DIR: &str = "git_repos";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Base URL every API path is resolved against
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Location of the storage path for git repositories
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_storage: Option<PathBuf>,

    /// Timeout for a single HTTP request in seconds
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    /// Timeout for a single credential helper run in seconds
    #[serde(default = "default_helper_timeout")]
    pub credential_helper_timeout_secs: u64,

    /// User-Agent sent with every request (GitHub rejects requests without one)
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_http_timeout() -> u64 {
    30
}

fn default_helper_timeout() -> u64 {
    10
}

fn default_user_agent() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            repo_storage: None,
            http_timeout_secs: default_http_timeout(),
            credential_helper_timeout_secs: default_helper_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl Config {
    /// Load configuration from file, or create default if not exists
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let contents = fs::read_to_string(&config_path)?;
            let config: Config = toml::from_str(&contents)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(&config_path, contents)?;

        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    /// Get the configuration directory
    pub fn config_dir() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().to_path_buf())
    }

    /// Repository storage location: the configured path, or `git_repos`
    /// under the user cache directory
    pub fn repo_storage(&self) -> Result<PathBuf> {
        match &self.repo_storage {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::project_dirs()?.cache_dir().join(REPO_STORAGE_DIR)),
        }
    }

    /// HTTP request timeout
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Credential helper timeout
    pub fn credential_helper_timeout(&self) -> Duration {
        Duration::from_secs(self.credential_helper_timeout_secs)
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("com", "gh-api-transport", "gh-api-transport")
            .ok_or_else(|| GhApiError::Config("Could not determine config directory".into()))
    }
}
