//! Application configuration management.
//!
//! This module handles loading and saving the application configuration:
//! the API base URL, request timeout, session backend and last used username.
//!
//! Configuration is stored at `~/.config/vaxsched/config.json`; the session
//! file and logs live under the platform data directory.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Application name used for config/data directory paths
const APP_NAME: &str = "vaxsched";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Default service address, matching the service's development server.
pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000";

/// HTTP request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Smallest timeout honoured; lower values (including 0) are raised to it.
pub const MIN_REQUEST_TIMEOUT_SECS: u64 = 1;

/// Environment variable overriding `api_base_url`
pub const ENV_API_URL: &str = "VAXSCHED_API_URL";

/// Where the session token is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    #[default]
    File,
    Keyring,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub session_backend: SessionBackend,
    pub last_username: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            session_backend: SessionBackend::default(),
            last_username: None,
        }
    }
}

impl Config {
    /// Load the config from its default location, then apply env overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        } else {
            debug!(path = %path.display(), "No config file, using defaults");
            Ok(Self::default())
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Request timeout for the HTTP client, never shorter than
    /// `MIN_REQUEST_TIMEOUT_SECS`.
    pub fn request_timeout(&self) -> Duration {
        if self.request_timeout_secs < MIN_REQUEST_TIMEOUT_SECS {
            warn!(
                configured = self.request_timeout_secs,
                "request_timeout_secs too small, using minimum"
            );
        }
        Duration::from_secs(self.request_timeout_secs.max(MIN_REQUEST_TIMEOUT_SECS))
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(ENV_API_URL) {
            if !url.trim().is_empty() {
                self.api_base_url = url.trim().to_string();
            }
        }
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory holding the session file and logs.
    pub fn data_dir(&self) -> Result<PathBuf> {
        let data_dir = dirs::data_local_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }
}
