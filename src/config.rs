//! Application configuration loader and serialization.
//!
//! This is the dashboard's own local configuration (backend URL, poll
//! cadence), not the server-side configuration domains edited in the
//! settings panel.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding the backend base URL.
pub const API_URL_ENV: &str = "ABUSEWATCH_API_URL";

fn default_base_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_poll_ms() -> u64 {
    1000
}

fn default_request_timeout_ms() -> u64 {
    5000
}

/// Local application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Backend base URL, e.g. "http://localhost:5000".
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Metrics snapshot poll interval in milliseconds.
    #[serde(default = "default_poll_ms")]
    pub stats_poll_ms: u64,

    /// Blocklist poll interval in milliseconds.
    #[serde(default = "default_poll_ms")]
    pub blocklist_poll_ms: u64,

    /// Per-request timeout in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            stats_poll_ms: default_poll_ms(),
            blocklist_poll_ms: default_poll_ms(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl AppConfig {
    pub fn stats_poll_interval(&self) -> Duration {
        Duration::from_millis(self.stats_poll_ms)
    }

    pub fn blocklist_poll_interval(&self) -> Duration {
        Duration::from_millis(self.blocklist_poll_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Get the global settings path: ~/.config/abusewatch/settings.json
pub fn get_global_settings_path() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or_else(|| {
        ConfigError::ValidationFailed("Cannot determine home directory".to_string())
    })?;

    let config_dir = home.join(".config/abusewatch");
    Ok(config_dir.join("settings.json"))
}

/// Load config from JSON file.
pub fn load_config_from_file(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ConfigError::FileNotFound(format!(
                "Configuration file not found at: {}",
                path.display()
            ))
        } else {
            ConfigError::IoError(e)
        }
    })?;

    let config: AppConfig = serde_json::from_str(&content).map_err(ConfigError::InvalidJson)?;
    Ok(config)
}

/// Save config to JSON file.
pub fn save_config_to_file(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(ConfigError::IoError)?;
        }
    }

    let json_content = serde_json::to_string_pretty(config).map_err(ConfigError::InvalidJson)?;
    fs::write(path, json_content).map_err(ConfigError::IoError)?;
    Ok(())
}

/// Resolve the effective configuration: on-disk settings (if present, else
/// defaults) with the base URL env override applied last.
pub fn load_effective_config() -> AppConfig {
    let mut config = get_global_settings_path()
        .and_then(|path| load_config_from_file(&path))
        .unwrap_or_else(|e| {
            log::info!("[Config] Using defaults ({})", e);
            AppConfig::default()
        });

    if let Ok(url) = std::env::var(API_URL_ENV) {
        if !url.trim().is_empty() {
            config.base_url = url.trim().trim_end_matches('/').to_string();
        }
    }

    config
}
