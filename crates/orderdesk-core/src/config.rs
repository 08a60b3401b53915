//! Application configuration management.
//!
//! Configuration is stored at `~/.config/orderdesk/config.json`. Missing
//! fields take their defaults, and a handful of `ORDERDESK_*` environment
//! variables override the file.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "orderdesk";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Where invalidation sends the user.
pub const DEFAULT_LOGIN_PATH: &str = "/auth/jwt/login";

/// Session Monitor cadence.
const DEFAULT_CHECK_INTERVAL_SECS: u64 = 30;

/// Delay before the invalidation redirect, so pending UI updates flush.
const DEFAULT_REDIRECT_GRACE_MS: u64 = 500;

/// HTTP request timeout in seconds.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not find {0} directory")]
    NoDirectory(&'static str),

    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CredentialBackend {
    #[default]
    File,
    Keyring,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub login_path: String,
    /// Backend endpoint that exchanges a username/password for a token
    pub login_endpoint: String,
    pub check_interval_secs: u64,
    pub redirect_grace_ms: u64,
    pub request_timeout_secs: u64,
    pub credential_backend: CredentialBackend,
    pub last_username: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080/api".to_string(),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            login_endpoint: "/auth/login".to_string(),
            check_interval_secs: DEFAULT_CHECK_INTERVAL_SECS,
            redirect_grace_ms: DEFAULT_REDIRECT_GRACE_MS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            credential_backend: CredentialBackend::default(),
            last_username: None,
        }
    }
}

impl Config {
    /// Load from the config directory, then apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            serde_json::from_str(&contents)?
        } else {
            Self::default()
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Apply `ORDERDESK_*` overrides. Unparseable numbers are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("ORDERDESK_API_BASE_URL") {
            self.api_base_url = url;
        }
        if let Some(secs) = parse_override(&lookup, "ORDERDESK_CHECK_INTERVAL_SECS") {
            self.check_interval_secs = secs;
        }
        if let Some(ms) = parse_override(&lookup, "ORDERDESK_REDIRECT_GRACE_MS") {
            self.redirect_grace_ms = ms;
        }
    }

    pub fn check_interval(&self) -> Duration {
        // A zero period would spin
        Duration::from_secs(self.check_interval_secs.max(1))
    }

    pub fn redirect_grace(&self) -> Duration {
        Duration::from_millis(self.redirect_grace_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    fn config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoDirectory("config"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory holding the durable credential file.
    pub fn cache_dir(&self) -> Result<PathBuf, ConfigError> {
        let cache_dir = dirs::cache_dir().ok_or(ConfigError::NoDirectory("cache"))?;
        Ok(cache_dir.join(APP_NAME))
    }
}

fn parse_override(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<u64> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "Ignoring non-numeric override");
            None
        }
    }
}
