//! Global configuration for rulepack.
//!
//! The global configuration file (`~/.rulepack/config.toml`) holds user-wide
//! settings that tune how imports are fetched and cached. It is optional: a
//! missing file means every setting takes its default.
//!
//! # Configuration File Location
//!
//! - **Unix/macOS**: `~/.rulepack/config.toml`
//! - **Windows**: `%LOCALAPPDATA%\rulepack\config.toml`
//!
//! The location can be overridden using the `RULEPACK_CONFIG_PATH` environment variable.
//!
//! # File Format
//!
//! ```toml
//! [import]
//! cache_dir = "/var/cache/rulepack"   # default: ~/.rulepack/cache
//! expires_in_secs = 180               # cache freshness window
//! redirect_limit = 10                 # HTTP redirect hops followed
//! max_retries = 2                     # retries after the first attempt
//! retry_delay_ms = 1000               # pause between attempts
//! connect_timeout_secs = 30
//! request_timeout_secs = 60
//! ```
//!
//! Unknown keys are rejected so that typos do not silently fall back to defaults.
//!
//! # Examples
//!
//! ```rust,no_run
//! use rulepack_cli::config::GlobalConfig;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let mut config = GlobalConfig::load().await?;
//! config.import.expires_in_secs = 600;
//! config.save().await?;
//! # Ok(())
//! # }
//! ```

use crate::constants::{
    DEFAULT_EXPIRES_IN, DEFAULT_MAX_RETRIES, DEFAULT_REDIRECT_LIMIT, DEFAULT_RETRY_DELAY,
    HTTP_CONNECT_TIMEOUT, HTTP_REQUEST_TIMEOUT,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

const fn default_expires_in_secs() -> u64 {
    DEFAULT_EXPIRES_IN.as_secs()
}

const fn default_redirect_limit() -> usize {
    DEFAULT_REDIRECT_LIMIT
}

const fn default_max_retries() -> usize {
    DEFAULT_MAX_RETRIES
}

const fn default_retry_delay_ms() -> u64 {
    DEFAULT_RETRY_DELAY.as_millis() as u64
}

const fn default_connect_timeout_secs() -> u64 {
    HTTP_CONNECT_TIMEOUT.as_secs()
}

const fn default_request_timeout_secs() -> u64 {
    HTTP_REQUEST_TIMEOUT.as_secs()
}

/// Global configuration structure for rulepack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct GlobalConfig {
    /// Settings for import fetching and caching (`[import]` table).
    #[serde(default, skip_serializing_if = "ImportSettings::is_default")]
    pub import: ImportSettings,
}

/// The `[import]` table: cache and HTTP behaviour of remote imports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImportSettings {
    /// Cache root, overridden by `RULEPACK_CACHE_DIR`; `None` means the platform default.
    /// See [`resolve_cache_dir`](super::resolve_cache_dir).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,

    /// Seconds a downloaded import stays fresh.
    #[serde(default = "default_expires_in_secs")]
    pub expires_in_secs: u64,

    /// Maximum number of redirect hops per request.
    #[serde(default = "default_redirect_limit")]
    pub redirect_limit: usize,

    /// Retries after the first attempt for timeouts and 4xx/5xx responses.
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Pause between attempts, in milliseconds.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// TCP connect timeout, in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Whole-request timeout, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            cache_dir: None,
            expires_in_secs: default_expires_in_secs(),
            redirect_limit: default_redirect_limit(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl ImportSettings {
    fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Cache freshness window.
    #[must_use]
    pub const fn expires_in(&self) -> Duration {
        Duration::from_secs(self.expires_in_secs)
    }

    /// Pause between retry attempts.
    #[must_use]
    pub const fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// TCP connect timeout.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Whole-request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl GlobalConfig {
    /// Load global configuration from the default location.
    ///
    /// A missing file yields the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the default path cannot be determined, or the file
    /// exists but cannot be read or parsed.
    pub async fn load() -> Result<Self> {
        let path = Self::default_path()?;
        Self::load_with_optional(Some(path)).await
    }

    /// Load global configuration from `path`, or the default location when `None`.
    ///
    /// A missing file yields the default configuration.
    pub async fn load_with_optional(path: Option<PathBuf>) -> Result<Self> {
        let path = match path {
            Some(path) => path,
            None => Self::default_path()?,
        };
        if path.exists() {
            Self::load_from(&path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Load global configuration from a specific file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid TOML, or
    /// contains unknown keys.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read global config from {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse global config from {}", path.display()))
    }

    /// Save global configuration to the default location.
    pub async fn save(&self) -> Result<()> {
        let path = Self::default_path()?;
        self.save_to(&path).await
    }

    /// Save global configuration to `path`, creating parent directories as needed.
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize global config")?;

        fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write global config to {}", path.display()))
    }

    /// Get the default file path for global configuration.
    ///
    /// `RULEPACK_CONFIG_PATH` overrides the platform location.
    ///
    /// # Errors
    ///
    /// Returns an error if the home (or local data) directory cannot be determined.
    pub fn default_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var("RULEPACK_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_dir = if cfg!(target_os = "windows") {
            dirs::data_local_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine local data directory"))?
                .join("rulepack")
        } else {
            dirs::home_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine home directory"))?
                .join(".rulepack")
        };

        Ok(config_dir.join("config.toml"))
    }
}
