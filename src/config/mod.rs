//! Configuration management for rulepack
//!
//! Two files feed the import resolver:
//!
//! 1. **Global Configuration** (`~/.rulepack/config.toml`): user-wide cache
//!    and HTTP settings, see [`GlobalConfig`] and [`ImportSettings`]
//! 2. **Rules File** (`rulepack.yml`): the inspection tool's configuration,
//!    of which only the `import` list is read, see [`RulesFile`]
//!
//! # Configuration Priority
//!
//! 1. Command-line flags (`--cache-dir`, `--force-download`)
//! 2. Environment variables (`RULEPACK_CONFIG_PATH`, `RULEPACK_CACHE_DIR`)
//! 3. Global configuration (`~/.rulepack/config.toml`)
//! 4. Default values
//!
//! # Examples
//!
//! ```rust,no_run
//! use rulepack_cli::config::{GlobalConfig, RulesFile, resolve_cache_dir};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let global = GlobalConfig::load().await?;
//! let cache_root = resolve_cache_dir(global.import.cache_dir.as_deref())?;
//!
//! let rules = RulesFile::load("rulepack.yml").await?;
//! println!("{} imports, cache at {}", rules.imports.len(), cache_root.display());
//! # Ok(())
//! # }
//! ```

mod global;
mod rules;

pub use global::{GlobalConfig, ImportSettings};
pub use rules::RulesFile;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Get the cache directory for rulepack.
///
/// # Location Priority
///
/// 1. `RULEPACK_CACHE_DIR` environment variable (if set)
/// 2. Platform-specific cache directory:
///    - Windows: `%LOCALAPPDATA%\rulepack\cache`
///    - macOS/Linux: `~/.rulepack/cache`
///
/// The directory is created if it doesn't exist.
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined or the cache
/// directory cannot be created.
pub fn get_cache_dir() -> Result<PathBuf> {
    resolve_cache_dir(None)
}

/// Resolve the cache directory with a configured fallback.
///
/// `RULEPACK_CACHE_DIR` wins over `configured` (the `[import] cache_dir`
/// setting), which wins over the platform default. The directory is created
/// if it doesn't exist.
///
/// # Errors
///
/// Same as [`get_cache_dir`].
pub fn resolve_cache_dir(configured: Option<&Path>) -> Result<PathBuf> {
    let cache_dir = match (std::env::var_os("RULEPACK_CACHE_DIR"), configured) {
        (Some(dir), _) => PathBuf::from(dir),
        (None, Some(dir)) => dir.to_path_buf(),
        (None, None) => default_cache_dir()?,
    };

    if !cache_dir.exists() {
        std::fs::create_dir_all(&cache_dir)
            .with_context(|| format!("Failed to create cache directory: {}", cache_dir.display()))?;
    }

    Ok(cache_dir)
}

fn default_cache_dir() -> Result<PathBuf> {
    let base = if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .ok_or_else(|| anyhow::anyhow!("Unable to determine local data directory"))?
            .join("rulepack")
    } else {
        dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Unable to determine home directory"))?
            .join(".rulepack")
    };
    Ok(base.join("cache"))
}
