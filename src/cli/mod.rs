//! Command-line interface for rulepack.
//!
//! The binary is a thin operator shell around the import resolver. It does not
//! run inspections; it resolves imports the same way the inspection tool
//! would, which makes it handy for warming or debugging the cache.
//!
//! # Available Commands
//!
//! - `import` - Resolve import references (or every import of a config file)
//!   and list the delivered units
//! - `cache-key` - Show the cache key, slot path and freshness of a URI
//!
//! # Command Usage Patterns
//!
//! ```bash
//! # Resolve every import declared in ./rulepack.yml
//! rulepack import
//!
//! # Resolve one reference, bypassing the cache, with debug logs
//! rulepack --verbose import https://example.test/pack.tar.gz --force-download
//!
//! # Where is this URI cached?
//! rulepack cache-key https://example.test/rules.yml
//! ```
//!
//! # Global Options
//!
//! - `--verbose` / `-v`: debug logging
//! - `--quiet` / `-q`: warnings and errors only
//!
//! `RUST_LOG` takes precedence over both flags when set.

mod cache;
mod import;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Runtime configuration derived from global CLI flags.
///
/// Kept separate from [`Cli`] so tests can build it without parsing arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliConfig {
    /// Log filter used when `RUST_LOG` is not set (`"debug"`, `"info"`, `"warn"`).
    ///
    /// `None` leaves logging off.
    pub log_level: Option<String>,
}

impl CliConfig {
    /// Create a new CLI configuration with logging off.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the log level.
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = Some(level.into());
        self
    }

    /// Install the global `tracing` subscriber, writing to stderr.
    ///
    /// Safe to call more than once; only the first call installs a subscriber.
    pub fn init_logging(&self) {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else if let Some(level) = &self.log_level {
            EnvFilter::new(level)
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }
}

/// Main CLI structure for rulepack.
#[derive(Parser)]
#[command(
    name = "rulepack",
    about = "Resolve and cache rulepack pattern imports",
    version,
    long_about = "rulepack resolves the imports of a rulepack.yml configuration: local globs, \
                  file:// URIs and http(s):// pattern packs (optionally .tar.gz archives), \
                  caching remote content on disk."
)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output (debug logs)
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only print warnings and errors in logs
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve import references and list what they deliver
    Import(import::ImportCommand),

    /// Show the cache key and slot of a URI
    CacheKey(cache::CacheKeyCommand),
}

impl Cli {
    /// Execute the parsed command with configuration built from the flags.
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        self.execute_with_config(config).await
    }

    /// Build a [`CliConfig`] from the parsed CLI arguments.
    ///
    /// `--verbose` maps to `debug`, `--quiet` to `warn`, and the default is `info`.
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            "debug"
        } else if self.quiet {
            "warn"
        } else {
            "info"
        };

        CliConfig::new().with_log_level(log_level)
    }

    /// Execute the CLI with an explicit configuration.
    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        config.init_logging();

        match self.command {
            Commands::Import(cmd) => cmd.execute().await,
            Commands::CacheKey(cmd) => cmd.execute().await,
        }
    }
}
