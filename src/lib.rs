//! rulepack - import resolution for pattern-based code inspection
//!
//! A rulepack configuration (`rulepack.yml`) may pull pattern definitions from
//! elsewhere through its `import` list. Each import reference is one of:
//!
//! - a local path or glob (`patterns/*.yml`, `rules/{security,style}/*.yaml`)
//! - a `file://` URI
//! - an `http://` or `https://` URI, downloaded and cached on disk
//!
//! Resources named `*.tar.gz` / `*.tgz` are pattern packs: their YAML members
//! are delivered individually.
//!
//! # Architecture Overview
//!
//! The [`import::ImportLoader`] classifies a reference and routes it:
//!
//! ```text
//!                      ┌─────────────────┐
//!   reference ───────▶ │  ImportLoader   │ ──▶ consumer(content, source_name)
//!                      └─────────────────┘
//!                     /        |          \
//!        ┌──────────────┐ ┌──────────┐ ┌─────────────┐
//!        │LocalResolver │ │CacheStore│ │ HttpFetcher │
//!        │ (glob)       │ │ (sha256) │ │ (redirects, │
//!        └──────────────┘ └──────────┘ │  retries)   │
//!                \             |       └─────────────┘
//!                 └──── ArchiveReader (.tar.gz) ────┘
//! ```
//!
//! # Core Modules
//!
//! - [`import`] - Reference classification and the load orchestration
//! - [`pattern`] - Local glob resolution with `{a,b}` alternation and dotfiles
//! - [`cache`] - Flat, TTL-based on-disk cache keyed by SHA-256 of the URI
//! - [`http`] - GET with bounded redirects and a fixed retry budget
//! - [`archive`] - Streaming extraction of gzip-compressed tar members
//!
//! # Supporting Modules
//!
//! - [`config`] - Global settings (`~/.rulepack/config.toml`) and the rules file
//! - [`core`] - Error types and user-facing error rendering
//! - [`constants`] - Defaults for timeouts, TTL and limits
//! - [`cli`] - The `rulepack` command-line shell
//!
//! # Example
//!
//! ```rust,no_run
//! use rulepack_cli::config::{GlobalConfig, RulesFile, resolve_cache_dir};
//! use rulepack_cli::import::ImportLoader;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let global = GlobalConfig::load().await?;
//! let rules = RulesFile::load("rulepack.yml").await?;
//! let cache_root = resolve_cache_dir(global.import.cache_dir.as_deref())?;
//! let loader = ImportLoader::from_settings(&rules.path, &global.import, cache_root, false)?;
//!
//! for reference in &rules.imports {
//!     loader
//!         .load(reference, |content, source_name| {
//!             println!("{source_name}: {} bytes", content.len());
//!             Ok(())
//!         })
//!         .await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod cache;
pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod http;
pub mod import;
pub mod pattern;

// Test utilities (only compiled in test mode or with test-utils feature)
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
