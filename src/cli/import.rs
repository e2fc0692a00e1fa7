//! Resolve imports from the command line.
//!
//! # Examples
//!
//! ```bash
//! # Every import declared in ./rulepack.yml
//! rulepack import
//!
//! # Explicit references, resolved against another configuration's directory
//! rulepack import 'patterns/*.yml' --config ci/rulepack.yml
//!
//! # Refresh a remote pack and print its content
//! rulepack import https://example.test/pack.tar.gz --force-download --show-content
//! ```

use crate::config::{GlobalConfig, RulesFile, resolve_cache_dir};
use crate::constants::DEFAULT_CONFIG_FILE;
use crate::import::ImportLoader;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

/// Arguments of `rulepack import`.
#[derive(Args, Debug)]
pub struct ImportCommand {
    /// Import references to resolve; defaults to the config file's `import` list
    references: Vec<String>,

    /// Path to the configuration file; local imports resolve against its directory
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Ignore cached content and download every remote import
    #[arg(long)]
    force_download: bool,

    /// Cache directory (overrides the global config and RULEPACK_CACHE_DIR)
    #[arg(long, value_name = "DIR")]
    cache_dir: Option<PathBuf>,

    /// Print the content of every delivered unit
    #[arg(long)]
    show_content: bool,
}

impl ImportCommand {
    /// Resolve the references and print one line per delivered unit.
    pub async fn execute(self) -> Result<()> {
        let global = GlobalConfig::load().await?;

        let references = if self.references.is_empty() {
            RulesFile::load(&self.config).await?.imports
        } else {
            self.references.clone()
        };

        if references.is_empty() {
            println!("No imports declared in {}", self.config.display());
            return Ok(());
        }

        let cache_root = match self.cache_dir.clone() {
            Some(dir) => dir,
            None => resolve_cache_dir(global.import.cache_dir.as_deref())?,
        };

        let loader =
            ImportLoader::from_settings(&self.config, &global.import, cache_root, self.force_download)?;

        let show_content = self.show_content;
        let mut units = 0usize;
        for reference in &references {
            println!("{} {}", "Importing".green().bold(), reference);
            loader
                .load(reference, |content, source_name| {
                    units += 1;
                    println!("{source_name} ({} bytes)", content.len());
                    if show_content {
                        println!("{content}");
                    }
                    Ok(())
                })
                .await
                .with_context(|| format!("Failed to load import '{reference}'"))?;
        }

        println!(
            "{} {} unit(s) from {} reference(s)",
            "Loaded".green().bold(),
            units,
            references.len()
        );
        Ok(())
    }
}
