//! Inspect the cache slot of a URI.

use crate::cache::{CacheStore, Freshness};
use crate::config::{GlobalConfig, resolve_cache_dir};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use url::Url;

/// Arguments of `rulepack cache-key`.
#[derive(Args, Debug)]
pub struct CacheKeyCommand {
    /// URI to compute the key for (archive members: `<archive-uri>/<member>`)
    uri: String,

    /// Cache directory (overrides the global config and RULEPACK_CACHE_DIR)
    #[arg(long, value_name = "DIR")]
    cache_dir: Option<PathBuf>,
}

impl CacheKeyCommand {
    /// Print the key, slot path and freshness of the URI.
    pub async fn execute(self) -> Result<()> {
        let global = GlobalConfig::load().await?;
        let cache_root = match self.cache_dir {
            Some(dir) => dir,
            None => resolve_cache_dir(global.import.cache_dir.as_deref())?,
        };
        let cache = CacheStore::new(cache_root).with_expires_in(global.import.expires_in());

        // The loader keys on the normalized URL, e.g. with a trailing `/` for bare hosts.
        let uri = Url::parse(&self.uri).map_or(self.uri, String::from);
        let key = CacheStore::cache_key(&uri);

        let status = match cache.freshness(&key).await? {
            Freshness::Fresh => "fresh".green().to_string(),
            Freshness::Stale(reason) => format!("stale ({reason})").yellow().to_string(),
        };

        println!("uri:    {uri}");
        println!("key:    {key}");
        println!("slot:   {}", cache.slot_path(&key).display());
        println!("status: {status}");
        Ok(())
    }
}
