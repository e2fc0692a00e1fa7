//! Import loading: turns import references into delivered content.
//!
//! An import reference names external pattern definitions. It is one of:
//!
//! - a local path or glob (`patterns/*.yml`), resolved against the directory
//!   of the configuration file
//! - a `file:` URI, whose path is resolved the same way
//! - an `http://` / `https://` URI, downloaded through the on-disk cache
//!
//! Any resource whose name ends in `.tar.gz` / `.tgz` is treated as a pattern
//! pack: its YAML members are delivered one by one instead of the raw bytes.
//!
//! # Delivery
//!
//! [`ImportLoader::load`] pushes every resolved unit to a consumer callback as
//! `(content, source_name)`, in resolution order. Deliveries made before a
//! failure stand, but the call still fails and the caller should treat the
//! whole reference as not loaded.
//!
//! # Examples
//!
//! ```rust,no_run
//! use rulepack_cli::cache::CacheStore;
//! use rulepack_cli::http::HttpFetcher;
//! use rulepack_cli::import::ImportLoader;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let loader = ImportLoader::new(
//!     "/project/rulepack.yml",
//!     CacheStore::new("/tmp/rulepack-cache"),
//!     HttpFetcher::with_defaults()?,
//! );
//!
//! let mut units = Vec::new();
//! loader
//!     .load("https://example.test/pack.tar.gz", |content, source_name| {
//!         units.push((source_name.to_string(), content.len()));
//!         Ok(())
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

use crate::archive::{ArchiveMember, ArchiveReader, MemberFilter, default_member_filter, is_archive};
use crate::cache::{CacheStore, Freshness};
use crate::config::ImportSettings;
use crate::core::{ImportError, Result};
use crate::http::{HttpClient, HttpFetcher, ReqwestClient};
use crate::pattern::LocalResolver;
use percent_encoding::percent_decode_str;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use url::Url;

/// A classified import reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportReference {
    /// A bare path or glob, relative to the configuration directory
    Local {
        /// The pattern as written
        pattern: String,
    },
    /// A `file:` URI; `pattern` is its percent-decoded path, resolved beneath
    /// the configuration directory like a bare pattern
    LocalFile {
        /// Decoded URI path
        pattern: String,
    },
    /// An `http`/`https` URI
    Remote {
        /// The parsed URL
        url: Url,
    },
}

impl ImportReference {
    /// Classifies `reference` by URI scheme.
    ///
    /// Strings that do not parse as absolute URIs are local patterns. On
    /// Windows a single-letter scheme is a drive letter, not a scheme.
    ///
    /// # Errors
    ///
    /// [`ImportError::UnexpectedSchema`] for any scheme other than `file`,
    /// `http` and `https`; [`ImportError::InvalidPattern`] when a `file:` path
    /// does not decode to UTF-8.
    pub fn parse(reference: &str) -> Result<Self> {
        let url = match Url::parse(reference) {
            Ok(url) => url,
            Err(_) => {
                return Ok(Self::Local {
                    pattern: reference.to_string(),
                });
            }
        };

        match url.scheme() {
            "file" => {
                let pattern = percent_decode_str(url.path()).decode_utf8().map_err(|e| {
                    ImportError::InvalidPattern {
                        pattern: reference.to_string(),
                        reason: e.to_string(),
                    }
                })?;
                Ok(Self::LocalFile {
                    pattern: pattern.into_owned(),
                })
            }
            "http" | "https" => Ok(Self::Remote { url }),
            scheme if cfg!(windows) && scheme.len() == 1 => Ok(Self::Local {
                pattern: reference.to_string(),
            }),
            scheme => Err(ImportError::UnexpectedSchema {
                scheme: scheme.to_string(),
                reference: reference.to_string(),
            }),
        }
    }
}

impl fmt::Display for ImportReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local { pattern } => write!(f, "{pattern}"),
            Self::LocalFile { pattern } => write!(f, "file://{pattern}"),
            Self::Remote { url } => write!(f, "{url}"),
        }
    }
}

/// Resolves import references and delivers their content.
///
/// The loader owns its collaborators: a [`CacheStore`] over the cache root,
/// an [`HttpFetcher`] for remote resources, and the [`MemberFilter`] applied
/// to archives. It holds no other state, so one loader can serve any number
/// of sequential or concurrent `load` calls.
pub struct ImportLoader<C = ReqwestClient> {
    config_path: PathBuf,
    cache: CacheStore,
    fetcher: HttpFetcher<C>,
    member_filter: MemberFilter,
}

impl<C: fmt::Debug> fmt::Debug for ImportLoader<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImportLoader")
            .field("config_path", &self.config_path)
            .field("cache", &self.cache)
            .field("fetcher", &self.fetcher)
            .finish_non_exhaustive()
    }
}

impl ImportLoader<ReqwestClient> {
    /// Builds the production loader from global import settings.
    ///
    /// `force_download` bypasses the cache for every remote reference.
    pub fn from_settings(
        config_path: impl Into<PathBuf>,
        settings: &ImportSettings,
        cache_root: impl Into<PathBuf>,
        force_download: bool,
    ) -> Result<Self> {
        let client = ReqwestClient::with_timeouts(settings.connect_timeout(), settings.request_timeout())?;
        let fetcher = HttpFetcher::new(client)
            .with_redirect_limit(settings.redirect_limit)
            .with_max_retries(settings.max_retries)
            .with_retry_delay(settings.retry_delay());
        let cache = CacheStore::new(cache_root)
            .with_expires_in(settings.expires_in())
            .with_force_download(force_download);

        Ok(Self::new(config_path, cache, fetcher))
    }
}

impl<C: HttpClient> ImportLoader<C> {
    /// Creates a loader for imports declared in the configuration at `config_path`.
    pub fn new(config_path: impl Into<PathBuf>, cache: CacheStore, fetcher: HttpFetcher<C>) -> Self {
        Self {
            config_path: config_path.into(),
            cache,
            fetcher,
            member_filter: default_member_filter(),
        }
    }

    /// Replaces the archive member filter.
    #[must_use]
    pub fn with_member_filter(mut self, member_filter: MemberFilter) -> Self {
        self.member_filter = member_filter;
        self
    }

    /// Path of the configuration file the imports belong to.
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Directory local patterns are resolved against.
    pub fn base_dir(&self) -> &Path {
        self.config_path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
    }

    /// The cache store used for remote imports.
    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// The fetcher used for remote imports.
    pub fn fetcher(&self) -> &HttpFetcher<C> {
        &self.fetcher
    }

    /// Resolves `reference` and calls `consumer(content, source_name)` once per unit.
    ///
    /// Source names are the file path for local files, the member name for
    /// archive members, and the URI for other remote resources.
    ///
    /// # Errors
    ///
    /// Fails on the first error of any kind: classification, resolution,
    /// download, extraction, caching, non-UTF-8 content, or an error returned by
    /// `consumer` ([`ImportError::Consumer`]).
    pub async fn load<F>(&self, reference: &str, mut consumer: F) -> Result<()>
    where
        F: FnMut(&str, &str) -> anyhow::Result<()>,
    {
        match ImportReference::parse(reference)? {
            ImportReference::Local { pattern } | ImportReference::LocalFile { pattern } => {
                self.load_local(&pattern, &mut consumer).await
            }
            ImportReference::Remote { url } => self.load_remote(&url, &mut consumer).await,
        }
    }

    async fn load_local<F>(&self, pattern: &str, consumer: &mut F) -> Result<()>
    where
        F: FnMut(&str, &str) -> anyhow::Result<()>,
    {
        let files = LocalResolver::new().resolve(pattern, self.base_dir())?;

        for file in files {
            info!("Reading file: {}", file.display());
            let bytes = tokio::fs::read(&file)
                .await
                .map_err(|e| ImportError::file_system("reading import", &file, e))?;

            let source_name = file.to_string_lossy();
            if is_archive(&source_name) {
                self.deliver_archive(&source_name, &bytes, consumer)?;
            } else {
                deliver(consumer, &bytes, &source_name)?;
            }
        }

        Ok(())
    }

    async fn load_remote<F>(&self, url: &Url, consumer: &mut F) -> Result<()>
    where
        F: FnMut(&str, &str) -> anyhow::Result<()>,
    {
        let uri = url.as_str();
        let key = CacheStore::cache_key(uri);
        info!("Calculated cache name: {key}");
        let archive = is_archive(url.path());

        match self.cache.freshness(&key).await? {
            Freshness::Fresh => {
                info!("Reading content from cache...");
                let bytes = self.cache.read(&key).await?;
                if archive {
                    self.deliver_archive(uri, &bytes, consumer)?;
                } else {
                    deliver(consumer, &bytes, uri)?;
                }
            }
            Freshness::Stale(reason) => {
                debug!("Downloading: {reason}");
                info!("Downloading content...");
                let body = self.fetcher.get(url).await?;

                if archive {
                    let members = self.deliver_archive(uri, &body, consumer)?;
                    for member in &members {
                        let member_key = CacheStore::cache_key(&format!("{uri}/{}", member.name));
                        self.cache.write(&member_key, &member.content).await?;
                    }
                } else {
                    deliver(consumer, &body, uri)?;
                }
                self.cache.write(&key, &body).await?;
            }
        }

        Ok(())
    }

    /// Delivers every member accepted by the filter, returning them in order.
    ///
    /// Synchronous on purpose: the tar reader must not live across an await.
    fn deliver_archive<F>(&self, name: &str, bytes: &[u8], consumer: &mut F) -> Result<Vec<ArchiveMember>>
    where
        F: FnMut(&str, &str) -> anyhow::Result<()>,
    {
        let mut reader = ArchiveReader::new(name, bytes);
        let mut delivered = Vec::new();

        for member in reader.members(self.member_filter.clone())? {
            let member = member?;
            deliver(consumer, &member.content, &member.name)?;
            delivered.push(member);
        }

        debug!("Delivered {} members from {}", delivered.len(), name);
        Ok(delivered)
    }
}

fn deliver<F>(consumer: &mut F, content: &[u8], source_name: &str) -> Result<()>
where
    F: FnMut(&str, &str) -> anyhow::Result<()>,
{
    let text = std::str::from_utf8(content).map_err(|_| ImportError::InvalidUtf8 {
        source_name: source_name.to_string(),
    })?;
    consumer(text, source_name).map_err(ImportError::Consumer)
}
