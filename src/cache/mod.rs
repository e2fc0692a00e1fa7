//! On-disk cache for downloaded imports.
//!
//! Remote imports are cached as flat files named by the hex SHA-256 digest of
//! their URI. There are no subdirectories, no metadata sidecars and no index:
//! freshness is derived solely from the file's modification time.
//!
//! # Cache Structure
//!
//! ```text
//! ~/.rulepack/cache/
//! ├── 3f1c...e9      # https://example.test/rules.yml
//! ├── 9ab0...42      # https://example.test/pack.tar.gz (raw archive)
//! └── d417...0c      # https://example.test/pack.tar.gz/rules/a.yml (member)
//! ```
//!
//! # Sharing
//!
//! Keys are deterministic, so separate processes can share one cache root
//! without coordination. Writes are remove-then-write and the last writer
//! wins; a reader racing a writer may see the slot missing and simply treats
//! it as a cache miss. No in-process lock is taken.

use crate::constants::DEFAULT_EXPIRES_IN;
use crate::core::{ImportError, Result};
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio::fs;
use tracing::{debug, trace};

/// Why a cache slot cannot be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Staleness {
    /// The caller asked to bypass the cache.
    ForceDownload,
    /// No file exists at the slot.
    Missing,
    /// The slot is at least `expires_in` old.
    Expired,
}

impl std::fmt::Display for Staleness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ForceDownload => write!(f, "force flag"),
            Self::Missing => write!(f, "no cache found"),
            Self::Expired => write!(f, "cache expired"),
        }
    }
}

/// Result of a freshness query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// The slot exists and is younger than the TTL.
    Fresh,
    /// A download is required.
    Stale(Staleness),
}

impl Freshness {
    /// Returns `true` for [`Freshness::Fresh`].
    #[must_use]
    pub const fn is_fresh(self) -> bool {
        matches!(self, Self::Fresh)
    }
}

/// Flat, TTL-based cache of downloaded content.
///
/// The store is a handle over an injected root directory; it is the only code
/// touching that directory. There is no size bound and no background eviction:
/// the only invalidation is overwriting a slot.
///
/// # Examples
///
/// ```rust,no_run
/// use rulepack_cli::cache::CacheStore;
/// use std::time::Duration;
///
/// # async fn example() -> rulepack_cli::core::Result<()> {
/// let cache = CacheStore::new("/tmp/rulepack-cache")
///     .with_expires_in(Duration::from_secs(60));
///
/// let key = CacheStore::cache_key("https://example.test/rules.yml");
/// if cache.is_fresh(&key).await? {
///     let bytes = cache.read(&key).await?;
///     println!("{} cached bytes", bytes.len());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
    expires_in: Duration,
    force_download: bool,
}

impl CacheStore {
    /// Creates a store over `root` with the default TTL and no forced downloads.
    ///
    /// The directory is created lazily on the first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            expires_in: DEFAULT_EXPIRES_IN,
            force_download: false,
        }
    }

    /// Sets the freshness window.
    #[must_use]
    pub fn with_expires_in(mut self, expires_in: Duration) -> Self {
        self.expires_in = expires_in;
        self
    }

    /// Makes every slot report as stale.
    #[must_use]
    pub fn with_force_download(mut self, force_download: bool) -> Self {
        self.force_download = force_download;
        self
    }

    /// Returns the cache root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the configured freshness window.
    #[must_use]
    pub const fn expires_in(&self) -> Duration {
        self.expires_in
    }

    /// Returns whether downloads are forced.
    #[must_use]
    pub const fn force_download(&self) -> bool {
        self.force_download
    }

    /// Computes the cache key of a URI: the hex SHA-256 digest of its string form.
    ///
    /// Pure and deterministic; archive members use `"{uri}/{member}"` as input.
    #[must_use]
    pub fn cache_key(uri: &str) -> String {
        hex::encode(Sha256::digest(uri.as_bytes()))
    }

    /// Returns the on-disk slot for a key.
    #[must_use]
    pub fn slot_path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    /// Determines whether the slot for `key` can be served.
    ///
    /// Checks, in order: the force flag, the slot's existence, and its age. A
    /// modification time in the future counts as age zero.
    pub async fn freshness(&self, key: &str) -> Result<Freshness> {
        if self.force_download {
            return Ok(Freshness::Stale(Staleness::ForceDownload));
        }

        let path = self.slot_path(key);
        let metadata = match fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => metadata,
            Ok(_) => return Ok(Freshness::Stale(Staleness::Missing)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Ok(Freshness::Stale(Staleness::Missing));
            }
            Err(e) => return Err(ImportError::file_system("inspecting cache slot", path, e)),
        };

        let modified = metadata
            .modified()
            .map_err(|e| ImportError::file_system("reading cache slot mtime", &path, e))?;
        let age = SystemTime::now().duration_since(modified).unwrap_or(Duration::ZERO);
        trace!("Cache slot {} is {:?} old", path.display(), age);

        if age >= self.expires_in {
            Ok(Freshness::Stale(Staleness::Expired))
        } else {
            Ok(Freshness::Fresh)
        }
    }

    /// Convenience wrapper around [`CacheStore::freshness`].
    pub async fn is_fresh(&self, key: &str) -> Result<bool> {
        Ok(self.freshness(key).await?.is_fresh())
    }

    /// Reads a slot's content.
    ///
    /// Fails if the slot is absent; callers check freshness first.
    pub async fn read(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.slot_path(key);
        fs::read(&path).await.map_err(|e| ImportError::file_system("reading cache slot", path, e))
    }

    /// Replaces the slot for `key` with `content`.
    ///
    /// Any existing file at the slot is removed first, then the new content is
    /// written. The cache root is created when missing.
    pub async fn write(&self, key: &str, content: &[u8]) -> Result<()> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| ImportError::file_system("creating cache directory", &self.root, e))?;

        let path = self.slot_path(key);
        match fs::remove_file(&path).await {
            Ok(()) => debug!("Removed previous cache slot {}", path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(ImportError::file_system("removing cache slot", path, e)),
        }

        fs::write(&path, content)
            .await
            .map_err(|e| ImportError::file_system("writing cache slot", path, e))
    }
}
