//! Extraction of pattern packs shipped as gzip-compressed tar archives.
//!
//! Archives are recognised by file name only (`.tar.gz` / `.tgz`), never by
//! sniffing content. Extraction is a single streaming pass over the
//! decompressed tar stream: members are read one at a time and only those
//! accepted by a [`MemberFilter`] are surfaced.
//!
//! # Examples
//!
//! ```rust,no_run
//! use rulepack_cli::archive::{ArchiveReader, default_member_filter, is_archive};
//!
//! # fn example(bytes: Vec<u8>) -> rulepack_cli::core::Result<()> {
//! assert!(is_archive("https://example.test/pack.tar.gz"));
//!
//! let mut reader = ArchiveReader::new("pack.tar.gz", &bytes);
//! for member in reader.members(default_member_filter())? {
//!     let member = member?;
//!     println!("{} ({} bytes)", member.name, member.content.len());
//! }
//! # Ok(())
//! # }
//! ```

use crate::constants::{ARCHIVE_SUFFIXES, DEFAULT_CONFIG_FILE};
use crate::core::{ImportError, Result};
use flate2::read::GzDecoder;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use tar::Archive;
use tracing::trace;

/// Upper bound on the buffer reserved up front for a member; header sizes are untrusted.
const MEMBER_PREALLOC_LIMIT: u64 = 64 * 1024;

/// Predicate deciding which archive members are surfaced, by member name.
pub type MemberFilter = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Returns `true` when `name` looks like a gzip-compressed tar archive.
///
/// The suffix test is case-insensitive.
#[must_use]
pub fn is_archive(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    ARCHIVE_SUFFIXES.iter().any(|suffix| lower.ends_with(suffix))
}

/// Returns `true` for YAML pattern files that are not the tool's own configuration.
#[must_use]
pub fn is_pattern_file(name: &str) -> bool {
    let path = Path::new(name);
    let yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yml") || ext.eq_ignore_ascii_case("yaml"));
    let is_config = path.file_name().and_then(|n| n.to_str()) == Some(DEFAULT_CONFIG_FILE);

    yaml && !is_config
}

/// The filter used when none is configured: [`is_pattern_file`].
#[must_use]
pub fn default_member_filter() -> MemberFilter {
    Arc::new(is_pattern_file)
}

/// One file extracted from an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveMember {
    /// Path of the entry inside the archive (e.g. `rules/a.yml`)
    pub name: String,
    /// Raw content of the entry
    pub content: Vec<u8>,
}

/// Streaming reader over an in-memory `.tar.gz` payload.
pub struct ArchiveReader<'a> {
    name: String,
    archive: Archive<GzDecoder<&'a [u8]>>,
}

impl<'a> ArchiveReader<'a> {
    /// Wraps `bytes`; `name` (a path or URI) is only used in error messages.
    pub fn new(name: impl Into<String>, bytes: &'a [u8]) -> Self {
        Self {
            name: name.into(),
            archive: Archive::new(GzDecoder::new(bytes)),
        }
    }

    /// Returns a lazy, single-pass iterator over the members accepted by `filter`.
    ///
    /// Only regular files are considered; directories, links and other entry
    /// types are skipped. A corrupt gzip or tar stream yields an
    /// [`ImportError::Archive`] item; members yielded before it stay valid.
    pub fn members(
        &mut self,
        filter: MemberFilter,
    ) -> Result<impl Iterator<Item = Result<ArchiveMember>> + '_> {
        let name = self.name.clone();
        let entries = self.archive.entries().map_err(|source| ImportError::Archive {
            name: name.clone(),
            source,
        })?;

        let mut failed = false;
        Ok(entries.filter_map(move |entry| {
            if failed {
                return None;
            }
            let archive_error = |source| ImportError::Archive {
                name: name.clone(),
                source,
            };

            let mut entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    failed = true;
                    return Some(Err(archive_error(e)));
                }
            };

            if !entry.header().entry_type().is_file() {
                return None;
            }

            let member_name = match entry.path() {
                Ok(path) => path.to_string_lossy().into_owned(),
                Err(e) => {
                    failed = true;
                    return Some(Err(archive_error(e)));
                }
            };
            trace!("Archive entry: {}", member_name);

            if !filter(&member_name) {
                return None;
            }

            let mut content = Vec::with_capacity(entry.size().min(MEMBER_PREALLOC_LIMIT) as usize);
            if let Err(e) = entry.read_to_end(&mut content) {
                failed = true;
                return Some(Err(archive_error(e)));
            }

            Some(Ok(ArchiveMember {
                name: member_name,
                content,
            }))
        }))
    }
}
