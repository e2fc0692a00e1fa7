//! Local path and glob resolution for imports.
//!
//! Local import references are glob patterns resolved against the directory
//! of the configuration file that declares them.
//!
//! # Pattern Syntax
//!
//! - `*` matches any sequence of characters within a single path component
//! - `**` matches any sequence of path components (recursive matching)
//! - `?` matches any single character
//! - `[abc]` / `[a-z]` match one character from a set or range
//! - `{foo,bar}` matches either "foo" or "bar" (alternation, may be nested)
//!
//! Wildcards also match dotfiles: `patterns/*` includes `patterns/.hidden.yml`.
//!
//! # Examples
//!
//! ```rust,no_run
//! use rulepack_cli::pattern::LocalResolver;
//! use std::path::Path;
//!
//! # fn example() -> rulepack_cli::core::Result<()> {
//! let resolver = LocalResolver::new();
//! let files = resolver.resolve("patterns/{security,style}/*.yml", Path::new("/project"))?;
//! for file in files {
//!     println!("{}", file.display());
//! }
//! # Ok(())
//! # }
//! ```

use crate::core::{ImportError, Result};
use glob::{MatchOptions, Pattern};
use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, trace};

/// Expands `{a,b}` alternation into plain glob patterns.
///
/// Groups may be nested (`{a,{b,c}}`). A brace without a matching close is
/// kept literally. Expansion order follows the written order of alternatives.
///
/// ```rust
/// use rulepack_cli::pattern::expand_braces;
///
/// assert_eq!(expand_braces("*.{yml,yaml}"), vec!["*.yml", "*.yaml"]);
/// assert_eq!(expand_braces("plain/*.yml"), vec!["plain/*.yml"]);
/// ```
#[must_use]
pub fn expand_braces(pattern: &str) -> Vec<String> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut depth = 0usize;
    let mut open = None;

    for (i, c) in chars.iter().enumerate() {
        match c {
            '{' => {
                if depth == 0 {
                    open = Some(i);
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth > 0 {
                    continue;
                }
                if let Some(start) = open {
                    let prefix: String = chars[..start].iter().collect();
                    let suffix: String = chars[i + 1..].iter().collect();
                    return split_alternatives(&chars[start + 1..i])
                        .into_iter()
                        .flat_map(|alt| expand_braces(&format!("{prefix}{alt}{suffix}")))
                        .collect();
                }
            }
            _ => {}
        }
    }

    vec![pattern.to_string()]
}

/// Splits the inside of a brace group at top-level commas.
fn split_alternatives(inner: &[char]) -> Vec<String> {
    let mut alternatives = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;

    for &c in inner {
        match c {
            '{' => {
                depth += 1;
                current.push(c);
            }
            '}' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ',' if depth == 0 => alternatives.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    alternatives.push(current);
    alternatives
}

/// Resolves local import patterns to concrete files.
///
/// Results are absolute, sorted, de-duplicated, and contain regular files
/// only. A pattern that matches nothing is an error
/// ([`ImportError::FileNotFound`]), never an empty success.
#[derive(Debug, Clone)]
pub struct LocalResolver {
    options: MatchOptions,
}

impl LocalResolver {
    /// Creates a resolver that matches dotfiles and requires literal separators.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            options: MatchOptions {
                case_sensitive: true,
                require_literal_separator: true,
                require_literal_leading_dot: false,
            },
        }
    }

    /// Resolves `pattern` relative to `base_dir`.
    ///
    /// The pattern is always anchored at `base_dir`: a leading root (and, on
    /// Windows, a drive prefix) is dropped, so `/rules/*.yml` means
    /// `<base_dir>/rules/*.yml`. The base directory itself is escaped, so glob
    /// metacharacters in it are taken literally.
    ///
    /// # Errors
    ///
    /// - [`ImportError::InvalidPattern`] for malformed glob syntax
    /// - [`ImportError::FileSystem`] when a directory cannot be read
    /// - [`ImportError::FileNotFound`] when nothing matches
    pub fn resolve(&self, pattern: &str, base_dir: &Path) -> Result<Vec<PathBuf>> {
        let base = std::path::absolute(base_dir)
            .map_err(|e| ImportError::file_system("resolving base directory", base_dir, e))?;
        let escaped_base = PathBuf::from(Pattern::escape(&base.to_string_lossy()));
        debug!("Searching for pattern '{}' in {}", pattern, base.display());

        let mut matches = BTreeSet::new();
        for expanded in expand_braces(pattern) {
            let full = escaped_base.join(strip_root(&expanded));
            let full = full.to_string_lossy();
            trace!("Expanded glob: {}", full);

            let paths = glob::glob_with(&full, self.options).map_err(|e| ImportError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })?;

            for entry in paths {
                let path = entry.map_err(|e| {
                    let path = e.path().to_path_buf();
                    ImportError::file_system("reading directory", path, e.into_error())
                })?;
                if path.is_file() {
                    matches.insert(path);
                }
            }
        }

        if matches.is_empty() {
            return Err(ImportError::FileNotFound {
                pattern: pattern.to_string(),
            });
        }

        debug!("Found {} matches for pattern '{}'", matches.len(), pattern);
        Ok(matches.into_iter().collect())
    }
}

fn strip_root(pattern: &str) -> PathBuf {
    Path::new(pattern)
        .components()
        .filter(|c| !matches!(c, Component::Prefix(_) | Component::RootDir))
        .collect()
}

impl Default for LocalResolver {
    fn default() -> Self {
        Self::new()
    }
}
