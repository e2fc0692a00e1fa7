//! The inspection tool's YAML configuration, as far as imports are concerned.
//!
//! Only the top-level `import` list is read here; rules, exclusions and the
//! rest of the schema belong to the tool that consumes the imported content.
//!
//! ```yaml
//! rules:
//!   - id: example.rule
//!     pattern: foo
//! import:
//!   - patterns/*.yml
//!   - https://example.test/pack.tar.gz
//! ```

use crate::core::{ImportError, Result};
use serde::Deserialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Default, Deserialize)]
struct RawRulesFile {
    #[serde(default)]
    import: Vec<String>,
}

/// A loaded configuration file and its import references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RulesFile {
    /// Where the file was read from; local imports resolve against its directory.
    pub path: PathBuf,
    /// Import references in declaration order.
    pub imports: Vec<String>,
}

impl RulesFile {
    /// Reads and parses the configuration at `path`.
    ///
    /// # Errors
    ///
    /// - [`ImportError::ConfigFileNotFound`] when the file does not exist
    /// - [`ImportError::ConfigParse`] when it is not valid YAML or `import` is
    ///   not a list of strings
    /// - [`ImportError::FileSystem`] for any other read failure
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ImportError::ConfigFileNotFound {
                    path: path.to_path_buf(),
                });
            }
            Err(e) => return Err(ImportError::file_system("reading configuration", path, e)),
        };

        let rules = Self::parse(path, &content)?;
        debug!("Loaded {} import(s) from {}", rules.imports.len(), path.display());
        Ok(rules)
    }

    /// Parses configuration `content` that was read from `path`.
    pub fn parse(path: impl Into<PathBuf>, content: &str) -> Result<Self> {
        let path = path.into();
        let raw: RawRulesFile = if content.trim().is_empty() {
            RawRulesFile::default()
        } else {
            serde_yaml::from_str(content).map_err(|e| ImportError::ConfigParse {
                path: path.clone(),
                reason: e.to_string(),
            })?
        };

        Ok(Self {
            path,
            imports: raw.import,
        })
    }
}
