//! Error handling for rulepack
//!
//! This module provides the error type returned by the import resolver and the
//! user-friendly error reporting used by the command-line shell. The error system
//! follows two principles:
//! 1. **Strongly-typed errors** ([`ImportError`]) so callers can tell a missing
//!    file from an unreachable server or a corrupt archive
//! 2. **User-friendly messages** ([`ErrorContext`]) with actionable suggestions
//!    for CLI users
//!
//! # Error Categories
//!
//! - **Configuration/usage**: [`ImportError::UnexpectedSchema`],
//!   [`ImportError::FileNotFound`], [`ImportError::TooManyRedirects`]
//! - **Transient network**: [`ImportError::HttpGet`], [`ImportError::Timeout`]
//!   (the only retryable variants, see [`ImportError::is_retryable`])
//! - **Archive/decoding**: [`ImportError::Archive`], [`ImportError::InvalidUtf8`]
//! - **File system**: [`ImportError::FileSystem`]
//!
//! # Examples
//!
//! ```rust,no_run
//! use rulepack_cli::core::{ImportError, user_friendly_error};
//!
//! let error = ImportError::FileNotFound { pattern: "patterns/*.yml".to_string() };
//! assert!(!error.is_retryable());
//!
//! let ctx = user_friendly_error(anyhow::Error::from(error));
//! ctx.display(); // Shows colored error with suggestions
//! ```

use colored::Colorize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// The error type for import resolution
///
/// Every failure of [`ImportLoader::load`](crate::import::ImportLoader::load)
/// surfaces as one of these variants, carrying the path, URI or response data
/// needed to act on it. Nothing is swallowed: an error either resolves through
/// the HTTP retry budget or reaches the caller.
#[derive(Error, Debug)]
pub enum ImportError {
    /// The import reference uses a URI scheme other than `file`, `http` or `https`
    #[error("Unexpected URI schema: {scheme}")]
    UnexpectedSchema {
        /// The offending scheme (lowercased by the URI parser)
        scheme: String,
        /// The full import reference as written in the configuration
        reference: String,
    },

    /// A local path or glob matched no file
    ///
    /// An import that resolves to nothing is always a configuration mistake,
    /// so this is an error rather than an empty success.
    #[error("No such file: {pattern}")]
    FileNotFound {
        /// The pattern as written in the import reference
        pattern: String,
    },

    /// A local glob pattern could not be compiled
    #[error("Invalid glob pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The pattern that failed to compile
        pattern: String,
        /// Why the glob engine rejected it
        reason: String,
    },

    /// The server answered with a 4xx or 5xx status
    ///
    /// Retryable.
    #[error("HTTP GET {url} => {status} {reason}")]
    HttpGet {
        /// The URL that produced the response (after redirects)
        url: String,
        /// HTTP status code
        status: u16,
        /// Status message reported by the server
        reason: String,
    },

    /// Connecting to (or reading from) the server timed out
    ///
    /// Retryable.
    #[error("HTTP GET {url} timed out")]
    Timeout {
        /// The URL being fetched
        url: String,
    },

    /// The redirect chain exceeded the configured limit
    #[error("Too many HTTP redirects while fetching {url} (limit: {limit})")]
    TooManyRedirects {
        /// The URL the chain started from
        url: String,
        /// The redirect limit that was exceeded
        limit: usize,
    },

    /// A 3xx response carried no usable `Location` header
    #[error("HTTP GET {url} returned a redirect to an invalid location: {location:?}")]
    InvalidRedirect {
        /// The URL that produced the redirect
        url: String,
        /// The raw `Location` value, if any
        location: Option<String>,
    },

    /// Any other HTTP outcome (transport failure, unexpected status class)
    #[error("HTTP GET {url} failed due to {reason}")]
    HttpFailed {
        /// The URL being fetched
        url: String,
        /// Description of the failure
        reason: String,
    },

    /// The gzip or tar stream of an archive is corrupt
    #[error("Failed to read archive {name}")]
    Archive {
        /// The archive (file path or URI) being extracted
        name: String,
        /// The underlying decompression/format error
        #[source]
        source: std::io::Error,
    },

    /// A file system operation failed
    #[error("File system error while {operation}: {}", path.display())]
    FileSystem {
        /// What was being done (e.g. "reading cache slot")
        operation: String,
        /// The offending path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Delivered content is not valid UTF-8 text
    #[error("Content of '{source_name}' is not valid UTF-8")]
    InvalidUtf8 {
        /// The source name the content would have been delivered under
        source_name: String,
    },

    /// The inspection tool's configuration file does not exist
    #[error("Configuration file not found: {}", path.display())]
    ConfigFileNotFound {
        /// The configuration path that was looked up
        path: PathBuf,
    },

    /// The inspection tool's configuration file is not valid YAML
    #[error("Invalid configuration file {}: {reason}", path.display())]
    ConfigParse {
        /// The configuration path
        path: PathBuf,
        /// Parser message
        reason: String,
    },

    /// The consumer callback rejected a delivered unit
    #[error(transparent)]
    Consumer(#[from] anyhow::Error),
}

impl ImportError {
    /// Whether the HTTP fetcher may retry the request that produced this error.
    ///
    /// Only timeouts and 4xx/5xx responses are retried; redirect loops, corrupt
    /// payloads and transport failures fail immediately.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::HttpGet { .. } | Self::Timeout { .. })
    }

    /// Build a [`ImportError::FileSystem`] from an I/O error.
    pub fn file_system(
        operation: impl Into<String>,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::FileSystem {
            operation: operation.into(),
            path: path.into(),
            source,
        }
    }
}

/// Result type for import operations.
pub type Result<T> = std::result::Result<T, ImportError>;

/// A user-facing rendering of an error
///
/// Wraps an error message with optional details and a suggestion. The CLI
/// converts every failure through [`user_friendly_error`] and prints it with
/// [`ErrorContext::display`].
///
/// # Examples
///
/// ```rust,no_run
/// use rulepack_cli::core::ErrorContext;
///
/// let context = ErrorContext::new("No such file: patterns/*.yml")
///     .with_suggestion("Check the import path relative to the configuration file")
///     .with_details("Local imports are resolved against the configuration file's directory");
///
/// context.display();
/// ```
#[derive(Debug)]
pub struct ErrorContext {
    /// The primary error message
    pub message: String,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context from a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Display the error context to stderr with terminal colors
    ///
    /// - Error message: Red and bold
    /// - Details: Yellow
    /// - Suggestion: Green
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.message);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Render an error chain as `message: cause: cause`.
fn chain_message(error: &anyhow::Error) -> String {
    error.chain().map(ToString::to_string).collect::<Vec<_>>().join(": ")
}

/// Convert any error to a user-friendly [`ErrorContext`] with actionable suggestions
///
/// Recognizes [`ImportError`] anywhere in the chain (so `anyhow` context added
/// by the CLI does not hide it), plus [`std::io::Error`] and TOML errors from the
/// global configuration. Anything else is rendered with its full cause chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    let message = chain_message(&error);

    if let Some(import_error) = error.chain().find_map(|e| e.downcast_ref::<ImportError>()) {
        return import_error_context(import_error, message);
    }

    let permission_denied = error
        .downcast_ref::<std::io::Error>()
        .is_some_and(|e| e.kind() == std::io::ErrorKind::PermissionDenied);
    if permission_denied {
        return ErrorContext::new(message)
            .with_suggestion("Check file ownership and permissions of the cache and configuration directories");
    }

    if error.downcast_ref::<toml::de::Error>().is_some() {
        return ErrorContext::new(message)
            .with_suggestion("Check the TOML syntax of ~/.rulepack/config.toml")
            .with_details("Unknown keys are rejected; see the [import] table documentation");
    }

    ErrorContext::new(message)
}

fn import_error_context(error: &ImportError, message: String) -> ErrorContext {
    let context = ErrorContext::new(message);
    match error {
        ImportError::UnexpectedSchema { .. } => context
            .with_suggestion("Use a relative path, a glob, a file:// URI or an http(s):// URI")
            .with_details("Only the file, http and https schemes are supported for imports"),
        ImportError::FileNotFound { .. } => context
            .with_suggestion("Check the import path; it is resolved relative to the configuration file's directory"),
        ImportError::InvalidPattern { .. } => {
            context.with_suggestion("Fix the glob syntax (unbalanced brackets or braces)")
        }
        ImportError::HttpGet { status, .. } if *status >= 500 => context
            .with_details("The server kept failing after all retries")
            .with_suggestion("Try again later"),
        ImportError::HttpGet { .. } => {
            context.with_suggestion("Check that the import URL is correct and publicly reachable")
        }
        ImportError::Timeout { .. } | ImportError::HttpFailed { .. } => {
            context.with_suggestion("Check your network connection and proxy settings")
        }
        ImportError::TooManyRedirects { .. } | ImportError::InvalidRedirect { .. } => context
            .with_suggestion("Point the import at the final URL instead of a redirecting one"),
        ImportError::Archive { .. } => context
            .with_details("The downloaded archive is not a valid gzip-compressed tar stream")
            .with_suggestion("Re-run with --force-download to replace the cached copy"),
        ImportError::InvalidUtf8 { .. } => {
            context.with_suggestion("Imported pattern files must be UTF-8 encoded YAML or JSON")
        }
        ImportError::FileSystem { .. } => {
            context.with_suggestion("Check that the path exists and is readable and writable")
        }
        ImportError::ConfigFileNotFound { .. } => {
            context.with_suggestion("Create rulepack.yml or pass --config with the right path")
        }
        ImportError::ConfigParse { .. } => context.with_suggestion("Fix the YAML syntax of the configuration file"),
        ImportError::Consumer(_) => context,
    }
}
