//! Global constants used throughout the rulepack codebase.
//!
//! This module contains timeout durations, retry parameters, and other
//! numeric constants shared by the cache, the HTTP fetcher and the import
//! loader. Defining them centrally keeps the defaults of the configuration
//! file and the library in sync.

use std::time::Duration;

/// Default freshness window for downloaded imports (3 minutes).
///
/// A cache slot younger than this is served without touching the network.
pub const DEFAULT_EXPIRES_IN: Duration = Duration::from_secs(3 * 60);

/// Maximum number of HTTP 3xx hops followed for a single GET.
pub const DEFAULT_REDIRECT_LIMIT: usize = 10;

/// Number of retries after the first attempt (3 attempts in total).
///
/// Only timeouts and 4xx/5xx responses are retried.
pub const DEFAULT_MAX_RETRIES: usize = 2;

/// Fixed pause between two attempts of the same GET (1 second).
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Timeout for opening the TCP/TLS connection (30 seconds).
pub const HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for a whole request, including reading the body (60 seconds).
pub const HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// File name of the inspection tool's own configuration.
///
/// Archive members with this basename are never surfaced, so that a pattern
/// pack shipping its own example configuration does not get imported as rules.
pub const DEFAULT_CONFIG_FILE: &str = "rulepack.yml";

/// Filename suffixes that mark a resource as a gzip-compressed tar archive.
pub const ARCHIVE_SUFFIXES: &[&str] = &[".tar.gz", ".tgz"];

/// User agent sent with every HTTP request.
pub const USER_AGENT: &str = concat!("rulepack/", env!("CARGO_PKG_VERSION"));
