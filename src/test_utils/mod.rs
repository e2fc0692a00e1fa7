//! Test utilities for rulepack
//!
//! Helpers shared by unit tests (and, with the `test-utils` feature, by
//! downstream crates):
//! - Logging initialization that is safe to call from every test
//! - [`ScriptedClient`], an [`HttpClient`] that replays canned responses and
//!   counts requests, so cache hits and retries can be asserted without a network
//! - [`build_tar_gz`] to assemble pattern-pack archives in memory
//!
//! # Example
//!
//! ```rust,ignore
//! use rulepack_cli::http::{HttpFetcher, HttpResponse};
//! use rulepack_cli::test_utils::ScriptedClient;
//! use url::Url;
//!
//! # async fn example() {
//! let client = ScriptedClient::new();
//! let url = Url::parse("https://example.test/rules.yml").unwrap();
//! client.route(url.as_str(), HttpResponse::new(url.clone(), 200, "rules: []"));
//!
//! let fetcher = HttpFetcher::new(client);
//! fetcher.get(&url).await.unwrap();
//! assert_eq!(fetcher.client().calls(), 1);
//! # }
//! ```

use crate::core::{ImportError, Result};
use crate::http::{HttpClient, HttpResponse};
use flate2::Compression;
use flate2::write::GzEncoder;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use tracing::Level;
use tracing_subscriber::EnvFilter;
use url::Url;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Initializes the tracing subscriber only once regardless of how many times
/// it's called. Respects `RUST_LOG` if set, or uses the provided level; with
/// neither, logging stays off.
///
/// ```bash
/// RUST_LOG=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer() // Important: uses test-compatible writer
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}

#[derive(Debug, Clone)]
enum Scripted {
    Responses(Vec<HttpResponse>),
    Timeout,
}

#[derive(Debug, Default)]
struct ScriptState {
    routes: HashMap<String, Scripted>,
    calls: HashMap<String, usize>,
}

/// An [`HttpClient`] that replays scripted responses per URL.
///
/// A route registered with a sequence returns its responses in order and then
/// keeps repeating the last one. Unrouted URLs answer `404 Not Found`.
/// Clones share state, so a clone handed to a loader can be inspected later.
#[derive(Debug, Clone, Default)]
pub struct ScriptedClient {
    state: Arc<Mutex<ScriptState>>,
    total: Arc<AtomicUsize>,
}

impl ScriptedClient {
    /// Creates a client with no routes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers every request for `url` with `response`.
    pub fn route(&self, url: &str, response: HttpResponse) {
        self.route_sequence(url, vec![response]);
    }

    /// Answers successive requests for `url` with `responses`, repeating the last one.
    pub fn route_sequence(&self, url: &str, responses: Vec<HttpResponse>) {
        let mut state = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        state.routes.insert(url.to_string(), Scripted::Responses(responses));
    }

    /// Makes every request for `url` time out.
    pub fn fail_with_timeout(&self, url: &str) {
        let mut state = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        state.routes.insert(url.to_string(), Scripted::Timeout);
    }

    /// Total number of requests served.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }

    /// Number of requests served for `url`.
    #[must_use]
    pub fn calls_to(&self, url: &str) -> usize {
        let state = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        state.calls.get(url).copied().unwrap_or(0)
    }

    fn respond(&self, url: &Url) -> Result<HttpResponse> {
        self.total.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let served = {
            let count = state.calls.entry(url.to_string()).or_insert(0);
            *count += 1;
            *count
        };

        match state.routes.get(url.as_str()) {
            Some(Scripted::Timeout) => Err(ImportError::Timeout {
                url: url.to_string(),
            }),
            Some(Scripted::Responses(responses)) if !responses.is_empty() => {
                let index = (served - 1).min(responses.len() - 1);
                Ok(responses[index].clone())
            }
            _ => Ok(HttpResponse::new(url.clone(), 404, "")),
        }
    }
}

impl HttpClient for ScriptedClient {
    async fn get(&self, url: &Url) -> Result<HttpResponse> {
        self.respond(url)
    }
}

/// Builds an in-memory `.tar.gz` archive from `(path, content)` pairs, in order.
///
/// # Panics
///
/// Panics if the archive cannot be assembled (never for in-memory buffers).
#[must_use]
pub fn build_tar_gz(files: &[(&str, &str)]) -> Vec<u8> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);

    for (path, content) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, path, content.as_bytes())
            .expect("failed to append archive entry");
    }

    builder
        .into_inner()
        .and_then(GzEncoder::finish)
        .expect("failed to finish archive")
}
