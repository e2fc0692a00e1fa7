//! HTTP retrieval of remote imports.
//!
//! This module only covers what remote imports need: a plain GET with no
//! custom headers and no authentication, manual redirect following and a
//! small fixed retry budget. It is split in two layers:
//!
//! - [`HttpClient`] performs exactly one request and never follows redirects.
//!   [`ReqwestClient`] is the production implementation; tests substitute
//!   scripted clients.
//! - [`HttpFetcher`] drives a client through the redirect chain and the retry
//!   policy, classifying every response with [`ResponseClass`].

mod fetcher;

pub use fetcher::HttpFetcher;

use crate::constants::{HTTP_CONNECT_TIMEOUT, HTTP_REQUEST_TIMEOUT, USER_AGENT};
use crate::core::{ImportError, Result};
use reqwest::header::LOCATION;
use std::future::Future;
use std::time::Duration;
use url::Url;

/// A single HTTP response, with the body fully read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// URL the request was sent to
    pub url: Url,
    /// Status code
    pub status: u16,
    /// Status message (canonical reason phrase)
    pub reason: String,
    /// Raw `Location` header, if present
    pub location: Option<String>,
    /// Response body
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Builds a response with the canonical reason phrase for `status`.
    pub fn new(url: Url, status: u16, body: impl Into<Vec<u8>>) -> Self {
        let reason = reqwest::StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("")
            .to_string();
        Self {
            url,
            status,
            reason,
            location: None,
            body: body.into(),
        }
    }

    /// Sets the `Location` header.
    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Classifies the status code.
    #[must_use]
    pub const fn class(&self) -> ResponseClass {
        ResponseClass::of(self.status)
    }
}

/// Outcome class of an HTTP response, which drives redirect and retry handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseClass {
    /// 2xx: the body is the resource
    Success,
    /// 3xx: follow `Location`
    Redirect,
    /// 4xx: retryable failure
    ClientError,
    /// 5xx: retryable failure
    ServerError,
    /// Anything else (1xx, out-of-range codes): non-retryable failure
    Other,
}

impl ResponseClass {
    /// Classifies a status code.
    #[must_use]
    pub const fn of(status: u16) -> Self {
        match status {
            200..=299 => Self::Success,
            300..=399 => Self::Redirect,
            400..=499 => Self::ClientError,
            500..=599 => Self::ServerError,
            _ => Self::Other,
        }
    }
}

/// Performs one GET request without following redirects.
///
/// Transport failures must already be classified: timeouts as
/// [`ImportError::Timeout`] (retried), everything else as
/// [`ImportError::HttpFailed`] (not retried). Non-2xx statuses are *not*
/// errors at this layer; they are returned as responses.
pub trait HttpClient: Send + Sync {
    /// Sends `GET url` and reads the whole body.
    fn get(&self, url: &Url) -> impl Future<Output = Result<HttpResponse>> + Send;
}

/// [`HttpClient`] backed by `reqwest`.
///
/// The underlying client has automatic redirects disabled so that
/// [`HttpFetcher`] can enforce its own redirect limit.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Creates a client with the default connect and request timeouts.
    pub fn new() -> Result<Self> {
        Self::with_timeouts(HTTP_CONNECT_TIMEOUT, HTTP_REQUEST_TIMEOUT)
    }

    /// Creates a client with explicit timeouts.
    pub fn with_timeouts(connect_timeout: Duration, request_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ImportError::HttpFailed {
                url: String::new(),
                reason: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self { client })
    }

    fn transport_error(url: &Url, error: &reqwest::Error) -> ImportError {
        if error.is_timeout() {
            ImportError::Timeout {
                url: url.to_string(),
            }
        } else {
            ImportError::HttpFailed {
                url: url.to_string(),
                reason: error.to_string(),
            }
        }
    }
}

impl HttpClient for ReqwestClient {
    async fn get(&self, url: &Url) -> Result<HttpResponse> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| Self::transport_error(url, &e))?;

        let status = response.status();
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let body = response.bytes().await.map_err(|e| Self::transport_error(url, &e))?;

        Ok(HttpResponse {
            url: url.clone(),
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("").to_string(),
            location,
            body: body.to_vec(),
        })
    }
}
