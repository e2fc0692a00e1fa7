//! Redirect and retry handling around a single [`HttpClient`].

use super::{HttpClient, ReqwestClient, ResponseClass};
use crate::constants::{DEFAULT_MAX_RETRIES, DEFAULT_REDIRECT_LIMIT, DEFAULT_RETRY_DELAY};
use crate::core::{ImportError, Result};
use std::time::Duration;
use tokio_retry::strategy::FixedInterval;
use tracing::{debug, info};
use url::Url;

/// Fetches a URL, following redirects and retrying transient failures.
///
/// # Retry Strategy
///
/// - Retried: [`ImportError::HttpGet`] (4xx/5xx) and [`ImportError::Timeout`]
/// - Budget: `max_retries` retries after the first attempt (default 2, so 3 attempts)
/// - Delay: fixed, `retry_delay` between attempts (default 1 second)
/// - Scope: a retry restarts the whole logical GET, redirect chain included
///
/// Every other failure, including exceeding the redirect limit, propagates
/// immediately. When the budget is exhausted the last error is returned.
///
/// # Examples
///
/// ```rust,no_run
/// use rulepack_cli::http::HttpFetcher;
/// use url::Url;
///
/// # async fn example() -> rulepack_cli::core::Result<()> {
/// let fetcher = HttpFetcher::with_defaults()?;
/// let body = fetcher.get(&Url::parse("https://example.test/rules.yml").unwrap()).await?;
/// println!("{} bytes", body.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpFetcher<C = ReqwestClient> {
    client: C,
    redirect_limit: usize,
    max_retries: usize,
    retry_delay: Duration,
}

impl HttpFetcher<ReqwestClient> {
    /// Creates a fetcher over a [`ReqwestClient`] with default limits.
    pub fn with_defaults() -> Result<Self> {
        Ok(Self::new(ReqwestClient::new()?))
    }
}

impl<C: HttpClient> HttpFetcher<C> {
    /// Creates a fetcher over `client` with default limits.
    pub fn new(client: C) -> Self {
        Self {
            client,
            redirect_limit: DEFAULT_REDIRECT_LIMIT,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    /// Sets the maximum number of redirect hops.
    #[must_use]
    pub fn with_redirect_limit(mut self, redirect_limit: usize) -> Self {
        self.redirect_limit = redirect_limit;
        self
    }

    /// Sets the retry budget (retries after the first attempt).
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the pause between attempts.
    #[must_use]
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Returns the underlying client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Performs a GET against `url` and returns the final body.
    pub async fn get(&self, url: &Url) -> Result<Vec<u8>> {
        let mut delays = FixedInterval::new(self.retry_delay).take(self.max_retries);
        let mut retry_count = 0;

        loop {
            match self.get_following_redirects(url).await {
                Ok(body) => return Ok(body),
                Err(err) if err.is_retryable() => match delays.next() {
                    Some(delay) => {
                        retry_count += 1;
                        info!("Retry #{retry_count} - HTTP GET {url} due to {err}...");
                        tokio::time::sleep(delay).await;
                    }
                    None => return Err(err),
                },
                Err(err) => return Err(err),
            }
        }
    }

    /// One attempt: follows up to `redirect_limit` redirect hops.
    async fn get_following_redirects(&self, url: &Url) -> Result<Vec<u8>> {
        let mut current = url.clone();
        let mut remaining = self.redirect_limit;

        loop {
            let response = self.client.get(&current).await?;

            match response.class() {
                ResponseClass::Success => return Ok(response.body),
                ResponseClass::Redirect => {
                    if remaining == 0 {
                        return Err(ImportError::TooManyRedirects {
                            url: url.to_string(),
                            limit: self.redirect_limit,
                        });
                    }
                    remaining -= 1;

                    let next = response
                        .location
                        .as_deref()
                        .and_then(|location| current.join(location).ok())
                        .ok_or_else(|| ImportError::InvalidRedirect {
                            url: current.to_string(),
                            location: response.location.clone(),
                        })?;
                    debug!("HTTP GET {} => {} redirect to {}", current, response.status, next);
                    current = next;
                }
                ResponseClass::ClientError | ResponseClass::ServerError => {
                    return Err(ImportError::HttpGet {
                        url: current.to_string(),
                        status: response.status,
                        reason: response.reason,
                    });
                }
                ResponseClass::Other => {
                    return Err(ImportError::HttpFailed {
                        url: current.to_string(),
                        reason: format!("unexpected response status {}", response.status),
                    });
                }
            }
        }
    }
}
