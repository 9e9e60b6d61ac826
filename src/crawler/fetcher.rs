//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the shared HTTP client with the crawler's user agent
//! - Cancellation-aware GET requests for page content
//! - Retry with linear backoff for contexts without a cancellation token
//! - Error classification (timeout vs. everything else)

use crate::config::UserAgentConfig;
use crate::{FetchError, FetchResult};
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Maximum number of attempts made by [`Fetcher::get_with_retry`]
pub const MAX_ATTEMPTS: u32 = 3;

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const ACCEPT_LANGUAGE_VALUE: &str = "en-US,en;q=0.5";

/// Builds an HTTP client with proper configuration
///
/// The client is shared by every worker; reqwest pools connections
/// internally, so clones are cheap handles to the same pool.
///
/// # Example
///
/// ```no_run
/// use product_scout::config::UserAgentConfig;
/// use product_scout::crawler::build_http_client;
/// use std::time::Duration;
///
/// let config = UserAgentConfig::default();
/// let client = build_http_client(&config, Duration::from_secs(10)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .pool_idle_timeout(Duration::from_secs(30))
        .pool_max_idle_per_host(20)
        .gzip(true)
        .brotli(true)
        .build()
}

/// GET-only HTTP fetcher over a shared client
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    timeout: Duration,
    retry_backoff: Duration,
}

impl Fetcher {
    /// Creates a fetcher whose requests use `timeout` as their deadline
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self {
            client,
            timeout,
            retry_backoff: Duration::from_secs(1),
        }
    }

    /// Returns a fetcher sharing this one's connection pool with a different deadline
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        Self {
            client: self.client.clone(),
            timeout,
            retry_backoff: self.retry_backoff,
        }
    }

    /// Sets the backoff unit used between retries (attempt × unit)
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    /// Fetches a URL and returns its body, abandoning the request on cancellation
    ///
    /// | Outcome | Error |
    /// |---------|-------|
    /// | deadline expired | `FetchError::Timeout` |
    /// | network/transport failure | `FetchError::RequestFailed` |
    /// | status other than 200 | `FetchError::Status` |
    /// | token cancelled first | `FetchError::Cancelled` |
    pub async fn fetch(&self, url: &str, cancel: &CancellationToken) -> FetchResult<String> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(FetchError::Cancelled { url: url.to_string() }),
            result = self.get(url) => result,
        }
    }

    /// Fetches a URL, retrying only timeout-class failures
    ///
    /// Makes at most [`MAX_ATTEMPTS`] attempts, sleeping `attempt × backoff`
    /// after each timed-out attempt. Any other error is returned immediately.
    pub async fn get_with_retry(&self, url: &str) -> FetchResult<String> {
        let mut attempt = 1;

        loop {
            match self.get(url).await {
                Err(e) if e.is_timeout() && attempt < MAX_ATTEMPTS => {
                    let backoff = self.retry_backoff * attempt;
                    tracing::warn!(
                        url = %url,
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        "Fetch timed out, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    async fn get(&self, url: &str) -> FetchResult<String> {
        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .header(ACCEPT, ACCEPT_HTML)
            .header(ACCEPT_LANGUAGE, ACCEPT_LANGUAGE_VALUE)
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| classify_error(url, e))
    }
}

/// Maps a reqwest error onto the fetch taxonomy
fn classify_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::RequestFailed {
            url: url.to_string(),
            source: error,
        }
    }
}
