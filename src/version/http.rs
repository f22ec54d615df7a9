//! Shared HTTP client construction and retry policy for fetchers

use std::time::Duration;

use reqwest::header::{ACCEPT, CACHE_CONTROL, EXPIRES, HeaderMap, HeaderValue, PRAGMA};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tracing::warn;

use crate::config::FetchConfig;
use crate::version::error::FetchError;

/// Browser user agent; store pages serve reduced markup to unknown clients
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Transient statuses worth retrying, including Cloudflare 52x
pub const RETRY_STATUSES: &[u16] = &[500, 502, 503, 504, 520, 521, 522, 524];

/// Bounded retry with exponential backoff
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retries: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (0-based)
    pub fn delay(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(2u32.saturating_pow(attempt))
    }
}

impl From<&FetchConfig> for RetryPolicy {
    fn from(config: &FetchConfig) -> Self {
        Self {
            retries: config.retries,
            backoff: Duration::from_millis(config.backoff_ms),
        }
    }
}

/// Builds the client shared by all fetchers: no-cache headers, browser UA, timeout
pub fn build_client(timeout: Duration) -> Result<Client, FetchError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        CACHE_CONTROL,
        HeaderValue::from_static("no-cache, no-store, must-revalidate"),
    );
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(EXPIRES, HeaderValue::from_static("0"));
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,image/apng,*/*;q=0.8",
        ),
    );

    let client = Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .timeout(timeout)
        .build()?;
    Ok(client)
}

/// Current unix time, appended to URLs to defeat intermediate caches
pub fn cache_buster() -> i64 {
    chrono::Utc::now().timestamp()
}

fn is_retryable_status(status: StatusCode) -> bool {
    RETRY_STATUSES.contains(&status.as_u16())
}

fn is_retryable_error(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect()
}

/// Sends the request built by `build`, retrying transient failures.
///
/// Once retries are exhausted the last response is returned as is, so callers
/// still see the final status.
pub async fn send_with_retry<F>(build: F, policy: &RetryPolicy) -> Result<Response, FetchError>
where
    F: Fn() -> RequestBuilder,
{
    let mut attempt = 0;
    loop {
        let result = build().send().await;
        let retryable = match &result {
            Ok(response) => is_retryable_status(response.status()),
            Err(e) => is_retryable_error(e),
        };

        if !retryable || attempt >= policy.retries {
            return Ok(result?);
        }

        let delay = policy.delay(attempt);
        match &result {
            Ok(response) => warn!(
                "{} returned {}, retry {} after {:?}",
                response.url(),
                response.status(),
                attempt + 1,
                delay
            ),
            Err(e) => warn!("Request failed ({}), retry {} after {:?}", e, attempt + 1, delay),
        }
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}
