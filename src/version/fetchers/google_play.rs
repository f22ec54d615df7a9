//! Google Play version fetcher scraping the store details page
//!
//! The details page embeds its data as nested JS arrays. The current version
//! is the first single-string tuple `[[["<version>"]]` whose value starts with
//! a digit, or the "Varies with device" placeholder.

use std::sync::LazyLock;

use regex::Regex;
use reqwest::Client;
use tracing::debug;

use crate::version::error::FetchError;
use crate::version::fetcher::VersionFetcher;
use crate::version::http::{RetryPolicy, send_with_retry};
use crate::version::types::{Platform, WatchedItem};

const DEFAULT_BASE_URL: &str = "https://play.google.com";

static VERSION_TUPLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\[\[\["((?:\d[^"]*)|(?:Varies with device))"\]\]"#)
        .expect("version tuple pattern is valid")
});

pub struct GooglePlayFetcher {
    client: Client,
    base_url: String,
    retry: RetryPolicy,
}

impl GooglePlayFetcher {
    pub fn new(client: Client, base_url: &str, retry: RetryPolicy) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry,
        }
    }

    pub fn with_defaults(client: Client, retry: RetryPolicy) -> Self {
        Self::new(client, DEFAULT_BASE_URL, retry)
    }
}

/// Extracts the current version from a details page
pub fn parse_play_version(html: &str) -> Option<String> {
    VERSION_TUPLE
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

#[async_trait::async_trait]
impl VersionFetcher for GooglePlayFetcher {
    fn platform(&self) -> Platform {
        Platform::GooglePlay
    }

    async fn fetch_version(&self, item: &WatchedItem) -> Result<String, FetchError> {
        let region = item
            .region
            .as_deref()
            .or(Platform::GooglePlay.default_region())
            .unwrap_or_default();
        let url = format!(
            "{}/store/apps/details?id={}&hl=en&gl={}",
            self.base_url, item.id, region
        );
        debug!("Fetching Google Play page: {}", url);

        let response = send_with_retry(|| self.client.get(&url), &self.retry).await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(format!("{} in {}", item.id, region)));
        }
        if !response.status().is_success() {
            return Err(FetchError::InvalidResponse(format!(
                "Unexpected status: {}",
                response.status()
            )));
        }

        let html = response.text().await?;
        parse_play_version(&html).ok_or_else(|| {
            FetchError::InvalidResponse(format!("no version data on page for {}", item.id))
        })
    }
}
