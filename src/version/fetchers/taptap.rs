//! TapTap version fetcher scraping the app page's structured data

use std::sync::LazyLock;

use regex::Regex;
use reqwest::Client;
use tracing::debug;

use crate::version::error::FetchError;
use crate::version::fetcher::VersionFetcher;
use crate::version::http::{RetryPolicy, cache_buster, send_with_retry};
use crate::version::types::{Platform, WatchedItem};

const DEFAULT_BASE_URL: &str = "https://www.taptap.cn";

/// `softwareVersion` field of the page's JSON-LD block
static SOFTWARE_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""softwareVersion"\s*:\s*"([^"]+)""#).expect("softwareVersion pattern is valid")
});

pub struct TapTapFetcher {
    client: Client,
    base_url: String,
    retry: RetryPolicy,
}

impl TapTapFetcher {
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

/// Extracts the advertised version from a TapTap app page
pub fn parse_software_version(html: &str) -> Option<String> {
    SOFTWARE_VERSION
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

#[async_trait::async_trait]
impl VersionFetcher for TapTapFetcher {
    fn platform(&self) -> Platform {
        Platform::TapTap
    }

    async fn fetch_version(&self, item: &WatchedItem) -> Result<String, FetchError> {
        let url = format!("{}/app/{}?_={}", self.base_url, item.id, cache_buster());
        debug!("Fetching TapTap page: {}", url);

        let response = send_with_retry(|| self.client.get(&url), &self.retry).await?;

        if response.status() != reqwest::StatusCode::OK {
            return Err(FetchError::InvalidResponse(format!(
                "Unexpected status: {}",
                response.status()
            )));
        }

        let html = response.text().await?;
        parse_software_version(&html).ok_or_else(|| {
            FetchError::InvalidResponse(format!("no softwareVersion on page for {}", item.id))
        })
    }
}
