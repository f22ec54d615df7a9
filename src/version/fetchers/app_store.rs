//! App Store version fetcher backed by the iTunes lookup API

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::version::error::FetchError;
use crate::version::fetcher::VersionFetcher;
use crate::version::http::{RetryPolicy, cache_buster, send_with_retry};
use crate::version::types::{Platform, WatchedItem};

const DEFAULT_BASE_URL: &str = "https://itunes.apple.com";

/// Response from the iTunes lookup API
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupResponse {
    result_count: u32,
    results: Vec<LookupResult>,
}

#[derive(Debug, Deserialize)]
struct LookupResult {
    version: String,
}

pub struct AppStoreFetcher {
    client: Client,
    base_url: String,
    retry: RetryPolicy,
}

impl AppStoreFetcher {
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

#[async_trait::async_trait]
impl VersionFetcher for AppStoreFetcher {
    fn platform(&self) -> Platform {
        Platform::AppStore
    }

    async fn fetch_version(&self, item: &WatchedItem) -> Result<String, FetchError> {
        let region = item
            .region
            .as_deref()
            .or(Platform::AppStore.default_region())
            .unwrap_or_default();
        let url = format!(
            "{}/{}/lookup?id={}&t={}",
            self.base_url,
            region,
            item.id,
            cache_buster()
        );
        debug!("Fetching App Store lookup: {}", url);

        let response = send_with_retry(|| self.client.get(&url), &self.retry).await?;

        if !response.status().is_success() {
            return Err(FetchError::InvalidResponse(format!(
                "Unexpected status: {}",
                response.status()
            )));
        }

        let lookup: LookupResponse = response
            .json()
            .await
            .map_err(|e| FetchError::InvalidResponse(e.to_string()))?;

        if lookup.result_count == 0 {
            return Err(FetchError::NotFound(format!("{} in {}", item.id, region)));
        }

        lookup
            .results
            .into_iter()
            .next()
            .map(|r| r.version)
            .ok_or_else(|| FetchError::InvalidResponse("resultCount > 0 but no results".into()))
    }
}
