//! GitHub latest-release fetcher with a tag fallback

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::version::error::FetchError;
use crate::version::fetcher::VersionFetcher;
use crate::version::http::{RetryPolicy, cache_buster, send_with_retry};
use crate::version::types::{Platform, WatchedItem};

/// Default base URL for GitHub API
const DEFAULT_BASE_URL: &str = "https://api.github.com";

/// Response from GitHub latest release API
#[derive(Debug, Deserialize)]
struct Release {
    tag_name: String,
}

/// Response item from GitHub tags API
#[derive(Debug, Deserialize)]
struct Tag {
    name: String,
}

/// Fetcher for repositories' latest release, or newest tag when there are no releases
pub struct GitHubFetcher {
    client: Client,
    base_url: String,
    token: Option<String>,
    retry: RetryPolicy,
}

impl GitHubFetcher {
    pub fn new(client: Client, base_url: &str, retry: RetryPolicy) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
            retry,
        }
    }

    pub fn with_defaults(client: Client, retry: RetryPolicy) -> Self {
        Self::new(client, DEFAULT_BASE_URL, retry)
    }

    /// Authenticates requests, raising the API rate limit
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.is_empty());
        self
    }

    fn request(&self, url: &str) -> RequestBuilder {
        let request = self
            .client
            .get(url)
            .header("Accept", "application/vnd.github+json");
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn get(&self, url: &str) -> Result<Response, FetchError> {
        debug!("Fetching GitHub API: {}", url);
        let response = send_with_retry(|| self.request(url), &self.retry).await?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            return Err(FetchError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        Ok(response)
    }

    async fn latest_tag(&self, repo: &str) -> Result<String, FetchError> {
        let url = format!("{}/repos/{}/tags?t={}", self.base_url, repo, cache_buster());
        let response = self.get(&url).await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(repo.to_string()));
        }
        if !response.status().is_success() {
            warn!("GitHub API returned status {}: {}", response.status(), url);
            return Err(FetchError::InvalidResponse(format!(
                "Unexpected status: {}",
                response.status()
            )));
        }

        let tags: Vec<Tag> = response
            .json()
            .await
            .map_err(|e| FetchError::InvalidResponse(e.to_string()))?;

        tags.into_iter()
            .next()
            .map(|t| t.name)
            .ok_or_else(|| FetchError::NotFound(format!("{} has no releases or tags", repo)))
    }
}

#[async_trait::async_trait]
impl VersionFetcher for GitHubFetcher {
    fn platform(&self) -> Platform {
        Platform::GitHub
    }

    async fn fetch_version(&self, item: &WatchedItem) -> Result<String, FetchError> {
        let url = format!(
            "{}/repos/{}/releases/latest?t={}",
            self.base_url,
            item.id,
            cache_buster()
        );
        let response = self.get(&url).await?;

        // Repositories without releases answer 404 here
        if response.status() == StatusCode::NOT_FOUND {
            debug!("No releases for {}, falling back to tags", item.id);
            return self.latest_tag(&item.id).await;
        }

        if !response.status().is_success() {
            warn!("GitHub API returned status {}: {}", response.status(), url);
            return Err(FetchError::InvalidResponse(format!(
                "Unexpected status: {}",
                response.status()
            )));
        }

        let release: Release = response.json().await.map_err(|e| {
            warn!("Failed to parse GitHub release response: {}", e);
            FetchError::InvalidResponse(e.to_string())
        })?;

        Ok(release.tag_name)
    }
}
