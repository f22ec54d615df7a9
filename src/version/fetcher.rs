//! Fetcher trait for reading the current version of a watched item

#[cfg(test)]
use mockall::automock;
use tracing::warn;

use crate::version::error::FetchError;
use crate::version::types::{Platform, WatchedItem};

/// Trait for fetching the current version of an item from one platform
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait VersionFetcher: Send + Sync {
    /// Returns the platform this implementation handles
    fn platform(&self) -> Platform;

    /// Fetches the raw version string currently published for `item`
    ///
    /// # Returns
    /// * `Ok(String)` - Version, tag name or feed entry title, untrimmed
    /// * `Err(FetchError)` - If the request, the status or the payload is unusable
    async fn fetch_version(&self, item: &WatchedItem) -> Result<String, FetchError>;
}

/// Fetches `item`, logging any failure and mapping it to `None`
pub async fn fetch_or_absent(fetcher: &dyn VersionFetcher, item: &WatchedItem) -> Option<String> {
    fetcher
        .fetch_version(item)
        .await
        .inspect_err(|e| {
            warn!(
                "[{}] ({}) fetch failed for {}: {}",
                item.name, item.platform, item.id, e
            )
        })
        .ok()
}
