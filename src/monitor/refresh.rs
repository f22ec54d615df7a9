//! Bounded concurrent fetching of one platform batch

use futures::stream::{self, StreamExt};
use tracing::{debug, info};

use crate::version::fetcher::{VersionFetcher, fetch_or_absent};
use crate::version::types::WatchedItem;

/// Fetch every item of one platform batch
///
/// At most `concurrency` requests are in flight at once. Results come back in
/// the order of `items`, whatever order the requests complete in. Failed
/// fetches are logged and yield `None`; they never abort the batch.
pub async fn fetch_batch(
    fetcher: &dyn VersionFetcher,
    items: Vec<WatchedItem>,
    concurrency: usize,
) -> Vec<(WatchedItem, Option<String>)> {
    if items.is_empty() {
        return Vec::new();
    }

    info!(
        "Checking {} {} items ({} concurrent)",
        items.len(),
        fetcher.platform(),
        concurrency
    );

    let results: Vec<_> = stream::iter(items)
        .map(|item| async move {
            let version = fetch_or_absent(fetcher, &item).await;
            (item, version)
        })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let fetched = results.iter().filter(|(_, v)| v.is_some()).count();
    debug!(
        "{} batch done: {}/{} fetched",
        fetcher.platform(),
        fetched,
        results.len()
    );
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::error::FetchError;
    use crate::version::fetcher::MockVersionFetcher;
    use crate::version::types::Platform;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Sleeps longer for earlier items so completion order is reversed
    struct SlowFetcher {
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl VersionFetcher for SlowFetcher {
        fn platform(&self) -> Platform {
            Platform::AppStore
        }

        async fn fetch_version(&self, item: &WatchedItem) -> Result<String, FetchError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            let delay: u64 = item.id.parse().unwrap();
            tokio::time::sleep(Duration::from_millis(delay)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(format!("v{}", item.id))
        }
    }

    fn items(ids: &[&str]) -> Vec<WatchedItem> {
        ids.iter()
            .map(|id| WatchedItem::new(Platform::AppStore, &format!("App {id}"), id, None))
            .collect()
    }

    #[tokio::test]
    async fn fetch_batch_keeps_configured_order_and_bounds_concurrency() {
        let fetcher = SlowFetcher {
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        };

        let results = fetch_batch(&fetcher, items(&["60", "50", "40", "30", "20", "10"]), 2).await;

        let versions: Vec<_> = results.iter().map(|(_, v)| v.clone().unwrap()).collect();
        assert_eq!(versions, vec!["v60", "v50", "v40", "v30", "v20", "v10"]);
        assert!(fetcher.max_in_flight.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn fetch_batch_continues_after_failures() {
        let mut fetcher = MockVersionFetcher::new();
        fetcher.expect_platform().returning(|| Platform::GitHub);
        fetcher
            .expect_fetch_version()
            .withf(|item| item.id == "broken/repo")
            .times(1)
            .returning(|item| Err(FetchError::NotFound(item.id.clone())));
        fetcher
            .expect_fetch_version()
            .withf(|item| item.id == "good/repo")
            .times(1)
            .returning(|_| Ok("v1.0".to_string()));

        let items = vec![
            WatchedItem::new(Platform::GitHub, "Broken", "broken/repo", None),
            WatchedItem::new(Platform::GitHub, "Good", "good/repo", None),
        ];
        let results = fetch_batch(&fetcher, items, 5).await;

        assert_eq!(results[0].1, None);
        assert_eq!(results[1].1, Some("v1.0".to_string()));
    }

    #[tokio::test]
    async fn fetch_batch_handles_empty_item_list() {
        let mut fetcher = MockVersionFetcher::new();
        fetcher.expect_fetch_version().times(0);

        let results = fetch_batch(&fetcher, Vec::new(), 5).await;

        assert!(results.is_empty());
    }
}
