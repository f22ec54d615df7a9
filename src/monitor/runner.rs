//! Orchestrates one monitoring run

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::config::WatchConfig;
use crate::monitor::aggregate::{Aggregator, RunState};
use crate::monitor::refresh::fetch_batch;
use crate::notify::format::build_notifications;
use crate::notify::notifier::{Notification, Notifier, deliver_all};
use crate::version::checker::UpdateChecker;
use crate::version::fetcher::VersionFetcher;
use crate::version::history::{History, HistoryStore};
use crate::version::normalize::RejectRules;
use crate::version::types::Platform;

/// Outcome of [`Monitor::run`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    /// Number of (app, platform) pairs with an accepted update
    pub updates: usize,
    pub notifications: Vec<Notification>,
    pub history_written: bool,
    pub delivered: usize,
}

/// Watches every configured platform using one fetcher per platform
pub struct Monitor {
    config: WatchConfig,
    reject: RejectRules,
    fetchers: HashMap<Platform, Arc<dyn VersionFetcher>>,
}

impl Monitor {
    pub fn new(config: WatchConfig) -> Self {
        let reject = config.reject_rules();
        Self {
            config,
            reject,
            fetchers: HashMap::new(),
        }
    }

    /// Registers `fetcher` for the platform it reports
    pub fn with_fetcher(mut self, fetcher: Arc<dyn VersionFetcher>) -> Self {
        self.fetchers.insert(fetcher.platform(), fetcher);
        self
    }

    pub fn config(&self) -> &WatchConfig {
        &self.config
    }

    /// Fetches every platform batch in canonical order and folds the results
    /// into a new history, display state and update buffer.
    pub async fn check(&self, previous: &History) -> RunState {
        let checker = UpdateChecker::new(self.config.policy(), &self.reject);
        let mut aggregator = Aggregator::new(checker, previous);

        for platform in Platform::ALL {
            let items = self.config.watchlist.items(platform);
            if items.is_empty() {
                continue;
            }

            let Some(fetcher) = self.fetchers.get(&platform) else {
                warn!(
                    "No fetcher registered for {}, skipping {} items",
                    platform,
                    items.len()
                );
                for item in &items {
                    aggregator.observe(item, None);
                }
                continue;
            };

            let results =
                fetch_batch(fetcher.as_ref(), items, self.config.fetch.concurrency).await;
            for (item, fetched) in &results {
                aggregator.observe(item, fetched.as_deref());
            }
        }

        aggregator.finish()
    }

    /// Notifications for the updates of `run`, one per group
    pub fn notifications(&self, run: &RunState) -> Vec<Notification> {
        build_notifications(
            &self.config.policy(),
            &self.config.notification,
            &run.updates,
            &run.state,
        )
    }

    /// Performs one full run.
    ///
    /// History is written only when at least one update was accepted, and
    /// never in dry-run mode. Without a notifier the notifications are built
    /// and logged but not sent.
    pub async fn run(
        &self,
        store: &dyn HistoryStore,
        notifier: Option<&dyn Notifier>,
        dry_run: bool,
    ) -> RunReport {
        let previous = store.load();
        let run = self.check(&previous).await;

        if !run.has_updates() {
            info!("No updates detected, history left untouched");
            return RunReport::default();
        }

        let notifications = self.notifications(&run);
        let mut report = RunReport {
            updates: run.update_count(),
            notifications,
            ..RunReport::default()
        };
        info!(
            "{} updates across {} notification groups",
            report.updates,
            report.notifications.len()
        );

        if dry_run {
            for notification in &report.notifications {
                info!(
                    "[dry run] {}:\n{}",
                    notification.title, notification.body
                );
            }
            return report;
        }

        report.history_written = store
            .save(&run.history)
            .inspect_err(|e| error!("Failed to save history: {}", e))
            .is_ok();

        match notifier {
            Some(notifier) => {
                let interval = Duration::from_millis(self.config.notification.interval_ms);
                report.delivered = deliver_all(notifier, &report.notifications, interval).await;
            }
            None => error!(
                "No push key configured, dropping {} notifications",
                report.notifications.len()
            ),
        }

        report
    }
}
