//! Merges fetch results into the next history, the display state and the update buffer

use indexmap::{IndexMap, IndexSet};
use tracing::{debug, info, warn};

use crate::version::checker::{Decision, UpdateChecker};
use crate::version::history::History;
use crate::version::types::{Platform, WatchedItem};

/// Longest feed title printed in logs before truncation
const FEED_LOG_CHARS: usize = 30;

/// Version to display per app and platform
pub type CurrentState = IndexMap<String, IndexMap<Platform, String>>;

/// Platforms with a genuine update, per app, in detection order
pub type UpdateBuffer = IndexMap<String, IndexSet<Platform>>;

/// Everything a run derived from its fetch results
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunState {
    pub history: History,
    pub state: CurrentState,
    pub updates: UpdateBuffer,
}

impl RunState {
    pub fn has_updates(&self) -> bool {
        !self.updates.is_empty()
    }

    /// Number of (app, platform) pairs updated
    pub fn update_count(&self) -> usize {
        self.updates.values().map(IndexSet::len).sum()
    }
}

/// Applies fetch results one at a time, in configured order
pub struct Aggregator<'a> {
    checker: UpdateChecker<'a>,
    previous: &'a History,
    run: RunState,
}

impl<'a> Aggregator<'a> {
    /// Starts from a copy of `previous`, so records nobody touches survive the run
    pub fn new(checker: UpdateChecker<'a>, previous: &'a History) -> Self {
        Self {
            checker,
            previous,
            run: RunState {
                history: previous.clone(),
                ..RunState::default()
            },
        }
    }

    /// Applies one fetch result. Returns the decision when a value was fetched.
    pub fn observe(&mut self, item: &WatchedItem, fetched: Option<&str>) -> Option<Decision> {
        let previous = self.previous;
        let key = item.history_key();
        let existing = previous.get(&key);
        let stored = existing.and_then(|r| r.latest.as_deref());
        let display = self.run.state.entry(item.name.clone()).or_default();

        let Some(fetched) = fetched else {
            // Keep a fresher value another item already produced for this app
            if let Some(latest) = stored {
                display
                    .entry(item.platform)
                    .or_insert_with(|| latest.to_string());
            }
            info!(
                "[{}] ({}) unavailable, keeping stored {}",
                item.name,
                item.platform,
                stored.unwrap_or("-")
            );
            return None;
        };

        display.insert(item.platform, fetched.to_string());
        info!(
            "[{}] ({}) fetched: {} | stored: {}",
            item.name,
            item.platform,
            log_value(item.platform, fetched),
            stored.unwrap_or("-")
        );

        let decision = self
            .checker
            .classify(Some(fetched), existing, &item.name, item.platform);

        match decision {
            Decision::Baseline | Decision::Updated => {
                self.run
                    .updates
                    .entry(item.name.clone())
                    .or_default()
                    .insert(item.platform);
                let record = existing.cloned().unwrap_or_default().advance(fetched);
                self.run.history.insert(key, record);
                info!(
                    "[{}] ({}) update accepted: {} -> {}",
                    item.name,
                    item.platform,
                    stored.unwrap_or("-"),
                    log_value(item.platform, fetched)
                );
            }
            Decision::Rollback => {
                warn!(
                    "[{}] ({}) {} matches the version before {}, treating as stale cache",
                    item.name,
                    item.platform,
                    log_value(item.platform, fetched),
                    stored.unwrap_or("-")
                );
            }
            Decision::NoChange => {
                debug!("[{}] ({}) unchanged", item.name, item.platform);
            }
            Decision::Unusable => {
                info!(
                    "[{}] ({}) no usable version in {:?}",
                    item.name, item.platform, fetched
                );
            }
        }

        Some(decision)
    }

    pub fn finish(self) -> RunState {
        self.run
    }
}

/// Truncates feed titles for log lines
fn log_value(platform: Platform, value: &str) -> String {
    if platform.is_feed() && value.chars().count() > FEED_LOG_CHARS {
        let head: String = value.chars().take(FEED_LOG_CHARS).collect();
        format!("{head}...")
    } else {
        value.to_string()
    }
}
