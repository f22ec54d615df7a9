//! Run test utilities

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;

use release_watch::config::WatchConfig;
use release_watch::notify::notifier::{Notification, Notifier};
use release_watch::version::error::{FetchError, NotifyError};
use release_watch::version::fetcher::VersionFetcher;
use release_watch::version::history::JsonFileHistory;
use release_watch::version::types::{Platform, WatchedItem};

/// Fetcher answering from a fixed id → version table.
///
/// Versions can be swapped between runs through [`StaticFetcher::set`].
#[derive(Clone)]
pub struct StaticFetcher {
    platform: Platform,
    versions: Arc<Mutex<HashMap<String, String>>>,
}

impl StaticFetcher {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            versions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn with_version(self, id: &str, version: &str) -> Self {
        self.set(id, version);
        self
    }

    pub fn set(&self, id: &str, version: &str) {
        self.versions
            .lock()
            .unwrap()
            .insert(id.to_string(), version.to_string());
    }

    pub fn remove(&self, id: &str) {
        self.versions.lock().unwrap().remove(id);
    }
}

#[async_trait]
impl VersionFetcher for StaticFetcher {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn fetch_version(&self, item: &WatchedItem) -> Result<String, FetchError> {
        self.versions
            .lock()
            .unwrap()
            .get(&item.id)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(item.id.clone()))
    }
}

/// Notifier that records everything it is asked to send
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

/// Parses a config from JSON, panicking on invalid test input
pub fn config(value: serde_json::Value) -> WatchConfig {
    let config: WatchConfig = serde_json::from_value(value).unwrap();
    config.validate().unwrap();
    config
}

/// History store backed by a file in a fresh temp dir
pub fn create_test_history(initial: Option<&str>) -> (TempDir, PathBuf, JsonFileHistory) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("version_history.json");
    if let Some(content) = initial {
        std::fs::write(&path, content).unwrap();
    }
    let store = JsonFileHistory::new(path.clone());
    (temp_dir, path, store)
}
