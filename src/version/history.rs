//! Persisted version history
//!
//! The history file is a JSON object mapping history keys to
//! `{"latest": .., "prev": ..}` records. Files written by older releases may
//! hold a bare version string instead of a record; those are upgraded while
//! loading so the rest of the crate only ever sees [`VersionRecord`].

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::version::error::HistoryError;

/// Default history file name, relative to the working directory
pub const DEFAULT_HISTORY_FILE: &str = "version_history.json";

/// Last two accepted values for one watched item
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord {
    pub latest: Option<String>,
    /// Value `latest` held before the most recent accepted update
    pub prev: Option<String>,
}

impl VersionRecord {
    pub fn new(latest: Option<&str>, prev: Option<&str>) -> Self {
        Self {
            latest: latest.map(str::to_string),
            prev: prev.map(str::to_string),
        }
    }

    /// Record after accepting `fetched`: the old latest becomes prev
    pub fn advance(&self, fetched: &str) -> Self {
        Self {
            latest: Some(fetched.to_string()),
            prev: self.latest.clone(),
        }
    }
}

/// On-disk shape of a history value
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredValue {
    Legacy(String),
    Record(VersionRecord),
}

impl From<StoredValue> for VersionRecord {
    fn from(value: StoredValue) -> Self {
        match value {
            StoredValue::Legacy(latest) => VersionRecord {
                latest: Some(latest),
                prev: None,
            },
            StoredValue::Record(record) => record,
        }
    }
}

/// History key to record, in file order
pub type History = IndexMap<String, VersionRecord>;

/// Parses history JSON, upgrading legacy bare-string values
pub fn parse_history(content: &str) -> Result<History, HistoryError> {
    let stored: IndexMap<String, StoredValue> = serde_json::from_str(content)?;
    Ok(stored.into_iter().map(|(k, v)| (k, v.into())).collect())
}

/// Trait for loading and persisting the version history
#[cfg_attr(test, automock)]
pub trait HistoryStore: Send + Sync {
    /// Loads the history. Missing or corrupt sources yield an empty history.
    fn load(&self) -> History;

    /// Replaces the persisted history with `history`
    fn save(&self, history: &History) -> Result<(), HistoryError>;
}

/// History stored as a single pretty-printed JSON file
#[derive(Debug, Clone)]
pub struct JsonFileHistory {
    path: PathBuf,
}

impl JsonFileHistory {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn try_load(&self) -> Result<Option<History>, HistoryError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)?;
        parse_history(&content).map(Some)
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl HistoryStore for JsonFileHistory {
    fn load(&self) -> History {
        match self.try_load() {
            Ok(Some(history)) => {
                info!(
                    "Loaded {} history records from {:?}",
                    history.len(),
                    self.path
                );
                history
            }
            Ok(None) => {
                info!("No history at {:?}, starting fresh", self.path);
                History::new()
            }
            Err(e) => {
                warn!(
                    "History at {:?} is unreadable, starting fresh: {}",
                    self.path, e
                );
                History::new()
            }
        }
    }

    fn save(&self, history: &History) -> Result<(), HistoryError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(history)?;
        let temp = self.temp_path();
        fs::write(&temp, json)?;
        // rename is atomic on the same filesystem
        fs::rename(&temp, &self.path)?;

        debug!("Wrote {} history records to {:?}", history.len(), self.path);
        Ok(())
    }
}
