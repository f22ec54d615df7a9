use std::collections::HashMap;
use std::path::{Path, PathBuf};

use regex::{Regex, RegexBuilder};
use serde::Deserialize;

use crate::version::error::ConfigError;
use crate::version::normalize::{DEFAULT_REJECT_MARKER, RejectRules};
use crate::version::policy::{GroupTable, Overrides, PolicyResolver, SuffixDisplay};
use crate::version::types::{Platform, WatchedItem};

// =============================================================================
// Fetch and delivery constants
// =============================================================================

/// Concurrent fetches within one platform batch
pub const DEFAULT_FETCH_CONCURRENCY: usize = 5;

/// Per-request network timeout in milliseconds
pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 10_000;

/// Retries for transient HTTP failures
pub const DEFAULT_FETCH_RETRIES: u32 = 3;

/// Base backoff in milliseconds, doubled on every retry
pub const DEFAULT_FETCH_BACKOFF_MS: u64 = 500;

/// Pause between successive notification sends, for push rate limits
pub const DEFAULT_NOTIFY_INTERVAL_MS: u64 = 1_000;

/// Group collecting updated apps that no configured group lists
pub const DEFAULT_GROUP: &str = "Other";

pub const DEFAULT_BARK_SERVER: &str = "https://api.day.app";

/// Environment variable holding the Bark device key
pub const BARK_KEY_ENV: &str = "BARK_KEY";

/// Environment variable holding an optional GitHub API token
pub const GITHUB_TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Top-level configuration file
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct WatchConfig {
    pub watchlist: Watchlist,
    pub build_check: Overrides<bool>,
    pub suffix: Overrides<SuffixDisplay>,
    /// Feed entry title regexes keyed by app name
    pub feed_filters: HashMap<String, String>,
    /// Case-insensitive substrings marking a fetched value as unusable
    pub reject_markers: Vec<String>,
    pub notification: NotificationConfig,
    pub fetch: FetchConfig,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            watchlist: Watchlist::default(),
            build_check: Overrides::default(),
            suffix: Overrides::default(),
            feed_filters: HashMap::new(),
            reject_markers: vec![DEFAULT_REJECT_MARKER.to_string()],
            notification: NotificationConfig::default(),
            fetch: FetchConfig::default(),
        }
    }
}

/// Watched items per platform
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Watchlist(HashMap<Platform, Vec<WatchEntry>>);

/// One configured watchlist entry
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct WatchEntry {
    /// Application name, must be identical across platforms
    pub name: String,
    /// App id, package name, `owner/repo` or feed URL
    pub id: String,
    #[serde(default)]
    pub region: Option<String>,
}

impl Watchlist {
    /// Items configured for `platform`, in configured order
    pub fn items(&self, platform: Platform) -> Vec<WatchedItem> {
        self.0
            .get(&platform)
            .map(|entries| {
                entries
                    .iter()
                    .map(|e| WatchedItem::new(platform, &e.name, &e.id, e.region.as_deref()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<HashMap<Platform, Vec<WatchEntry>>> for Watchlist {
    fn from(entries: HashMap<Platform, Vec<WatchEntry>>) -> Self {
        Self(entries)
    }
}

/// Notification grouping, branding and transport settings
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct NotificationConfig {
    pub groups: GroupTable,
    pub default_group: String,
    /// Icon URL per group
    pub icons: HashMap<String, String>,
    pub default_icon: Option<String>,
    /// Image URL per app, shared only when every app in a batch agrees
    pub images: HashMap<String, String>,
    /// Archive label per group
    pub archive_labels: HashMap<String, String>,
    pub interval_ms: u64,
    /// Bark server base URL
    pub server: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            groups: GroupTable::default(),
            default_group: DEFAULT_GROUP.to_string(),
            icons: HashMap::new(),
            default_icon: None,
            images: HashMap::new(),
            archive_labels: HashMap::new(),
            interval_ms: DEFAULT_NOTIFY_INTERVAL_MS,
            server: DEFAULT_BARK_SERVER.to_string(),
        }
    }
}

/// HTTP fetch settings
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct FetchConfig {
    pub concurrency: usize,
    pub timeout_ms: u64,
    pub retries: u32,
    pub backoff_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_FETCH_CONCURRENCY,
            timeout_ms: DEFAULT_FETCH_TIMEOUT_MS,
            retries: DEFAULT_FETCH_RETRIES,
            backoff_ms: DEFAULT_FETCH_BACKOFF_MS,
        }
    }
}

impl WatchConfig {
    /// Reads, parses and validates the config file at `path`
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: WatchConfig =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fetch.concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        self.compile_feed_filters()?;
        Ok(())
    }

    /// Compiles feed filters as case-insensitive regexes
    pub fn compile_feed_filters(&self) -> Result<HashMap<String, Regex>, ConfigError> {
        self.feed_filters
            .iter()
            .map(|(name, pattern)| {
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map(|re| (name.clone(), re))
                    .map_err(|source| ConfigError::InvalidFilter {
                        name: name.clone(),
                        source,
                    })
            })
            .collect()
    }

    pub fn reject_rules(&self) -> RejectRules {
        RejectRules::new(&self.reject_markers)
    }

    pub fn policy(&self) -> PolicyResolver<'_> {
        PolicyResolver::new(&self.build_check, &self.suffix, &self.notification.groups)
    }
}

/// Returns the path to the config directory for release-watch.
/// Uses $XDG_CONFIG_HOME/release-watch if XDG_CONFIG_HOME is set,
/// otherwise falls back to ~/.config/release-watch,
/// or ./release-watch if neither is available.
pub fn config_dir() -> PathBuf {
    config_dir_with_env(std::env::var("XDG_CONFIG_HOME").ok(), dirs::home_dir())
}

/// Returns the default path to the config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

fn config_dir_with_env(xdg_config_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let config_dir = xdg_config_home
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".config")))
        .unwrap_or_else(|| PathBuf::from("."));

    config_dir.join("release-watch")
}
