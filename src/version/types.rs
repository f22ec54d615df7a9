//! Common types for watched items and platforms

use serde::{Deserialize, Serialize};

/// Platform a watched item is published on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    /// Apple App Store (iTunes lookup API)
    #[serde(rename = "appStore")]
    AppStore,
    /// Google Play store page
    #[serde(rename = "googlePlay")]
    GooglePlay,
    /// TapTap store page
    #[serde(rename = "taptap")]
    TapTap,
    /// GitHub releases, falling back to tags
    #[serde(rename = "github")]
    GitHub,
    /// RSS/Atom feed entry titles
    #[serde(rename = "rss")]
    Rss,
}

impl Platform {
    /// Canonical platform order. Batches are fetched and message lines are
    /// emitted in this order.
    pub const ALL: [Platform; 5] = [
        Platform::AppStore,
        Platform::GooglePlay,
        Platform::TapTap,
        Platform::GitHub,
        Platform::Rss,
    ];

    /// Returns the string representation used in config files and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::AppStore => "appStore",
            Platform::GooglePlay => "googlePlay",
            Platform::TapTap => "taptap",
            Platform::GitHub => "github",
            Platform::Rss => "rss",
        }
    }

    /// Human readable name, also the default suffix label
    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::AppStore => "App Store",
            Platform::GooglePlay => "Google Play",
            Platform::TapTap => "TapTap",
            Platform::GitHub => "GitHub",
            Platform::Rss => "RSS",
        }
    }

    /// Region used when a watched item does not specify one
    pub fn default_region(&self) -> Option<&'static str> {
        match self {
            Platform::AppStore => Some("cn"),
            Platform::GooglePlay => Some("us"),
            Platform::TapTap | Platform::GitHub | Platform::Rss => None,
        }
    }

    /// Feed entries are opaque titles rather than versions
    pub fn is_feed(&self) -> bool {
        matches!(self, Platform::Rss)
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

impl std::str::FromStr for Platform {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "appStore" => Ok(Platform::AppStore),
            "googlePlay" => Ok(Platform::GooglePlay),
            "taptap" => Ok(Platform::TapTap),
            "github" => Ok(Platform::GitHub),
            "rss" => Ok(Platform::Rss),
            _ => Err(()),
        }
    }
}

/// One monitored entity on one platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchedItem {
    pub platform: Platform,
    /// Application name, the join key across platforms
    pub name: String,
    /// App id, package name, `owner/repo` or feed URL
    pub id: String,
    /// Storefront country, resolved against the platform default
    pub region: Option<String>,
}

impl WatchedItem {
    pub fn new(platform: Platform, name: &str, id: &str, region: Option<&str>) -> Self {
        let region = region
            .map(str::to_string)
            .or_else(|| platform.default_region().map(str::to_string));
        Self {
            platform,
            name: name.to_string(),
            id: id.to_string(),
            region,
        }
    }

    /// Key indexing this item in the persisted history.
    ///
    /// The format matches history files written by earlier releases, so it
    /// must not change.
    pub fn history_key(&self) -> String {
        let region = self.region.as_deref().unwrap_or_default();
        match self.platform {
            Platform::AppStore => format!("app_{}_{}", self.id, region),
            Platform::GooglePlay => format!("gp_{}_{}", self.id, region),
            Platform::TapTap => format!("taptap_{}", self.id),
            Platform::GitHub => format!("gh_{}", self.id),
            Platform::Rss => format!("rss_{}", self.name),
        }
    }
}
