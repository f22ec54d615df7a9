//! Version string normalization shared by the classifier and the formatter

use std::sync::LazyLock;

use regex::Regex;

/// Whitespace followed by a parenthesized build number, e.g. ` (1234)`
static BUILD_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s*\(.*?\)").expect("build suffix pattern is valid")
});

/// Marker stores report instead of a version for region-dependent builds
pub const DEFAULT_REJECT_MARKER: &str = "varies";

/// Strips build numbers unless `keep_build` is set, then trims whitespace
pub fn clean_version(version: &str, keep_build: bool) -> String {
    if keep_build {
        version.trim().to_string()
    } else {
        BUILD_SUFFIX.replace_all(version, "").trim().to_string()
    }
}

/// Rejects fetched values that carry no usable version signal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectRules {
    markers: Vec<String>,
}

impl RejectRules {
    pub fn new(markers: &[String]) -> Self {
        Self {
            markers: markers.iter().map(|m| m.to_lowercase()).collect(),
        }
    }

    /// True if the normalized value is empty or contains a marker, ignoring case
    pub fn is_unusable(&self, normalized: &str) -> bool {
        if normalized.is_empty() {
            return true;
        }
        let lower = normalized.to_lowercase();
        self.markers
            .iter()
            .any(|marker| !marker.is_empty() && lower.contains(marker.as_str()))
    }
}

impl Default for RejectRules {
    fn default() -> Self {
        Self::new(&[DEFAULT_REJECT_MARKER.to_string()])
    }
}
