//! Three-tier override resolution for build-number checks and suffix display
//!
//! Every policy value is looked up in order of specificity:
//! application, then the application's notification group, then global.
//! The first tier that configures the platform wins.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::version::types::Platform;

/// Per-platform values at app, group and global level
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Overrides<T> {
    pub apps: HashMap<String, HashMap<Platform, T>>,
    pub groups: HashMap<String, HashMap<Platform, T>>,
    pub global: HashMap<Platform, T>,
}

impl<T> Default for Overrides<T> {
    fn default() -> Self {
        Self {
            apps: HashMap::new(),
            groups: HashMap::new(),
            global: HashMap::new(),
        }
    }
}

impl<T> Overrides<T> {
    /// Returns the most specific value configured for `app` on `platform`
    pub fn resolve(&self, groups: &GroupTable, app: &str, platform: Platform) -> Option<&T> {
        if let Some(value) = self.apps.get(app).and_then(|p| p.get(&platform)) {
            return Some(value);
        }
        if let Some(value) = groups
            .group_of(app)
            .and_then(|group| self.groups.get(group))
            .and_then(|p| p.get(&platform))
        {
            return Some(value);
        }
        self.global.get(&platform)
    }
}

/// Label appended after the app name in a message line, and whether to show it
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SuffixDisplay {
    pub label: String,
    pub visible: bool,
}

impl SuffixDisplay {
    pub fn platform_default(platform: Platform) -> Self {
        Self {
            label: platform.display_name().to_string(),
            visible: true,
        }
    }
}

/// Notification groups in configured order
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct GroupTable(IndexMap<String, Vec<String>>);

impl GroupTable {
    pub fn new(groups: IndexMap<String, Vec<String>>) -> Self {
        Self(groups)
    }

    /// Name of the first group listing `app`.
    ///
    /// An app listed in several groups belongs to whichever comes first.
    pub fn group_of(&self, app: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(_, members)| members.iter().any(|m| m == app))
            .map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0
            .iter()
            .map(|(name, members)| (name.as_str(), members.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Borrows the policy tables and answers per-app, per-platform questions
#[derive(Debug, Clone, Copy)]
pub struct PolicyResolver<'a> {
    build_check: &'a Overrides<bool>,
    suffix: &'a Overrides<SuffixDisplay>,
    groups: &'a GroupTable,
}

impl<'a> PolicyResolver<'a> {
    pub fn new(
        build_check: &'a Overrides<bool>,
        suffix: &'a Overrides<SuffixDisplay>,
        groups: &'a GroupTable,
    ) -> Self {
        Self {
            build_check,
            suffix,
            groups,
        }
    }

    /// Whether the parenthesized build number is significant. Defaults to false.
    pub fn compare_build(&self, app: &str, platform: Platform) -> bool {
        self.build_check
            .resolve(self.groups, app, platform)
            .copied()
            .unwrap_or(false)
    }

    pub fn suffix(&self, app: &str, platform: Platform) -> SuffixDisplay {
        self.suffix
            .resolve(self.groups, app, platform)
            .cloned()
            .unwrap_or_else(|| SuffixDisplay::platform_default(platform))
    }

    pub fn groups(&self) -> &'a GroupTable {
        self.groups
    }
}
