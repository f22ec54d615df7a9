//! Update classification for freshly fetched versions

use crate::version::history::VersionRecord;
use crate::version::normalize::{RejectRules, clean_version};
use crate::version::policy::PolicyResolver;
use crate::version::types::Platform;

/// Outcome of comparing a fetched value against its history record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// No record yet, the value becomes the baseline
    Baseline,
    /// Value differs from both latest and prev
    Updated,
    /// Value is empty or carries a reject marker
    Unusable,
    /// Value equals the latest accepted value
    NoChange,
    /// Value equals the value before the latest one, a stale upstream cache
    Rollback,
}

impl Decision {
    /// Whether the value is a genuine update to notify about and persist
    pub fn is_update(&self) -> bool {
        matches!(self, Decision::Baseline | Decision::Updated)
    }
}

/// Decides whether fetched values are genuine updates
#[derive(Debug, Clone, Copy)]
pub struct UpdateChecker<'a> {
    policy: PolicyResolver<'a>,
    reject: &'a RejectRules,
}

impl<'a> UpdateChecker<'a> {
    pub fn new(policy: PolicyResolver<'a>, reject: &'a RejectRules) -> Self {
        Self { policy, reject }
    }

    /// Classify `new_raw` for `app` on `platform` against `existing`
    pub fn classify(
        &self,
        new_raw: Option<&str>,
        existing: Option<&VersionRecord>,
        app: &str,
        platform: Platform,
    ) -> Decision {
        let keep_build = self.policy.compare_build(app, platform);
        let normalize = |v: Option<&str>| v.map(|v| clean_version(v, keep_build)).unwrap_or_default();

        let new = normalize(new_raw);
        if self.reject.is_unusable(&new) {
            return Decision::Unusable;
        }

        let Some(existing) = existing else {
            return Decision::Baseline;
        };

        if new == normalize(existing.latest.as_deref()) {
            return Decision::NoChange;
        }
        if new == normalize(existing.prev.as_deref()) {
            return Decision::Rollback;
        }
        Decision::Updated
    }

    /// Shorthand for `classify(..).is_update()`
    pub fn decide(
        &self,
        new_raw: Option<&str>,
        existing: Option<&VersionRecord>,
        app: &str,
        platform: Platform,
    ) -> bool {
        self.classify(new_raw, existing, app, platform).is_update()
    }
}
