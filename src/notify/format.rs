//! Groups updated apps into notifications and renders their message lines

use std::collections::{HashMap, HashSet};

use indexmap::IndexSet;
use tracing::debug;

use crate::config::NotificationConfig;
use crate::monitor::aggregate::{CurrentState, UpdateBuffer};
use crate::notify::notifier::Notification;
use crate::version::normalize::clean_version;
use crate::version::policy::PolicyResolver;
use crate::version::types::Platform;

/// Renders one message line for `app` on `platform`
///
/// Feed entries are opaque titles, so feed lines carry only the app name.
pub fn format_line(
    policy: &PolicyResolver<'_>,
    app: &str,
    platform: Platform,
    version: Option<&str>,
) -> String {
    if platform.is_feed() {
        return app.to_string();
    }

    let keep_build = policy.compare_build(app, platform);
    let version = clean_version(version.unwrap_or_default(), keep_build);
    let suffix = policy.suffix(app, platform);

    if suffix.visible {
        format!("{} ({}): {}", app, suffix.label, version)
    } else {
        format!("{}: {}", app, version)
    }
}

/// Lines for every updated platform of `app`, in canonical platform order
pub fn app_lines(
    policy: &PolicyResolver<'_>,
    app: &str,
    updates: &UpdateBuffer,
    state: &CurrentState,
) -> Vec<String> {
    let Some(platforms) = updates.get(app) else {
        return Vec::new();
    };
    let versions = state.get(app);

    Platform::ALL
        .iter()
        .filter(|p| platforms.contains(*p))
        .map(|p| {
            let version = versions.and_then(|v| v.get(p)).map(String::as_str);
            format_line(policy, app, *p, version)
        })
        .collect()
}

/// Drops repeated lines, keeping first occurrences in order
pub fn dedup_lines(lines: Vec<String>) -> Vec<String> {
    lines.into_iter().collect::<IndexSet<_>>().into_iter().collect()
}

/// Image shared by every app in the batch.
///
/// `None` unless every app has an image configured and all of them are identical.
pub fn shared_image(apps: &[&str], images: &HashMap<String, String>) -> Option<String> {
    let urls: Option<IndexSet<&String>> = apps.iter().map(|app| images.get(*app)).collect();
    let urls = urls?;
    if urls.len() == 1 {
        urls.first().map(|url| url.to_string())
    } else {
        None
    }
}

/// Builds one notification per group with updates, then one for leftover apps
pub fn build_notifications(
    policy: &PolicyResolver<'_>,
    config: &NotificationConfig,
    updates: &UpdateBuffer,
    state: &CurrentState,
) -> Vec<Notification> {
    let mut batches: Vec<(&str, Vec<&str>)> = Vec::new();
    let mut grouped: HashSet<&str> = HashSet::new();

    for (group, members) in config.groups.iter() {
        let apps: Vec<&str> = members
            .iter()
            .map(String::as_str)
            .filter(|app| updates.contains_key(*app))
            .collect();
        grouped.extend(apps.iter().copied());
        if !apps.is_empty() {
            batches.push((group, apps));
        }
    }

    let leftover: Vec<&str> = updates
        .keys()
        .map(String::as_str)
        .filter(|app| !grouped.contains(app))
        .collect();
    if !leftover.is_empty() {
        batches.push((config.default_group.as_str(), leftover));
    }

    batches
        .into_iter()
        .filter_map(|(group, apps)| {
            let lines = dedup_lines(
                apps.iter()
                    .flat_map(|app| app_lines(policy, app, updates, state))
                    .collect(),
            );
            if lines.is_empty() {
                return None;
            }

            let image = shared_image(&apps, &config.images);
            if let Some(image) = &image {
                debug!("{}: all {} apps share image {}", group, apps.len(), image);
            }

            Some(Notification {
                title: group.to_string(),
                body: lines.join("\n"),
                archive_group: config
                    .archive_labels
                    .get(group)
                    .cloned()
                    .unwrap_or_else(|| group.to_string()),
                icon: config
                    .icons
                    .get(group)
                    .cloned()
                    .or_else(|| config.default_icon.clone()),
                image,
            })
        })
        .collect()
}
