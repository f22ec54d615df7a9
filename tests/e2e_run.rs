//! Whole-run tests: fetch, classify, persist, notify

mod helper;

use std::sync::Arc;

use serde_json::{Value, json};

use helper::{RecordingNotifier, StaticFetcher, config, create_test_history};
use release_watch::monitor::runner::Monitor;
use release_watch::version::types::Platform;

fn read_json(path: &std::path::Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

#[tokio::test]
async fn same_value_on_two_runs_notifies_once_and_writes_once() {
    let (_temp_dir, path, store) = create_test_history(None);
    let app_store = StaticFetcher::new(Platform::AppStore).with_version("686449807", "11.2 (301)");
    let monitor = Monitor::new(config(json!({
        "watchlist": {
            "appStore": [{ "name": "Telegram US", "id": "686449807", "region": "us" }]
        },
        "notification": { "intervalMs": 0 }
    })))
    .with_fetcher(Arc::new(app_store));
    let notifier = RecordingNotifier::default();

    let first = monitor.run(&store, Some(&notifier), false).await;

    assert_eq!(first.updates, 1);
    assert!(first.history_written);
    assert_eq!(
        read_json(&path),
        json!({ "app_686449807_us": { "latest": "11.2 (301)", "prev": null } })
    );
    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].title, "Other");
    assert_eq!(sent[0].body, "Telegram US (App Store): 11.2");

    let before = std::fs::read(&path).unwrap();
    notifier.clear();

    let second = monitor.run(&store, Some(&notifier), false).await;

    assert_eq!(second.updates, 0);
    assert!(!second.history_written);
    assert!(notifier.sent().is_empty());
    assert_eq!(std::fs::read(&path).unwrap(), before);
}

#[tokio::test]
async fn stale_cache_and_unchanged_values_leave_file_byte_identical() {
    // pretty-printed by hand, including a legacy bare-string entry
    let initial = r#"{
  "app_686449807_us": {"latest": "2.0", "prev": "1.0"},
  "gp_org.telegram.messenger_us": "5.0"
}"#;
    let (_temp_dir, path, store) = create_test_history(Some(initial));
    let monitor = Monitor::new(config(json!({
        "watchlist": {
            "appStore": [{ "name": "Telegram US", "id": "686449807", "region": "us" }],
            "googlePlay": [{ "name": "Telegram US", "id": "org.telegram.messenger" }]
        }
    })))
    .with_fetcher(Arc::new(
        StaticFetcher::new(Platform::AppStore).with_version("686449807", "1.0"),
    ))
    .with_fetcher(Arc::new(
        StaticFetcher::new(Platform::GooglePlay).with_version("org.telegram.messenger", "5.0"),
    ));
    let notifier = RecordingNotifier::default();

    let report = monitor.run(&store, Some(&notifier), false).await;

    assert_eq!(report.updates, 0);
    assert!(notifier.sent().is_empty());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), initial);
}

#[tokio::test]
async fn accepted_update_rotates_prev_and_keeps_every_other_key() {
    let initial = json!({
        "app_686449807_us": { "latest": "2.0", "prev": "1.0" },
        "gp_org.telegram.messenger_us": "5.0",
        "gh_removed/repo": { "latest": "v0.9", "prev": null }
    });
    let (_temp_dir, path, store) = create_test_history(Some(initial.to_string().as_str()));
    let monitor = Monitor::new(config(json!({
        "watchlist": {
            "appStore": [{ "name": "Telegram US", "id": "686449807", "region": "us" }],
            "googlePlay": [{ "name": "Telegram US", "id": "org.telegram.messenger" }]
        }
    })))
    .with_fetcher(Arc::new(
        StaticFetcher::new(Platform::AppStore).with_version("686449807", "3.0"),
    ))
    // Google Play fetch fails this run
    .with_fetcher(Arc::new(StaticFetcher::new(Platform::GooglePlay)));

    let report = monitor.run(&store, None, false).await;

    assert_eq!(report.updates, 1);
    assert_eq!(
        read_json(&path),
        json!({
            "app_686449807_us": { "latest": "3.0", "prev": "2.0" },
            "gp_org.telegram.messenger_us": { "latest": "5.0", "prev": null },
            "gh_removed/repo": { "latest": "v0.9", "prev": null }
        })
    );
}

#[tokio::test]
async fn build_number_only_change_counts_only_where_checked() {
    let initial = json!({
        "app_1_us": { "latest": "1.0 (5)", "prev": null },
        "app_2_us": { "latest": "1.0 (5)", "prev": null }
    });
    let (_temp_dir, _path, store) = create_test_history(Some(initial.to_string().as_str()));
    let app_store = StaticFetcher::new(Platform::AppStore)
        .with_version("1", "1.0 (9)")
        .with_version("2", "1.0 (9)");
    let monitor = Monitor::new(config(json!({
        "watchlist": {
            "appStore": [
                { "name": "Loose", "id": "1", "region": "us" },
                { "name": "Strict", "id": "2", "region": "us" }
            ]
        },
        "buildCheck": { "apps": { "Strict": { "appStore": true } } },
        "suffix": { "global": { "appStore": { "label": "iOS", "visible": true } } },
        "notification": { "intervalMs": 0 }
    })))
    .with_fetcher(Arc::new(app_store));
    let notifier = RecordingNotifier::default();

    let report = monitor.run(&store, Some(&notifier), false).await;

    assert_eq!(report.updates, 1);
    assert_eq!(notifier.sent()[0].body, "Strict (iOS): 1.0 (9)");
}

#[tokio::test]
async fn groups_batch_apps_and_share_image_only_when_all_agree() {
    let (_temp_dir, _path, store) = create_test_history(None);
    let github = StaticFetcher::new(Platform::GitHub)
        .with_version("a/one", "v1")
        .with_version("a/two", "v2")
        .with_version("a/three", "v3")
        .with_version("b/one", "v1")
        .with_version("b/two", "v2")
        .with_version("b/three", "v3");
    let rss = StaticFetcher::new(Platform::Rss)
        .with_version("https://feeds.example/anime.xml", "[Sub] Show - 05 [1080p]");
    let monitor = Monitor::new(config(json!({
        "watchlist": {
            "github": [
                { "name": "A1", "id": "a/one" },
                { "name": "A2", "id": "a/two" },
                { "name": "A3", "id": "a/three" },
                { "name": "B1", "id": "b/one" },
                { "name": "B2", "id": "b/two" },
                { "name": "B3", "id": "b/three" }
            ],
            "rss": [{ "name": "Show", "id": "https://feeds.example/anime.xml" }]
        },
        "notification": {
            "groups": { "Mixed": ["A1", "A2", "A3"], "Same": ["B1", "B2", "B3"] },
            "defaultGroup": "Misc",
            "archiveLabels": { "Mixed": "mixed-archive" },
            "icons": { "Same": "https://icons/same.png" },
            "defaultIcon": "https://icons/default.png",
            "images": {
                "A1": "https://img/a.png",
                "A2": "https://img/a.png",
                "A3": "https://img/b.png",
                "B1": "https://img/a.png",
                "B2": "https://img/a.png",
                "B3": "https://img/a.png"
            },
            "intervalMs": 0
        }
    })))
    .with_fetcher(Arc::new(github))
    .with_fetcher(Arc::new(rss));
    let notifier = RecordingNotifier::default();

    let report = monitor.run(&store, Some(&notifier), false).await;

    assert_eq!(report.delivered, 3);
    let sent = notifier.sent();
    let titles: Vec<_> = sent.iter().map(|n| n.title.as_str()).collect();
    assert_eq!(titles, vec!["Mixed", "Same", "Misc"]);

    assert_eq!(
        sent[0].body,
        "A1 (GitHub): v1\nA2 (GitHub): v2\nA3 (GitHub): v3"
    );
    assert_eq!(sent[0].image, None);
    assert_eq!(sent[0].archive_group, "mixed-archive");
    assert_eq!(sent[0].icon.as_deref(), Some("https://icons/default.png"));

    assert_eq!(sent[1].image.as_deref(), Some("https://img/a.png"));
    assert_eq!(sent[1].archive_group, "Same");
    assert_eq!(sent[1].icon.as_deref(), Some("https://icons/same.png"));

    assert_eq!(sent[2].body, "Show");
}

#[tokio::test]
async fn dry_run_reports_updates_but_touches_nothing() {
    let (_temp_dir, path, store) = create_test_history(None);
    let monitor = Monitor::new(config(json!({
        "watchlist": { "github": [{ "name": "Repo", "id": "a/b" }] }
    })))
    .with_fetcher(Arc::new(
        StaticFetcher::new(Platform::GitHub).with_version("a/b", "v1.0"),
    ));
    let notifier = RecordingNotifier::default();

    let report = monitor.run(&store, Some(&notifier), true).await;

    assert_eq!(report.updates, 1);
    assert_eq!(report.notifications[0].body, "Repo (GitHub): v1.0");
    assert!(!path.exists());
    assert!(notifier.sent().is_empty());
}

#[tokio::test]
async fn sentinel_and_empty_values_never_create_records() {
    let (_temp_dir, path, store) = create_test_history(None);
    let monitor = Monitor::new(config(json!({
        "watchlist": {
            "googlePlay": [
                { "name": "Varies", "id": "com.varies" },
                { "name": "Blank", "id": "com.blank" }
            ]
        }
    })))
    .with_fetcher(Arc::new(
        StaticFetcher::new(Platform::GooglePlay)
            .with_version("com.varies", "Varies with device")
            .with_version("com.blank", "  "),
    ));

    let report = monitor.run(&store, None, false).await;

    assert_eq!(report.updates, 0);
    assert!(!path.exists());
}
