use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use release_watch::config::{self, BARK_KEY_ENV, GITHUB_TOKEN_ENV, WatchConfig};
use release_watch::monitor::runner::Monitor;
use release_watch::notify::bark::BarkNotifier;
use release_watch::notify::notifier::Notifier;
use release_watch::version::fetchers::{
    AppStoreFetcher, GitHubFetcher, GooglePlayFetcher, RssFetcher, TapTapFetcher,
};
use release_watch::version::history::{DEFAULT_HISTORY_FILE, JsonFileHistory};
use release_watch::version::http::{RetryPolicy, build_client};
use release_watch::version::types::Platform;

#[derive(Parser)]
#[command(name = "release-watch")]
#[command(version, about = "Watches app stores, GitHub releases and feeds for new versions")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Config file (defaults to $XDG_CONFIG_HOME/release-watch/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Version history file
    #[arg(long, global = true, default_value = DEFAULT_HISTORY_FILE)]
    history: PathBuf,

    /// Fetch and classify only: write no history and send nothing
    #[arg(long)]
    dry_run: bool,

    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Load the config and report what it watches
    Validate,
}

fn init_tracing(log_file: Option<&PathBuf>) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let Some(path) = log_file else {
        tracing_subscriber::registry()
            .with(filter)
            .with(stderr_layer)
            .init();
        return Ok(None);
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating log directory {}", parent.display()))?;
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(fmt::layer().with_ansi(false).with_writer(writer))
        .init();
    Ok(Some(guard))
}

fn validate(config: &WatchConfig) {
    for platform in Platform::ALL {
        let items = config.watchlist.items(platform);
        if !items.is_empty() {
            info!("{}: {} items", platform.display_name(), items.len());
        }
    }
    for (group, members) in config.notification.groups.iter() {
        info!("group {}: {}", group, members.join(", "));
    }
    info!(
        "Config OK: {} items, {} groups",
        config.watchlist.len(),
        config.notification.groups.len()
    );
}

async fn run(config: WatchConfig, history: PathBuf, dry_run: bool) -> anyhow::Result<()> {
    let client = build_client(Duration::from_millis(config.fetch.timeout_ms))?;
    let retry = RetryPolicy::from(&config.fetch);
    let filters = config.compile_feed_filters()?;
    let github_token = std::env::var(GITHUB_TOKEN_ENV)
        .ok()
        .filter(|t| !t.is_empty());

    let notifier = std::env::var(BARK_KEY_ENV)
        .ok()
        .filter(|k| !k.is_empty())
        .map(|key| BarkNotifier::new(client.clone(), &config.notification.server, &key));
    if notifier.is_none() && !dry_run {
        warn!("{} is not set, notifications will not be sent", BARK_KEY_ENV);
    }

    let monitor = Monitor::new(config)
        .with_fetcher(Arc::new(AppStoreFetcher::with_defaults(
            client.clone(),
            retry.clone(),
        )))
        .with_fetcher(Arc::new(GooglePlayFetcher::with_defaults(
            client.clone(),
            retry.clone(),
        )))
        .with_fetcher(Arc::new(TapTapFetcher::with_defaults(
            client.clone(),
            retry.clone(),
        )))
        .with_fetcher(Arc::new(
            GitHubFetcher::with_defaults(client.clone(), retry.clone()).with_token(github_token),
        ))
        .with_fetcher(Arc::new(RssFetcher::new(client, filters, retry)));

    let store = JsonFileHistory::new(history);
    let report = monitor
        .run(
            &store,
            notifier.as_ref().map(|n| n as &dyn Notifier),
            dry_run,
        )
        .await;

    info!(
        "Run finished: {} updates, {} notifications, {} delivered, history {}",
        report.updates,
        report.notifications.len(),
        report.delivered,
        if report.history_written {
            "written"
        } else {
            "unchanged"
        }
    );
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = init_tracing(cli.log_file.as_ref())?;

    let config_path = cli.config.unwrap_or_else(config::config_path);
    let config = WatchConfig::load(&config_path)
        .with_context(|| format!("loading config {}", config_path.display()))?;

    match cli.command {
        Some(Command::Validate) => {
            validate(&config);
            Ok(())
        }
        None => tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?
            .block_on(run(config, cli.history, cli.dry_run)),
    }
}
