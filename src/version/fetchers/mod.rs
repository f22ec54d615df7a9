//! Platform fetcher implementations

pub mod app_store;
pub mod github;
pub mod google_play;
pub mod rss;
pub mod taptap;

pub use app_store::AppStoreFetcher;
pub use github::GitHubFetcher;
pub use google_play::GooglePlayFetcher;
pub use rss::RssFetcher;
pub use taptap::TapTapFetcher;
