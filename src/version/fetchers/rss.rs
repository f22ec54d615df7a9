//! RSS/Atom fetcher returning the newest entry title that passes the app's filter

use std::collections::HashMap;

use quick_xml::Reader;
use quick_xml::events::Event;
use regex::Regex;
use reqwest::Client;
use tracing::{debug, info};

use crate::version::error::FetchError;
use crate::version::fetcher::VersionFetcher;
use crate::version::http::{RetryPolicy, send_with_retry};
use crate::version::types::{Platform, WatchedItem};

pub struct RssFetcher {
    client: Client,
    /// Case-insensitive title filters keyed by app name
    filters: HashMap<String, Regex>,
    retry: RetryPolicy,
}

impl RssFetcher {
    pub fn new(client: Client, filters: HashMap<String, Regex>, retry: RetryPolicy) -> Self {
        Self {
            client,
            filters,
            retry,
        }
    }
}

/// Collects `<item>` (RSS) and `<entry>` (Atom) titles in document order
pub fn parse_entry_titles(xml: &str) -> Result<Vec<String>, FetchError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut titles = Vec::new();
    let mut in_entry = false;
    let mut in_title = false;
    let mut title = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"item" | b"entry" => {
                    in_entry = true;
                    title.clear();
                }
                b"title" if in_entry => in_title = true,
                _ => {}
            },
            Ok(Event::Text(t)) if in_title => {
                let text = t
                    .unescape()
                    .map_err(|e| FetchError::InvalidResponse(e.to_string()))?;
                title.push_str(&text);
            }
            Ok(Event::CData(c)) if in_title => {
                title.push_str(&String::from_utf8_lossy(&c));
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"title" => in_title = false,
                b"item" | b"entry" => {
                    in_entry = false;
                    let trimmed = title.trim();
                    if !trimmed.is_empty() {
                        titles.push(trimmed.to_string());
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(FetchError::InvalidResponse(e.to_string())),
            _ => {}
        }
    }

    Ok(titles)
}

/// First title matching `filter`, or the first title when no filter is set
pub fn select_title<'t>(titles: &'t [String], filter: Option<&Regex>) -> Option<&'t String> {
    match filter {
        None => titles.first(),
        Some(re) => titles.iter().find(|t| re.is_match(t)),
    }
}

#[async_trait::async_trait]
impl VersionFetcher for RssFetcher {
    fn platform(&self) -> Platform {
        Platform::Rss
    }

    async fn fetch_version(&self, item: &WatchedItem) -> Result<String, FetchError> {
        debug!("Fetching feed: {}", item.id);
        let response = send_with_retry(|| self.client.get(&item.id), &self.retry).await?;

        if !response.status().is_success() {
            return Err(FetchError::InvalidResponse(format!(
                "Unexpected status: {}",
                response.status()
            )));
        }

        let xml = response.text().await?;
        let titles = parse_entry_titles(&xml)?;
        if titles.is_empty() {
            return Err(FetchError::NotFound(format!("no entries in {}", item.id)));
        }
        debug!("Scanning {} entries for {}", titles.len(), item.name);

        let filter = self.filters.get(&item.name);
        match select_title(&titles, filter) {
            Some(title) => {
                info!("[{}] matched feed entry: {}", item.name, title);
                Ok(title.clone())
            }
            None => Err(FetchError::NoMatch(item.name.clone())),
        }
    }
}
