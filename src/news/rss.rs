use async_trait::async_trait;
use feed_rs::model::Entry;
use feed_rs::parser;
use reqwest::Client;
use url::Url;

use super::filter::{html_to_text, matches_topic};
use super::{Article, Locale, NewsProvider, ProviderError};
use crate::utils::logging::log_provider_error;

/// RSS and Atom feeds; topics are matched locally
pub struct RssProvider {
    client: Client,
    feeds: Vec<String>,
}

impl RssProvider {
    pub fn new(client: Client, feeds: Vec<String>) -> Self {
        Self { client, feeds }
    }

    async fn fetch_feed(&self, feed_url: &str) -> Result<Vec<Article>, ProviderError> {
        let response = self.client.get(feed_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body: format!("feed {feed_url}"),
            });
        }
        let bytes = response.bytes().await?;
        let feed = parser::parse(bytes.as_ref()).map_err(|e| ProviderError::Parse(format!("{feed_url}: {e}")))?;

        let outlet = feed
            .title
            .as_ref()
            .map(|t| t.content.trim().to_string())
            .filter(|t| !t.is_empty())
            .or_else(|| feed_domain(feed_url));

        Ok(feed
            .entries
            .into_iter()
            .filter_map(|entry| entry_to_article(entry, feed_url, outlet.clone()))
            .collect())
    }
}

fn feed_domain(feed_url: &str) -> Option<String> {
    Url::parse(feed_url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_string()))
}

fn entry_to_article(entry: Entry, feed_url: &str, outlet: Option<String>) -> Option<Article> {
    let title = entry.title.as_ref().map(|t| html_to_text(&t.content))?;
    if title.is_empty() {
        return None;
    }

    let url = entry
        .links
        .first()
        .map(|l| l.href.trim().to_string())
        .map(|href| resolve_link(feed_url, &href))
        .unwrap_or_default();

    let summary = entry
        .summary
        .as_ref()
        .map(|s| html_to_text(&s.content))
        .unwrap_or_default();

    Some(Article {
        source_id: "rss".to_string(),
        source_name: outlet,
        title,
        url,
        published_at: entry.published.or(entry.updated),
        summary,
    })
}

/// Relative entry links are resolved against the feed URL
fn resolve_link(feed_url: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }
    Url::parse(feed_url)
        .and_then(|base| base.join(href))
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

#[async_trait]
impl NewsProvider for RssProvider {
    fn name(&self) -> &str {
        "rss"
    }

    // The feed list is not localized
    async fn fetch(&self, topic: Option<&str>, limit: usize, _locale: &Locale) -> Result<Vec<Article>, ProviderError> {
        let results = futures::future::join_all(self.feeds.iter().map(|feed| self.fetch_feed(feed))).await;

        let mut articles = Vec::new();
        let mut last_error = None;
        let mut succeeded = 0usize;
        for (feed, result) in self.feeds.iter().zip(results) {
            match result {
                Ok(mut entries) => {
                    succeeded += 1;
                    if let Some(topic) = topic {
                        entries.retain(|a| matches_topic(a, topic));
                    }
                    articles.extend(entries);
                }
                Err(e) => {
                    log_provider_error(&format!("rss {feed}"), &e.to_string());
                    last_error = Some(e);
                }
            }
        }

        if succeeded == 0 {
            return Err(last_error.unwrap_or_else(|| ProviderError::Api("no feeds configured".to_string())));
        }

        // Newest first across all feeds before truncating
        articles.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        articles.truncate(limit);
        Ok(articles)
    }
}
