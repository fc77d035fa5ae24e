use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::debug;

use super::filter::{dedup, is_advertisement, matches_topic, rank};
use super::mediastack::MediastackProvider;
use super::newsapi::NewsApiProvider;
use super::rss::RssProvider;
use super::{Article, FetchOptions, NewsError, NewsProvider, ProviderError};
use crate::config::Config;
use crate::utils::logging::{log_provider_error, log_timeout};

/// Queries every configured provider and merges their results.
///
/// Providers are kept in priority order; that order breaks ranking ties.
pub struct NewsAggregator {
    providers: Vec<Arc<dyn NewsProvider>>,
    timeout: Duration,
}

impl NewsAggregator {
    pub fn new(providers: Vec<Arc<dyn NewsProvider>>, timeout: Duration) -> Self {
        Self { providers, timeout }
    }

    /// Builds the providers enabled in `config`, in its priority order
    pub fn from_config(config: &Config, client: reqwest::Client) -> Self {
        let mut providers: Vec<Arc<dyn NewsProvider>> = Vec::new();

        for name in &config.provider_order {
            match name.as_str() {
                "newsapi" => {
                    if let Some(key) = &config.newsapi_key {
                        let mut provider = NewsApiProvider::new(client.clone(), key.clone())
                            .with_locale(config.news_language.clone(), config.news_region.clone());
                        if let Some(base) = &config.newsapi_base_url {
                            provider = provider.with_base_url(base.clone());
                        }
                        providers.push(Arc::new(provider));
                    }
                }
                "mediastack" => {
                    if let Some(key) = &config.mediastack_api_key {
                        let mut provider = MediastackProvider::new(client.clone(), key.clone())
                            .with_locale(config.news_language.clone(), config.news_region.clone());
                        if let Some(base) = &config.mediastack_base_url {
                            provider = provider.with_base_url(base.clone());
                        }
                        providers.push(Arc::new(provider));
                    }
                }
                "rss" => {
                    if !config.rss_feeds.is_empty() {
                        providers.push(Arc::new(RssProvider::new(client.clone(), config.rss_feeds.clone())));
                    }
                }
                other => tracing::warn!("Ignoring unknown news provider '{}'", other),
            }
        }

        Self::new(providers, config.http_timeout)
    }

    pub fn provider_names(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name().to_string()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Top articles across all providers, most recent first.
    ///
    /// Fails only when every provider failed or timed out.
    pub async fn fetch_top(&self, topic: Option<&str>, limit: usize) -> Result<Vec<Article>, NewsError> {
        self.fetch_top_with(topic, limit, &FetchOptions::default()).await
    }

    /// [`fetch_top`](Self::fetch_top) restricted to the selected sources and locale
    pub async fn fetch_top_with(
        &self,
        topic: Option<&str>,
        limit: usize,
        options: &FetchOptions,
    ) -> Result<Vec<Article>, NewsError> {
        let topic = topic.map(str::trim).filter(|t| !t.is_empty());
        let mut merged = self.gather(topic, pool_size(limit), options).await?;

        if let Some(topic) = topic {
            merged.retain(|(_, a)| matches_topic(a, topic));
        }
        Ok(finish(merged, limit))
    }

    /// Articles matching any of `topics`; the default feed when empty
    pub async fn fetch_for_topics(
        &self,
        topics: &[String],
        limit: usize,
        options: &FetchOptions,
    ) -> Result<Vec<Article>, NewsError> {
        if topics.is_empty() {
            return self.fetch_top_with(None, limit, options).await;
        }

        let mut merged = self.gather(None, pool_size(limit), options).await?;
        merged.retain(|(_, a)| topics.iter().any(|t| matches_topic(a, t)));
        Ok(finish(merged, limit))
    }

    /// One fetch split into per-topic groups of at most `per_topic` articles.
    ///
    /// Topics without matches are left out. An article matching several
    /// topics shows up in each of their groups.
    pub async fn search(
        &self,
        topics: &[String],
        per_topic: usize,
        options: &FetchOptions,
    ) -> Result<Vec<(String, Vec<Article>)>, NewsError> {
        let merged = self.gather(None, MAX_POOL, options).await?;
        let pool = finish(merged, usize::MAX);

        Ok(topics
            .iter()
            .filter_map(|topic| {
                let matches: Vec<Article> = pool
                    .iter()
                    .filter(|a| matches_topic(a, topic))
                    .take(per_topic)
                    .cloned()
                    .collect();
                (!matches.is_empty()).then(|| (topic.clone(), matches))
            })
            .collect())
    }

    /// Runs the selected providers concurrently, each bounded by the timeout.
    ///
    /// Returns `(priority, article)` pairs in priority order.
    async fn gather(
        &self,
        topic: Option<&str>,
        per_provider: usize,
        options: &FetchOptions,
    ) -> Result<Vec<(usize, Article)>, NewsError> {
        let selected: Vec<(usize, &Arc<dyn NewsProvider>)> = self
            .providers
            .iter()
            .enumerate()
            .filter(|(_, p)| options.includes(p.name()))
            .collect();

        let timeout = self.timeout;
        let locale = &options.locale;
        let results = join_all(selected.iter().map(|(_, provider)| async move {
            match tokio::time::timeout(timeout, provider.fetch(topic, per_provider, locale)).await {
                Ok(result) => result,
                Err(_) => {
                    log_timeout(&format!("provider {}", provider.name()), timeout.as_secs(), topic);
                    Err(ProviderError::Timeout(timeout.as_secs()))
                }
            }
        }))
        .await;

        let mut merged = Vec::new();
        let mut failures = Vec::new();
        let mut succeeded = 0usize;

        for ((priority, provider), result) in selected.into_iter().zip(results) {
            match result {
                Ok(articles) => {
                    debug!("Provider {} returned {} articles", provider.name(), articles.len());
                    succeeded += 1;
                    merged.extend(articles.into_iter().map(|a| (priority, a)));
                }
                Err(e) => {
                    log_provider_error(provider.name(), &e.to_string());
                    failures.push((provider.name().to_string(), e.to_string()));
                }
            }
        }

        if succeeded == 0 {
            return Err(NewsError::AllSourcesUnavailable { failures });
        }
        Ok(merged)
    }
}

const MIN_POOL: usize = 10;
const MAX_POOL: usize = 50;

/// Extra articles requested per provider to survive filtering and dedup
fn pool_size(limit: usize) -> usize {
    limit.saturating_mul(3).clamp(MIN_POOL, MAX_POOL)
}

fn finish(merged: Vec<(usize, Article)>, limit: usize) -> Vec<Article> {
    let filtered: Vec<_> = merged.into_iter().filter(|(_, a)| !is_advertisement(a)).collect();
    let mut unique = dedup(filtered, |(_, a)| a);
    rank(&mut unique);
    unique.into_iter().take(limit).map(|(_, a)| a).collect()
}

impl std::fmt::Debug for NewsAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewsAggregator")
            .field("providers", &self.provider_names())
            .field("timeout", &self.timeout)
            .finish()
    }
}
