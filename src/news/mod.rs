//! News source adapter: providers, normalization, dedup and ranking.

pub mod aggregator;
pub mod filter;
pub mod mediastack;
pub mod newsapi;
pub mod rss;

pub use aggregator::NewsAggregator;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};

use crate::storage::UserProfile;

/// An article normalized from any provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    /// Provider that returned the article (`newsapi`, `rss`, ...)
    pub source_id: String,
    /// Outlet name reported by the provider, if any
    pub source_name: Option<String>,
    pub title: String,
    /// Deduplication key; may be empty for feeds without links
    pub url: String,
    pub published_at: Option<DateTime<Utc>>,
    pub summary: String,
}

impl Article {
    /// Name shown to users: the outlet when known, otherwise the provider
    pub fn source_label(&self) -> &str {
        self.source_name
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(&self.source_id)
    }
}

/// Language and region overrides for one request; `None` keeps the provider default
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Locale {
    pub language: Option<String>,
    pub region: Option<String>,
}

/// Per-user view of the news sources
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchOptions {
    /// Provider names to query; empty means every configured provider
    pub sources: Vec<String>,
    pub locale: Locale,
}

impl FetchOptions {
    pub fn for_profile(profile: &UserProfile) -> Self {
        Self {
            sources: profile.sources.clone(),
            locale: Locale {
                language: profile.language.clone(),
                region: profile.region.clone(),
            },
        }
    }

    pub(crate) fn includes(&self, provider: &str) -> bool {
        self.sources.is_empty() || self.sources.iter().any(|s| s.eq_ignore_ascii_case(provider))
    }
}

/// A single external news source
#[async_trait]
pub trait NewsProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Fetches up to `limit` articles, optionally restricted to `topic`
    async fn fetch(&self, topic: Option<&str>, limit: usize, locale: &Locale) -> Result<Vec<Article>, ProviderError>;
}

/// Failure of one provider; excluded from the fetch, never fatal
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("provider returned an error: {0}")]
    Api(String),

    #[error("failed to parse response: {0}")]
    Parse(String),

    #[error("timed out after {0}s")]
    Timeout(u64),
}

/// Failure of a whole fetch
#[derive(Debug, thiserror::Error)]
pub enum NewsError {
    #[error("all news sources are unavailable ({})", format_failures(.failures))]
    AllSourcesUnavailable {
        /// `(provider, error)` for every provider that was tried
        failures: Vec<(String, String)>,
    },
}

fn format_failures(failures: &[(String, String)]) -> String {
    if failures.is_empty() {
        return "no providers configured".to_string();
    }
    failures
        .iter()
        .map(|(provider, error)| format!("{provider}: {error}"))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Parses the timestamp formats seen across providers
pub(crate) fn parse_published(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z") {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}
