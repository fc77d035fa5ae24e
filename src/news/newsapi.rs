use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{parse_published, Article, Locale, NewsProvider, ProviderError};

pub const DEFAULT_BASE_URL: &str = "https://newsapi.org";

/// NewsAPI.org: `top-headlines` for the default feed, `everything` for topics
pub struct NewsApiProvider {
    client: Client,
    base_url: String,
    api_key: String,
    language: String,
    country: String,
}

impl NewsApiProvider {
    pub fn new(client: Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            language: "en".to_string(),
            country: "us".to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_locale(mut self, language: impl Into<String>, country: impl Into<String>) -> Self {
        self.language = language.into();
        self.country = country.into();
        self
    }
}

#[derive(Debug, Deserialize)]
struct NewsApiResponse {
    status: String,
    #[serde(default)]
    articles: Vec<NewsApiArticle>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewsApiArticle {
    source: Option<NewsApiSource>,
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    published_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NewsApiSource {
    name: Option<String>,
}

impl NewsApiArticle {
    fn into_article(self) -> Option<Article> {
        let title = self.title?.trim().to_string();
        // Articles taken down by the publisher keep a placeholder title
        if title.is_empty() || title == "[Removed]" {
            return None;
        }
        Some(Article {
            source_id: "newsapi".to_string(),
            source_name: self.source.and_then(|s| s.name),
            title,
            url: self.url.unwrap_or_default(),
            published_at: self.published_at.as_deref().and_then(parse_published),
            summary: self.description.unwrap_or_default().trim().to_string(),
        })
    }
}

#[async_trait]
impl NewsProvider for NewsApiProvider {
    fn name(&self) -> &str {
        "newsapi"
    }

    async fn fetch(&self, topic: Option<&str>, limit: usize, locale: &Locale) -> Result<Vec<Article>, ProviderError> {
        let base = self.base_url.trim_end_matches('/');
        let language = locale.language.as_deref().unwrap_or(&self.language);
        let country = locale.region.as_deref().unwrap_or(&self.country);
        // NewsAPI caps pageSize at 100
        let page_size = limit.clamp(1, 100).to_string();

        let request = match topic {
            Some(query) => self.client.get(format!("{base}/v2/everything")).query(&[
                ("q", query),
                ("language", language),
                ("sortBy", "publishedAt"),
                ("pageSize", page_size.as_str()),
            ]),
            None => self.client.get(format!("{base}/v2/top-headlines")).query(&[
                ("country", country),
                ("pageSize", page_size.as_str()),
            ]),
        };

        let response = request.header("X-Api-Key", &self.api_key).send().await?;
        let status = response.status();
        let body = response.text().await?;

        let parsed: Result<NewsApiResponse, _> = serde_json::from_str(&body);
        if !status.is_success() {
            let message = parsed.ok().and_then(|r| r.message).unwrap_or(body);
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body: message,
            });
        }

        let parsed = parsed.map_err(|e| ProviderError::Parse(e.to_string()))?;
        if parsed.status != "ok" {
            return Err(ProviderError::Api(
                parsed.message.unwrap_or_else(|| format!("status '{}'", parsed.status)),
            ));
        }

        Ok(parsed
            .articles
            .into_iter()
            .filter_map(NewsApiArticle::into_article)
            .take(limit)
            .collect())
    }
}
