use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{parse_published, Article, Locale, NewsProvider, ProviderError};

pub const DEFAULT_BASE_URL: &str = "http://api.mediastack.com";

/// Mediastack live news API
pub struct MediastackProvider {
    client: Client,
    base_url: String,
    access_key: String,
    language: String,
    country: String,
}

impl MediastackProvider {
    pub fn new(client: Client, access_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            access_key: access_key.into(),
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
struct MediastackResponse {
    #[serde(default)]
    data: Vec<MediastackArticle>,
    error: Option<MediastackError>,
}

#[derive(Debug, Deserialize)]
struct MediastackError {
    code: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MediastackArticle {
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    source: Option<String>,
    published_at: Option<String>,
}

impl MediastackArticle {
    fn into_article(self) -> Option<Article> {
        let title = self.title?.trim().to_string();
        if title.is_empty() {
            return None;
        }
        Some(Article {
            source_id: "mediastack".to_string(),
            source_name: self.source,
            title,
            url: self.url.unwrap_or_default(),
            published_at: self.published_at.as_deref().and_then(parse_published),
            summary: self.description.unwrap_or_default().trim().to_string(),
        })
    }
}

#[async_trait]
impl NewsProvider for MediastackProvider {
    fn name(&self) -> &str {
        "mediastack"
    }

    async fn fetch(&self, topic: Option<&str>, limit: usize, locale: &Locale) -> Result<Vec<Article>, ProviderError> {
        let base = self.base_url.trim_end_matches('/');
        let language = locale.language.as_deref().unwrap_or(&self.language);
        let country = locale.region.as_deref().unwrap_or(&self.country);
        let limit_param = limit.clamp(1, 100).to_string();

        let mut request = self.client.get(format!("{base}/v1/news")).query(&[
            ("access_key", self.access_key.as_str()),
            ("languages", language),
            ("countries", country),
            ("sort", "published_desc"),
            ("limit", limit_param.as_str()),
        ]);
        if let Some(keywords) = topic {
            request = request.query(&[("keywords", keywords)]);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        // Mediastack reports most failures as an `error` object, sometimes with 200
        let parsed: Result<MediastackResponse, _> = serde_json::from_str(&body);
        if let Ok(MediastackResponse { error: Some(err), .. }) = &parsed {
            let message = err
                .message
                .clone()
                .or_else(|| err.code.clone())
                .unwrap_or_else(|| "unknown error".to_string());
            return Err(ProviderError::Api(message));
        }
        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed = parsed.map_err(|e| ProviderError::Parse(e.to_string()))?;
        Ok(parsed
            .data
            .into_iter()
            .filter_map(MediastackArticle::into_article)
            .take(limit)
            .collect())
    }
}
