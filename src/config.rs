use anyhow::{anyhow, Result};
use chrono::FixedOffset;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::utils::datetime::parse_utc_offset;
use crate::utils::validation::split_list;

pub const KNOWN_PROVIDERS: &[&str] = &["newsapi", "mediastack", "rss"];

#[derive(Debug, Clone)]
pub struct Config {
    pub telegram_bot_token: String,
    pub data_file: PathBuf,
    pub http_port: u16,
    pub newsapi_key: Option<String>,
    pub newsapi_base_url: Option<String>,
    pub mediastack_api_key: Option<String>,
    pub mediastack_base_url: Option<String>,
    pub rss_feeds: Vec<String>,
    pub provider_order: Vec<String>,
    pub news_language: String,
    pub news_region: String,
    pub http_timeout: Duration,
    pub proxy_url: Option<String>,
    pub digest_utc_offset: FixedOffset,
    pub digest_window_minutes: i64,
    pub digest_tick_cron: String,
    pub digest_limit: usize,
    pub top_limit: usize,
}

/// Reads a variable, treating blank values as unset
fn optional_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn var_or(name: &str, default: &str) -> String {
    optional_var(name).unwrap_or_else(|| default.to_string())
}

fn positive_number<T>(name: &str, default: &str) -> Result<T>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    let raw = var_or(name, default);
    match raw.parse::<T>() {
        Ok(value) if value > T::default() => Ok(value),
        _ => Err(anyhow!("Invalid {}", name)),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let token = env::var("TELEGRAM_BOT_TOKEN")
            .map_err(|_| anyhow!("TELEGRAM_BOT_TOKEN must be set"))?;

        if token.trim().is_empty() {
            return Err(anyhow!("TELEGRAM_BOT_TOKEN must be set"));
        }

        let data_file = PathBuf::from(var_or("DATA_FILE", "bot_data.json"));

        let http_port = var_or("HTTP_PORT", "3000")
            .parse()
            .map_err(|_| anyhow!("Invalid HTTP_PORT"))?;

        let provider_order = split_list(&var_or("NEWS_PROVIDERS", "newsapi,mediastack,rss"))
            .into_iter()
            .map(|p| p.to_lowercase())
            .collect::<Vec<_>>();
        if let Some(unknown) = provider_order.iter().find(|p| !KNOWN_PROVIDERS.contains(&p.as_str())) {
            return Err(anyhow!(
                "Invalid NEWS_PROVIDERS: unknown provider '{}' (expected {})",
                unknown,
                KNOWN_PROVIDERS.join(", ")
            ));
        }

        let http_timeout = Duration::from_secs(positive_number::<u64>("HTTP_TIMEOUT", "10")?);

        let digest_utc_offset = parse_utc_offset(&var_or("DIGEST_UTC_OFFSET", "+00:00"))
            .map_err(|e| anyhow!("Invalid DIGEST_UTC_OFFSET: {}", e))?;

        Ok(Config {
            telegram_bot_token: token,
            data_file,
            http_port,
            newsapi_key: optional_var("NEWSAPI_KEY"),
            newsapi_base_url: optional_var("NEWSAPI_BASE_URL"),
            mediastack_api_key: optional_var("MEDIASTACK_API_KEY"),
            mediastack_base_url: optional_var("MEDIASTACK_BASE_URL"),
            rss_feeds: optional_var("RSS_FEEDS").map(|v| split_list(&v)).unwrap_or_default(),
            provider_order,
            news_language: var_or("NEWS_LANGUAGE", "en"),
            news_region: var_or("NEWS_REGION", "us"),
            http_timeout,
            proxy_url: optional_var("PROXY_URL"),
            digest_utc_offset,
            digest_window_minutes: positive_number("DIGEST_WINDOW_MINUTES", "5")?,
            digest_tick_cron: var_or("DIGEST_TICK_CRON", "0 * * * * *"),
            digest_limit: positive_number("DIGEST_LIMIT", "10")?,
            top_limit: positive_number("TOP_LIMIT", "5")?,
        })
    }

    /// Providers that are both listed in `NEWS_PROVIDERS` and have credentials
    pub fn enabled_providers(&self) -> Vec<&str> {
        self.provider_order
            .iter()
            .map(String::as_str)
            .filter(|name| match *name {
                "newsapi" => self.newsapi_key.is_some(),
                "mediastack" => self.mediastack_api_key.is_some(),
                "rss" => !self.rss_feeds.is_empty(),
                _ => false,
            })
            .collect()
    }
}
