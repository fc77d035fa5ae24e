//! Test doubles shared by the integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

use news_digest_bot::bot::transport::{MessageTransport, TransportError};
use news_digest_bot::news::{Article, Locale, NewsProvider, ProviderError};
use teloxide::{ApiError, RequestError};

pub enum Behavior {
    Articles(Vec<Article>),
    Fail(String),
    Slow(Duration, Vec<Article>),
}

/// Provider returning canned results and recording how it was called
pub struct MockProvider {
    name: String,
    behavior: Behavior,
    pub calls: Mutex<Vec<(Option<String>, usize)>>,
    pub locales: Mutex<Vec<Locale>>,
}

impl MockProvider {
    pub fn returning(name: &str, articles: Vec<Article>) -> Self {
        Self::with_behavior(name, Behavior::Articles(articles))
    }

    pub fn failing(name: &str, error: &str) -> Self {
        Self::with_behavior(name, Behavior::Fail(error.to_string()))
    }

    pub fn slow(name: &str, delay: Duration, articles: Vec<Article>) -> Self {
        Self::with_behavior(name, Behavior::Slow(delay, articles))
    }

    fn with_behavior(name: &str, behavior: Behavior) -> Self {
        Self {
            name: name.to_string(),
            behavior,
            calls: Mutex::new(Vec::new()),
            locales: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl NewsProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, topic: Option<&str>, limit: usize, locale: &Locale) -> Result<Vec<Article>, ProviderError> {
        self.calls.lock().unwrap().push((topic.map(str::to_string), limit));
        self.locales.lock().unwrap().push(locale.clone());
        match &self.behavior {
            Behavior::Articles(articles) => Ok(articles.clone()),
            Behavior::Fail(error) => Err(ProviderError::Api(error.clone())),
            Behavior::Slow(delay, articles) => {
                tokio::time::sleep(*delay).await;
                Ok(articles.clone())
            }
        }
    }
}

/// Transport that records every message instead of sending it
#[derive(Default)]
pub struct RecordingTransport {
    pub sent: Mutex<Vec<(i64, String)>>,
    unreachable: HashSet<i64>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sends to these users fail as if they blocked the bot
    pub fn failing_for(users: &[i64]) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            unreachable: users.iter().copied().collect(),
        }
    }

    pub fn messages(&self) -> Vec<(i64, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn messages_to(&self, user_id: i64) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter(|(id, _)| *id == user_id)
            .map(|(_, text)| text)
            .collect()
    }
}

#[async_trait]
impl MessageTransport for RecordingTransport {
    async fn send_message(&self, user_id: i64, text: &str) -> Result<(), TransportError> {
        if self.unreachable.contains(&user_id) {
            return Err(TransportError::Telegram(RequestError::Api(ApiError::BotBlocked)));
        }
        self.sent.lock().unwrap().push((user_id, text.to_string()));
        Ok(())
    }
}

/// 2024-03-04 (a Monday) at the given UTC time
pub fn monday_at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 4, hour, minute, 0).unwrap()
}

pub fn article(source: &str, url: &str, title: &str, published: Option<DateTime<Utc>>) -> Article {
    Article {
        source_id: source.to_string(),
        source_name: None,
        title: title.to_string(),
        url: url.to_string(),
        published_at: published,
        summary: String::new(),
    }
}
