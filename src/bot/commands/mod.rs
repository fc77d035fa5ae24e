pub mod digest;
pub mod freq;
pub mod general;
pub mod locale;
pub mod saved;
pub mod search;
pub mod sources;
pub mod top;
pub mod topic;

use chrono::FixedOffset;
use std::collections::HashMap;
use std::sync::Arc;
use teloxide::utils::command::BotCommands;
use tokio::sync::Mutex;

use crate::config::Config;
use crate::news::{Article, NewsAggregator};
use crate::services::clock::Clock;
use crate::storage::{StateStore, UserProfile};
use crate::utils::feedback;
use crate::utils::logging::{log_command_start, log_storage_error};

#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase", description = "News Digest Bot commands:")]
pub enum Command {
    #[command(description = "Display this help message")]
    Help,
    #[command(description = "Start the bot")]
    Start,
    #[command(description = "Latest news, optionally on a topic: /top [topic]")]
    Top(String),
    #[command(description = "Digest status, set a time or turn it off: /digest [HH:MM|off]")]
    Digest(String),
    #[command(description = "Manage topics: /topic add|remove <topic>, /topic rename <n> <name>, /topic list, /topic clear")]
    Topic(String),
    #[command(description = "News for each of your topics: /search [topic, ...]")]
    Search(String),
    #[command(description = "Digest frequency: /freq daily|weekly|weekdays")]
    Freq(String),
    #[command(description = "Choose news sources: /sources [name, ...|all]")]
    Sources(String),
    #[command(description = "News language: /lang [code|default]")]
    Lang(String),
    #[command(description = "News region: /region [code|default]")]
    Region(String),
    #[command(description = "Save an article from the last list: /save <number|url>")]
    Save(String),
    #[command(description = "Show saved articles: /saved [clear]")]
    Saved(String),
    #[command(description = "About this bot")]
    About,
}

/// Per-deployment knobs the handlers need
#[derive(Debug, Clone)]
pub struct CommandSettings {
    pub top_limit: usize,
    pub utc_offset: FixedOffset,
    /// Deployment language used when a user has not picked one
    pub language: String,
    /// Deployment region used when a user has not picked one
    pub region: String,
}

impl CommandSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            top_limit: config.top_limit,
            utc_offset: config.digest_utc_offset,
            language: config.news_language.clone(),
            region: config.news_region.clone(),
        }
    }
}

/// Routes parsed commands to their handlers.
///
/// Every handler produces exactly one plain-text reply; failures are turned
/// into user-facing text here rather than surfacing to the transport.
pub struct CommandDispatcher {
    pub(crate) store: Arc<StateStore>,
    pub(crate) news: Arc<NewsAggregator>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) settings: CommandSettings,
    bot_name: String,
    /// Last list shown to each user, for `/save <number>`
    recent: Mutex<HashMap<i64, Vec<Article>>>,
}

impl CommandDispatcher {
    pub fn new(
        store: Arc<StateStore>,
        news: Arc<NewsAggregator>,
        clock: Arc<dyn Clock>,
        settings: CommandSettings,
        bot_name: impl Into<String>,
    ) -> Self {
        Self {
            store,
            news,
            clock,
            settings,
            bot_name: bot_name.into(),
            recent: Mutex::new(HashMap::new()),
        }
    }

    /// Whether `/cmd@name` is meant for a different bot
    pub fn addressed_elsewhere(&self, text: &str) -> bool {
        let command = text.split_whitespace().next().unwrap_or_default();
        match command.split_once('@') {
            Some((_, name)) => !name.eq_ignore_ascii_case(&self.bot_name),
            None => false,
        }
    }

    /// Parses `text` and runs the command; anything unparseable gets the help text
    pub async fn dispatch(&self, user_id: i64, text: &str) -> String {
        match Command::parse(text, &self.bot_name) {
            Ok(command) => self.handle(user_id, command).await,
            Err(e) => {
                tracing::debug!("Unrecognized command from user {}: {}", user_id, e);
                help_text()
            }
        }
    }

    pub async fn handle(&self, user_id: i64, command: Command) -> String {
        match command {
            Command::Help => {
                log_command_start("help", user_id, None);
                help_text()
            }
            Command::Start => general::handle_start(self, user_id).await,
            Command::Top(topic) => top::handle_top(self, user_id, &topic).await,
            Command::Digest(arg) => digest::handle_digest(self, user_id, &arg).await,
            Command::Topic(arg) => topic::handle_topic(self, user_id, &arg).await,
            Command::Search(arg) => search::handle_search(self, user_id, &arg).await,
            Command::Freq(arg) => freq::handle_freq(self, user_id, &arg).await,
            Command::Sources(arg) => sources::handle_sources(self, user_id, &arg).await,
            Command::Lang(arg) => locale::handle_lang(self, user_id, &arg).await,
            Command::Region(arg) => locale::handle_region(self, user_id, &arg).await,
            Command::Save(arg) => saved::handle_save(self, user_id, &arg).await,
            Command::Saved(arg) => saved::handle_saved(self, user_id, &arg).await,
            Command::About => general::handle_about(self, user_id),
        }
    }

    /// The user's profile, or a fresh one when they have none yet
    pub(crate) async fn profile(&self, user_id: i64) -> UserProfile {
        self.store.get(user_id).await.unwrap_or_else(|| UserProfile::new(user_id))
    }

    pub(crate) async fn remember_results(&self, user_id: i64, articles: Vec<Article>) {
        self.recent.lock().await.insert(user_id, articles);
    }

    pub(crate) async fn recent_result(&self, user_id: i64, number: usize) -> Option<Article> {
        let recent = self.recent.lock().await;
        number
            .checked_sub(1)
            .and_then(|index| recent.get(&user_id)?.get(index).cloned())
    }

    /// Saves after a mutation; on failure the store stays dirty for the next tick
    pub(crate) async fn persist_after(&self, command: &str) {
        if let Err(e) = self.store.persist().await {
            log_storage_error("persist", &e.to_string(), Some(&format!("after /{command}, will retry")));
        }
    }
}

pub(crate) fn sources_unavailable() -> String {
    feedback::error("News sources are unavailable right now. Please try again in a few minutes.")
}

pub fn help_text() -> String {
    Command::descriptions().to_string()
}
