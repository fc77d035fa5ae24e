//! # News Digest Bot Main Entry Point
//!
//! Initializes logging, loads configuration and the state file, starts the
//! digest service and the health server, and runs the Telegram bot.

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use news_digest_bot::bot::{BotHandler, CommandDispatcher, CommandSettings, MessageTransport};
use news_digest_bot::config::Config;
use news_digest_bot::news::NewsAggregator;
use news_digest_bot::services::{
    Clock, DigestScheduler, DigestService, DigestSettings, HealthService, SystemClock,
};
use news_digest_bot::storage::StateStore;
use news_digest_bot::utils::logging::log_system_event;

/// Client for provider traffic; bounded by the provider timeout
fn news_http_client(config: &Config) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .timeout(config.http_timeout)
        .user_agent(concat!("news-digest-bot/", env!("CARGO_PKG_VERSION")));
    if let Some(proxy) = &config.proxy_url {
        builder = builder.proxy(reqwest::Proxy::all(proxy)?);
    }
    Ok(builder.build()?)
}

fn telegram_http_client(config: &Config) -> Result<reqwest::Client> {
    let mut builder = teloxide::net::default_reqwest_settings();
    if let Some(proxy) = &config.proxy_url {
        builder = builder.proxy(reqwest::Proxy::all(proxy)?);
    }
    Ok(builder.build()?)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "news_digest_bot=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    info!("Starting News Digest Bot v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration loaded - Data file: {}, HTTP Port: {}, Providers: {:?}",
        config.data_file.display(),
        config.http_port,
        config.enabled_providers()
    );

    // A corrupt or unreadable state file is fatal; we never start from scratch over it
    info!("Loading state file...");
    let store = Arc::new(StateStore::load(&config.data_file).await?);
    info!("State loaded - {} profiles", store.len().await);

    let news = Arc::new(NewsAggregator::from_config(&config, news_http_client(&config)?));
    if news.is_empty() {
        tracing::warn!("No news providers configured; set NEWSAPI_KEY, MEDIASTACK_API_KEY or RSS_FEEDS");
    }

    // Initialize bot
    info!("Initializing Telegram bot...");
    let bot = Bot::with_client(&config.telegram_bot_token, telegram_http_client(&config)?);
    let bot_name = match bot.get_me().await {
        Ok(me) => me.username().to_string(),
        Err(e) => {
            tracing::warn!("Could not fetch bot username, addressed commands will not match: {}", e);
            String::new()
        }
    };

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let dispatcher = Arc::new(CommandDispatcher::new(
        store.clone(),
        news.clone(),
        clock.clone(),
        CommandSettings::from_config(&config),
        bot_name,
    ));
    let handler = BotHandler::new(dispatcher);
    info!("Telegram bot initialized successfully");

    // Initialize and start digest service
    info!("Initializing digest service...");
    let transport: Arc<dyn MessageTransport> = Arc::new(bot.clone());
    let digest = Arc::new(DigestScheduler::new(
        store.clone(),
        news.clone(),
        transport,
        clock,
        DigestSettings::from_config(&config),
    ));
    let mut digest_service = match DigestService::new(digest.clone(), config.digest_tick_cron.clone()).await {
        Ok(service) => service,
        Err(e) => {
            tracing::error!("Failed to create digest service: {}", e);
            return Err(anyhow::anyhow!("Failed to create digest service: {}", e));
        }
    };

    if let Err(e) = digest_service.start().await {
        tracing::error!("Failed to start digest service: {}", e);
        return Err(anyhow::anyhow!("Failed to start digest service: {}", e));
    }

    // Initialize health service
    let health_service = HealthService::new(store.clone(), digest.status_handle(), news.provider_names());
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.http_port))
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to port {}: {}", config.http_port, e))?;

    info!("Health check server starting on port {}", config.http_port);
    log_system_event("startup", Some("bot, digest service and health server running"));

    let bot_task = tokio::spawn(async move {
        Dispatcher::builder(bot, handler.schema())
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;
    });

    let health_task = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, health_service.router).await {
            tracing::error!("Health server error: {}", e);
        }
    });

    // Wait for either task to complete (which would indicate shutdown)
    tokio::select! {
        result1 = bot_task => {
            if let Err(e) = result1 {
                tracing::error!("Bot task error: {}", e);
            }
        }
        result2 = health_task => {
            if let Err(e) = result2 {
                tracing::error!("Health task error: {}", e);
            }
        }
    }

    if let Err(e) = digest_service.stop().await {
        tracing::warn!("Error stopping digest service: {}", e);
    }

    match store.persist_if_dirty().await {
        Ok(true) => info!("Saved pending state changes"),
        Ok(false) => {}
        Err(e) => tracing::error!("Failed to save state on shutdown: {}", e),
    }

    log_system_event("shutdown", None);
    info!("Application stopped");
    Ok(())
}
