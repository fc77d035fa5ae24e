use chrono::{DateTime, Duration, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::bot::transport::MessageTransport;
use crate::config::Config;
use crate::news::{FetchOptions, NewsAggregator};
use crate::services::clock::Clock;
use crate::storage::{StateStore, UserProfile};
use crate::utils::datetime::due_occurrence;
use crate::utils::format::format_digest;
use crate::utils::logging::{log_delivery_error, log_system_event};

/// Outcome counts of one scheduler tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickReport {
    pub due: usize,
    pub sent: usize,
    pub failed: usize,
}

/// What the health endpoint knows about the scheduler
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchedulerStatus {
    pub last_tick: Option<DateTime<Utc>>,
    pub last_report: Option<TickReport>,
    pub ticks_completed: u64,
    pub ticks_skipped: u64,
}

pub type SharedSchedulerStatus = Arc<RwLock<SchedulerStatus>>;

#[derive(Debug, Clone)]
pub struct DigestSettings {
    pub utc_offset: FixedOffset,
    pub window: Duration,
    pub digest_limit: usize,
}

impl DigestSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            utc_offset: config.digest_utc_offset,
            window: Duration::minutes(config.digest_window_minutes),
            digest_limit: config.digest_limit,
        }
    }
}

enum Delivery {
    Sent,
    Empty,
    Failed,
}

/// Finds subscribers whose delivery time has come and sends their digests
pub struct DigestScheduler {
    store: Arc<StateStore>,
    news: Arc<NewsAggregator>,
    transport: Arc<dyn MessageTransport>,
    clock: Arc<dyn Clock>,
    settings: DigestSettings,
    running: Mutex<()>,
    status: SharedSchedulerStatus,
}

impl DigestScheduler {
    pub fn new(
        store: Arc<StateStore>,
        news: Arc<NewsAggregator>,
        transport: Arc<dyn MessageTransport>,
        clock: Arc<dyn Clock>,
        settings: DigestSettings,
    ) -> Self {
        Self {
            store,
            news,
            transport,
            clock,
            settings,
            running: Mutex::new(()),
            status: Arc::new(RwLock::new(SchedulerStatus::default())),
        }
    }

    pub fn status_handle(&self) -> SharedSchedulerStatus {
        self.status.clone()
    }

    pub async fn status(&self) -> SchedulerStatus {
        self.status.read().await.clone()
    }

    /// Runs one scheduling pass.
    ///
    /// Returns `None` without doing anything when another tick is still running.
    pub async fn tick(&self) -> Option<TickReport> {
        let Ok(_guard) = self.running.try_lock() else {
            tracing::warn!("Previous digest tick still running, skipping this one");
            self.status.write().await.ticks_skipped += 1;
            return None;
        };

        let now = self.clock.now();
        let mut report = TickReport::default();

        for profile in self.store.list_subscribed().await {
            if due_occurrence(&profile, now, self.settings.utc_offset, self.settings.window).is_none() {
                continue;
            }
            report.due += 1;

            match self.deliver(&profile, now).await {
                Delivery::Sent => report.sent += 1,
                Delivery::Failed => report.failed += 1,
                Delivery::Empty => {}
            }
        }

        if let Err(e) = self.store.persist_if_dirty().await {
            tracing::warn!("Digest tick could not save state, will retry: {}", e);
        }

        if report.due > 0 {
            log_system_event(
                "digest_tick",
                Some(&format!("due={} sent={} failed={}", report.due, report.sent, report.failed)),
            );
        }

        let mut status = self.status.write().await;
        status.last_tick = Some(now);
        status.last_report = Some(report);
        status.ticks_completed += 1;

        Some(report)
    }

    async fn deliver(&self, profile: &UserProfile, now: DateTime<Utc>) -> Delivery {
        let options = FetchOptions::for_profile(profile);
        let articles = match self
            .news
            .fetch_for_topics(&profile.topics, self.settings.digest_limit, &options)
            .await
        {
            Ok(articles) => articles,
            Err(e) => {
                log_delivery_error(profile.id, "fetch", &e.to_string());
                return Delivery::Failed;
            }
        };

        // Nothing to say: leave it unmarked so a later tick in the window can retry
        if articles.is_empty() {
            tracing::debug!("Digest for user {} is empty, not sending", profile.id);
            return Delivery::Empty;
        }

        let message = format_digest(&articles, now, self.settings.utc_offset);
        if let Err(e) = self.transport.send_message(profile.id, &message).await {
            log_delivery_error(profile.id, "send", &e.to_string());
            return Delivery::Failed;
        }

        // Saved right away so a crash later in the tick cannot resend it
        self.store.mark_sent(profile.id, now).await;
        if let Err(e) = self.store.persist().await {
            tracing::warn!("Could not save delivery to user {}, will retry: {}", profile.id, e);
        }
        tracing::info!("Sent digest with {} articles to user {}", articles.len(), profile.id);
        Delivery::Sent
    }
}

/// Drives [`DigestScheduler::tick`] from a cron schedule
pub struct DigestService {
    digest: Arc<DigestScheduler>,
    scheduler: JobScheduler,
    cron: String,
}

impl DigestService {
    pub async fn new(
        digest: Arc<DigestScheduler>,
        cron: impl Into<String>,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let scheduler = JobScheduler::new().await?;

        Ok(Self {
            digest,
            scheduler,
            cron: cron.into(),
        })
    }

    pub async fn start(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let digest = self.digest.clone();

        let tick_job = Job::new_async(self.cron.as_str(), move |_uuid, _l| {
            let digest = digest.clone();
            Box::pin(async move {
                digest.tick().await;
            })
        })?;

        self.scheduler.add(tick_job).await?;
        self.scheduler.start().await?;

        tracing::info!("Digest service started - schedule '{}'", self.cron);
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.scheduler.shutdown().await?;
        Ok(())
    }

    // Manual trigger for testing
    pub async fn check_now(&self) -> Option<TickReport> {
        self.digest.tick().await
    }
}
