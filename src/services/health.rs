use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::services::digest::{SharedSchedulerStatus, TickReport};
use crate::storage::StateStore;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub storage: StorageHealth,
    pub scheduler: SchedulerHealth,
    pub providers: Vec<String>,
    pub uptime_seconds: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StorageHealth {
    pub status: String,
    pub profiles: usize,
    pub subscribed: usize,
    pub unsaved_changes: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SchedulerHealth {
    pub last_tick: Option<DateTime<Utc>>,
    pub last_report: Option<TickReport>,
    pub ticks_completed: u64,
    pub ticks_skipped: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<StateStore>,
    pub scheduler: SharedSchedulerStatus,
    pub providers: Vec<String>,
    pub start_time: DateTime<Utc>,
}

pub struct HealthService {
    pub router: Router,
}

impl HealthService {
    pub fn new(store: Arc<StateStore>, scheduler: SharedSchedulerStatus, providers: Vec<String>) -> Self {
        let state = AppState {
            store,
            scheduler,
            providers,
            start_time: Utc::now(),
        };

        let router = Router::new()
            .route("/health", get(health_check))
            .route("/health/ready", get(readiness_check))
            .route("/health/live", get(liveness_check))
            .layer(TraceLayer::new_for_http())
            .with_state(state);

        Self { router }
    }
}

async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>, StatusCode> {
    let persist_failed = state.store.last_persist_failed().await;
    let storage_status = if persist_failed { "unhealthy" } else { "healthy" };

    let scheduler = state.scheduler.read().await.clone();
    let uptime = Utc::now()
        .signed_duration_since(state.start_time)
        .num_seconds()
        .max(0) as u64;

    let health_response = HealthResponse {
        status: storage_status.to_string(),
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        storage: StorageHealth {
            status: storage_status.to_string(),
            profiles: state.store.len().await,
            subscribed: state.store.list_subscribed().await.len(),
            unsaved_changes: state.store.is_dirty().await,
        },
        scheduler: SchedulerHealth {
            last_tick: scheduler.last_tick,
            last_report: scheduler.last_report,
            ticks_completed: scheduler.ticks_completed,
            ticks_skipped: scheduler.ticks_skipped,
        },
        providers: state.providers.clone(),
        uptime_seconds: uptime,
    };

    if health_response.status == "healthy" {
        Ok(Json(health_response))
    } else {
        Err(StatusCode::SERVICE_UNAVAILABLE)
    }
}

async fn readiness_check(State(state): State<AppState>) -> Result<Json<&'static str>, StatusCode> {
    // Without a news source or a writable state file the bot can't do its job
    if state.providers.is_empty() || state.store.last_persist_failed().await {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }
    Ok(Json("ready"))
}

async fn liveness_check() -> Json<&'static str> {
    Json("alive")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::digest::SchedulerStatus;
    use axum_test::TestServer;
    use tempfile::TempDir;
    use tokio::sync::RwLock;

    fn create_test_health_service(providers: Vec<String>) -> (HealthService, Arc<StateStore>, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = Arc::new(StateStore::empty(temp_dir.path().join("bot_data.json")));
        let status = Arc::new(RwLock::new(SchedulerStatus::default()));
        (HealthService::new(store.clone(), status, providers), store, temp_dir)
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (health_service, store, _temp_dir) = create_test_health_service(vec!["rss".to_string()]);
        store.update(42, |p| p.topics.push("rust".to_string())).await;
        let server = TestServer::new(health_service.router).expect("Failed to create test server");

        let response = server.get("/health").await;

        assert_eq!(response.status_code(), StatusCode::OK);

        let health_response: HealthResponse = response.json();
        assert_eq!(health_response.status, "healthy");
        assert_eq!(health_response.storage.profiles, 1);
        assert_eq!(health_response.storage.subscribed, 0);
        assert!(health_response.storage.unsaved_changes);
        assert_eq!(health_response.providers, vec!["rss".to_string()]);
        assert_eq!(health_response.version, env!("CARGO_PKG_VERSION"));
        assert!(health_response.scheduler.last_tick.is_none());
    }

    #[tokio::test]
    async fn test_health_reports_failed_persist() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        // A directory where the state file should be makes the rename fail
        let path = temp_dir.path().join("state");
        std::fs::create_dir(&path).expect("Failed to create blocking directory");
        std::fs::write(path.join("keep"), b"x").expect("Failed to fill blocking directory");

        let store = Arc::new(StateStore::empty(&path));
        store.update(1, |_| ()).await;
        assert!(store.persist().await.is_err());

        let status = Arc::new(RwLock::new(SchedulerStatus::default()));
        let service = HealthService::new(store, status, vec!["rss".to_string()]);
        let server = TestServer::new(service.router).expect("Failed to create test server");

        let response = server.get("/health").expect_failure().await;
        assert_eq!(response.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_readiness_endpoint() {
        let (health_service, _store, _temp_dir) = create_test_health_service(vec!["newsapi".to_string()]);
        let server = TestServer::new(health_service.router).expect("Failed to create test server");

        let response = server.get("/health/ready").await;

        assert_eq!(response.status_code(), StatusCode::OK);

        let ready_response: String = response.json();
        assert_eq!(ready_response, "ready");
    }

    #[tokio::test]
    async fn test_not_ready_without_providers() {
        let (health_service, _store, _temp_dir) = create_test_health_service(Vec::new());
        let server = TestServer::new(health_service.router).expect("Failed to create test server");

        let response = server.get("/health/ready").expect_failure().await;

        assert_eq!(response.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_liveness_endpoint() {
        let (health_service, _store, _temp_dir) = create_test_health_service(Vec::new());
        let server = TestServer::new(health_service.router).expect("Failed to create test server");

        let response = server.get("/health/live").await;

        assert_eq!(response.status_code(), StatusCode::OK);

        let alive_response: String = response.json();
        assert_eq!(alive_response, "alive");
    }
}
