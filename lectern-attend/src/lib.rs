//! lectern-attend library interface
//!
//! Real-time attentiveness classification and attendance summaries.
//! Exposes public APIs for integration testing.

pub mod api;
pub mod attention;
pub mod config;
pub mod db;
pub mod error;
pub mod registry;

pub use crate::error::{ApiError, ApiResult, AttendError};

use axum::Router;
use chrono::{DateTime, Utc};
use config::AttentionConfig;
use lectern_common::events::EventBus;
use registry::SessionRegistry;
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool (attendance summaries)
    pub db: SqlitePool,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    /// Active attention sessions
    pub registry: Arc<SessionRegistry>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last error for diagnostic purposes
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(db: SqlitePool, event_bus: EventBus, config: AttentionConfig) -> Self {
        Self {
            db,
            event_bus,
            registry: Arc::new(SessionRegistry::new(config)),
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Remember an error for `/health` diagnostics
    pub async fn record_error(&self, message: String) {
        *self.last_error.write().await = Some(message);
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .merge(api::session_routes())
        .merge(api::health_routes())
        .route("/events", get(api::event_stream))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
