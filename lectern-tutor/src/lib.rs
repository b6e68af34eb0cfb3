//! lectern-tutor library interface
//!
//! Autonomous lecture delivery: curriculum units are generated (or read
//! from the lecture cache) one unit ahead of delivery.
//! Exposes public APIs for integration testing.

pub mod api;
pub mod cache;
pub mod config;
pub mod curriculum;
pub mod delivery;
pub mod error;
pub mod fingerprint;
pub mod pipeline;
pub mod prompt;
pub mod providers;
pub mod retrieval;
pub mod script;
pub mod teaching;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use cache::LectureCache;
use chrono::{DateTime, Utc};
use config::TutorConfig;
use delivery::LectureDeliverer;
use lectern_common::events::EventBus;
use providers::ProviderChain;
use std::sync::Arc;
use teaching::{TeachingSessions, TutorServices};
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    /// Generated lectures, shared by all teaching sessions
    pub cache: LectureCache,
    /// Running and finished teaching sessions
    pub teaching: Arc<TeachingSessions>,
    pub config: Arc<TutorConfig>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last error for diagnostic purposes
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(
        config: TutorConfig,
        event_bus: EventBus,
        cache: LectureCache,
        chain: ProviderChain,
        deliverer: Arc<dyn LectureDeliverer>,
    ) -> Self {
        let services = TutorServices {
            cache: cache.clone(),
            chain: Arc::new(chain),
            deliverer,
            event_bus: event_bus.clone(),
            inter_unit_pause: config.inter_unit_pause(),
        };

        let last_error = Arc::new(RwLock::new(None));

        Self {
            event_bus,
            cache,
            teaching: Arc::new(TeachingSessions::new(services, Arc::clone(&last_error))),
            config: Arc::new(config),
            startup_time: Utc::now(),
            last_error,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .merge(api::teach_routes())
        .merge(api::lecture_routes())
        .merge(api::health_routes())
        .route("/events", get(api::event_stream))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
