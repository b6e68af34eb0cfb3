//! Attention session API handlers
//!
//! POST /sessions/:id/start, POST /sessions/:id/observe, GET /sessions/:id/status,
//! POST /sessions/:id/end, GET /sessions/:id/summary, GET /sessions

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use lectern_common::events::LecternEvent;
use lectern_common::SessionSummaryEntry;
use serde::{Deserialize, Serialize};

use crate::attention::FrameObservation;
use crate::db::attendance::{self, StoredSummary};
use crate::error::{ApiError, ApiResult};
use crate::registry::SessionStatus;
use crate::AppState;

/// POST /sessions/:id/start request
#[derive(Debug, Default, Deserialize)]
pub struct StartSessionRequest {
    /// Replace an already active session with the same id
    #[serde(default)]
    pub force: bool,
}

/// POST /sessions/:id/start response
#[derive(Debug, Serialize)]
pub struct StartSessionResponse {
    pub session_id: String,
    /// True when an active session was overwritten
    pub replaced: bool,
    pub started_at: DateTime<Utc>,
}

/// POST /sessions/:id/observe response
#[derive(Debug, Serialize)]
pub struct ObserveResponse {
    pub session_id: String,
    pub student_label: String,
    pub attentive: bool,
}

/// POST /sessions/:id/end response
#[derive(Debug, Serialize)]
pub struct EndSessionResponse {
    pub session_id: String,
    pub ended_at: DateTime<Utc>,
    pub summary: Vec<SessionSummaryEntry>,
    /// False when the summary could not be written to the database
    pub persisted: bool,
}

/// GET /sessions response
#[derive(Debug, Serialize)]
pub struct ActiveSessionsResponse {
    pub sessions: Vec<String>,
}

/// POST /sessions/:id/start
///
/// Returns 409 Conflict if the session is already active and `force` is not set.
pub async fn start_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    request: Option<Json<StartSessionRequest>>,
) -> ApiResult<Json<StartSessionResponse>> {
    let force = request.map(|Json(r)| r.force).unwrap_or(false);
    let replaced = state.registry.start_session(&session_id, force).await?;

    state.event_bus.emit_lossy(LecternEvent::AttentionSessionStarted {
        session_id: session_id.clone(),
        forced: replaced,
        timestamp: Utc::now(),
    });

    Ok(Json(StartSessionResponse {
        session_id,
        replaced,
        started_at: Utc::now(),
    }))
}

/// POST /sessions/:id/observe
///
/// Feeds one detector frame; responds with the student's smoothed verdict.
pub async fn observe(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(observation): Json<FrameObservation>,
) -> ApiResult<Json<ObserveResponse>> {
    let attentive = state.registry.observe(&session_id, &observation).await?;
    let student_label = observation.label().to_string();

    state.event_bus.emit_lossy(LecternEvent::AttentionUpdated {
        session_id: session_id.clone(),
        student_label: student_label.clone(),
        attentive,
        distraction_reason: if attentive {
            None
        } else {
            observation.reason().map(str::to_string)
        },
        timestamp: Utc::now(),
    });

    Ok(Json(ObserveResponse {
        session_id,
        student_label,
        attentive,
    }))
}

/// GET /sessions/:id/status
pub async fn session_status(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<Json<SessionStatus>> {
    Ok(Json(state.registry.live_status(&session_id).await?))
}

/// POST /sessions/:id/end
///
/// Summarizes and disposes the session, persists the summary and broadcasts
/// it. A persistence failure is logged and reported in the response but
/// never withholds the summary.
pub async fn end_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<Json<EndSessionResponse>> {
    let summary = state.registry.end_session(&session_id).await?;
    let ended_at = Utc::now();

    let persisted = match attendance::save_summary(&state.db, &session_id, ended_at, &summary).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(session_id = %session_id, error = %e, "Failed to persist attendance summary");
            state.record_error(format!("Failed to persist summary for {}: {}", session_id, e)).await;
            false
        }
    };

    state.event_bus.emit_lossy(LecternEvent::AttentionSessionEnded {
        session_id: session_id.clone(),
        summary: summary.clone(),
        timestamp: ended_at,
    });

    Ok(Json(EndSessionResponse {
        session_id,
        ended_at,
        summary,
        persisted,
    }))
}

/// GET /sessions/:id/summary
///
/// Persisted summary of an ended session.
pub async fn session_summary(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<Json<StoredSummary>> {
    attendance::load_summary(&state.db, &session_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("No summary for session {}", session_id)))
}

/// GET /sessions
pub async fn active_sessions(State(state): State<AppState>) -> Json<ActiveSessionsResponse> {
    Json(ActiveSessionsResponse {
        sessions: state.registry.active_sessions().await,
    })
}

pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/sessions", get(active_sessions))
        .route("/sessions/:id/start", post(start_session))
        .route("/sessions/:id/observe", post(observe))
        .route("/sessions/:id/status", get(session_status))
        .route("/sessions/:id/end", post(end_session))
        .route("/sessions/:id/summary", get(session_summary))
}
