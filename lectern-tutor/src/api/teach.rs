//! Teaching session API handlers
//!
//! POST /teach/start, POST /teach/:id/stop, GET /teach/:id/status, GET /teach

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::curriculum::Curriculum;
use crate::error::{ApiError, ApiResult};
use crate::fingerprint::DocumentFingerprint;
use crate::pipeline::TeachingProgress;
use crate::retrieval::{ChunkRetriever, ContextRetriever, NoContext};
use crate::teaching::TeachRequest;
use crate::AppState;

/// POST /teach/start request
///
/// `document_text` alone is enough: the fingerprint, the curriculum and the
/// retrieval chunks are all derived from it. Without it, `document_fingerprint`
/// and `units` are required and lessons come from the cache or from
/// providers that can teach without context.
#[derive(Debug, Default, Deserialize)]
pub struct StartTeachingRequest {
    pub document_text: Option<String>,
    pub document_fingerprint: Option<String>,
    /// Explicit unit titles, overriding heading extraction
    pub units: Option<Vec<String>>,
    /// Explicit retrieval chunks, overriding paragraph chunking
    pub chunks: Option<Vec<String>>,
}

/// POST /teach/start response
#[derive(Debug, Serialize)]
pub struct StartTeachingResponse {
    pub teach_id: Uuid,
    pub document_fingerprint: DocumentFingerprint,
    pub total_units: usize,
    pub units: Vec<String>,
}

/// POST /teach/:id/stop response
#[derive(Debug, Serialize)]
pub struct StopTeachingResponse {
    pub teach_id: Uuid,
    pub stopping: bool,
}

/// GET /teach response
#[derive(Debug, Serialize)]
pub struct ActiveTeachingResponse {
    pub sessions: Vec<Uuid>,
}

/// POST /teach/start
pub async fn start_teaching(
    State(state): State<AppState>,
    Json(request): Json<StartTeachingRequest>,
) -> ApiResult<Json<StartTeachingResponse>> {
    let fingerprint = match (&request.document_text, &request.document_fingerprint) {
        (Some(text), _) => DocumentFingerprint::from_bytes(text.as_bytes()),
        (None, Some(value)) => DocumentFingerprint::parse(value).ok_or_else(|| {
            ApiError::BadRequest(format!("Invalid document fingerprint: {}", value))
        })?,
        (None, None) => {
            return Err(ApiError::BadRequest(
                "document_text or document_fingerprint is required".into(),
            ))
        }
    };

    let curriculum = match (&request.units, &request.document_text) {
        (Some(units), _) => Curriculum::from_titles(units),
        (None, Some(text)) => Curriculum::extract(text),
        (None, None) => Curriculum::default(),
    };
    if curriculum.is_empty() {
        return Err(ApiError::BadRequest(
            "No curriculum units: supply units or a document with chapter headings".into(),
        ));
    }

    let retriever: Arc<dyn ContextRetriever> = match (request.chunks, &request.document_text) {
        (Some(chunks), _) => Arc::new(ChunkRetriever::new(chunks)),
        (None, Some(text)) => Arc::new(ChunkRetriever::from_document(text)),
        (None, None) => Arc::new(NoContext),
    };

    let units = curriculum.titles();
    let teach_id = state
        .teaching
        .start(TeachRequest {
            fingerprint: fingerprint.clone(),
            curriculum,
            retriever,
        })
        .await?;

    Ok(Json(StartTeachingResponse {
        teach_id,
        document_fingerprint: fingerprint,
        total_units: units.len(),
        units,
    }))
}

/// POST /teach/:id/stop
///
/// Returns immediately; the session winds down in the background.
/// `stopping` is false when the session had already finished.
pub async fn stop_teaching(
    State(state): State<AppState>,
    Path(teach_id): Path<Uuid>,
) -> ApiResult<Json<StopTeachingResponse>> {
    let stopping = state
        .teaching
        .stop(teach_id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Teaching session {}", teach_id)))?;
    Ok(Json(StopTeachingResponse { teach_id, stopping }))
}

/// GET /teach/:id/status
pub async fn teaching_status(
    State(state): State<AppState>,
    Path(teach_id): Path<Uuid>,
) -> ApiResult<Json<TeachingProgress>> {
    state
        .teaching
        .progress(teach_id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Teaching session {}", teach_id)))
}

/// GET /teach
pub async fn active_teaching(State(state): State<AppState>) -> Json<ActiveTeachingResponse> {
    Json(ActiveTeachingResponse {
        sessions: state.teaching.active_sessions().await,
    })
}

pub fn teach_routes() -> Router<AppState> {
    Router::new()
        .route("/teach", get(active_teaching))
        .route("/teach/start", post(start_teaching))
        .route("/teach/:id/stop", post(stop_teaching))
        .route("/teach/:id/status", get(teaching_status))
}
