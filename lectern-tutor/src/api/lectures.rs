//! Lecture cache API handlers
//!
//! GET /lectures/:fingerprint/:unit, DELETE /lectures/:fingerprint/:unit

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::cache::CacheKey;
use crate::error::{ApiError, ApiResult};
use crate::fingerprint::DocumentFingerprint;
use crate::script;
use crate::AppState;

/// GET /lectures/:fingerprint/:unit response
#[derive(Debug, Serialize)]
pub struct LectureResponse {
    pub document_fingerprint: DocumentFingerprint,
    pub unit_index: usize,
    /// Script as generated, with speech markers
    pub text: String,
    pub display_text: String,
    pub sentences: Vec<String>,
}

/// DELETE /lectures/:fingerprint/:unit response
#[derive(Debug, Serialize)]
pub struct InvalidateResponse {
    pub removed: bool,
}

fn cache_key(fingerprint: &str, unit_index: usize) -> ApiResult<CacheKey> {
    let fingerprint = DocumentFingerprint::parse(fingerprint)
        .ok_or_else(|| ApiError::BadRequest(format!("Invalid document fingerprint: {}", fingerprint)))?;
    if unit_index == 0 {
        return Err(ApiError::BadRequest("Unit indices start at 1".into()));
    }
    Ok(CacheKey::new(fingerprint, unit_index))
}

/// GET /lectures/:fingerprint/:unit
pub async fn get_lecture(
    State(state): State<AppState>,
    Path((fingerprint, unit_index)): Path<(String, usize)>,
) -> ApiResult<Json<LectureResponse>> {
    let key = cache_key(&fingerprint, unit_index)?;
    let text = state.cache.get(&key).await.ok_or_else(|| {
        ApiError::NotFound(format!("No cached lecture for unit {}", unit_index))
    })?;

    Ok(Json(LectureResponse {
        display_text: script::clean_for_display(&text),
        sentences: script::split_sentences(&text),
        document_fingerprint: key.fingerprint,
        unit_index,
        text,
    }))
}

/// DELETE /lectures/:fingerprint/:unit
///
/// The next teaching session regenerates the unit.
pub async fn invalidate_lecture(
    State(state): State<AppState>,
    Path((fingerprint, unit_index)): Path<(String, usize)>,
) -> ApiResult<Json<InvalidateResponse>> {
    let key = cache_key(&fingerprint, unit_index)?;
    Ok(Json(InvalidateResponse {
        removed: state.cache.invalidate(&key).await,
    }))
}

pub fn lecture_routes() -> Router<AppState> {
    Router::new().route(
        "/lectures/:fingerprint/:unit",
        get(get_lecture).delete(invalidate_lecture),
    )
}
