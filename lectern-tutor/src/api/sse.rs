//! Server-Sent Events for live lesson updates

use crate::AppState;
use axum::{
    extract::State,
    response::sse::{Event, Sse},
};
use futures::stream::Stream;
use lectern_common::events::LecternEvent;
use std::convert::Infallible;

/// GET /events
///
/// Streams teaching progress, lesson starts, sentences and fallbacks.
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    lectern_common::sse::event_stream(
        "lectern-tutor",
        &state.event_bus,
        LecternEvent::is_teaching_event,
    )
}
