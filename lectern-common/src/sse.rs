//! Server-Sent Events (SSE) utilities
//!
//! Shared SSE stream used by both services' `GET /events` endpoints.

use crate::events::{EventBus, LecternEvent};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

/// Interval between heartbeat comments and keep-alive frames
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

/// Stream bus events accepted by `filter` to one SSE client
///
/// Each event is sent with its variant name as the SSE event field and its
/// JSON serialization as data. A heartbeat comment is sent whenever the bus
/// has been quiet for [`HEARTBEAT_INTERVAL`].
///
/// ```rust,ignore
/// pub async fn event_stream(
///     State(state): State<AppState>,
/// ) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
///     lectern_common::sse::event_stream("lectern-attend", &state.event_bus, LecternEvent::is_attention_event)
/// }
/// ```
pub fn event_stream(
    service_name: &'static str,
    bus: &EventBus,
    filter: fn(&LecternEvent) -> bool,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!("New SSE client connected to {} events", service_name);

    let mut rx = bus.subscribe();

    let stream = async_stream::stream! {
        yield Ok(Event::default().event("ConnectionStatus").data("connected"));

        loop {
            tokio::select! {
                _ = tokio::time::sleep(HEARTBEAT_INTERVAL) => {
                    debug!("SSE: Sending heartbeat");
                    yield Ok(Event::default().comment("heartbeat"));
                }

                received = rx.recv() => {
                    match received {
                        Ok(event) if filter(&event) => {
                            let event_type = event.event_type();
                            match serde_json::to_string(&event) {
                                Ok(json) => {
                                    debug!("SSE: Broadcasting {} event: {}", service_name, event_type);
                                    yield Ok(Event::default().event(event_type).data(json));
                                }
                                Err(e) => {
                                    warn!("SSE: Failed to serialize event {}: {}", event_type, e);
                                }
                            }
                        }
                        Ok(_) => {}
                        Err(RecvError::Lagged(skipped)) => {
                            warn!("SSE: {} client lagged, {} events skipped", service_name, skipped);
                        }
                        Err(RecvError::Closed) => {
                            info!("SSE: {} event bus closed", service_name);
                            break;
                        }
                    }
                }
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(HEARTBEAT_INTERVAL)
            .text("heartbeat"),
    )
}
