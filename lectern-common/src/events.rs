//! Event types for the Lectern event system
//!
//! Provides the shared event enum and the broadcast `EventBus` used by
//! both services to feed their SSE endpoints.

use crate::summary::SessionSummaryEntry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Where a delivered lesson's text came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LessonSource {
    /// Read back from the lecture cache
    Cached,
    /// Freshly produced by a generation provider
    Generated,
    /// Every attempt failed; the apology message was delivered instead
    Fallback,
}

/// Lectern event types
///
/// Events are broadcast via `EventBus` and serialized for SSE transmission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LecternEvent {
    /// An attention session was (re)started
    AttentionSessionStarted {
        session_id: String,
        /// True when an active session was overwritten
        forced: bool,
        timestamp: DateTime<Utc>,
    },

    /// Smoothed verdict for one student after one frame
    AttentionUpdated {
        session_id: String,
        student_label: String,
        attentive: bool,
        /// Reason reported by the detector for a distracted frame
        distraction_reason: Option<String>,
        timestamp: DateTime<Utc>,
    },

    /// An attention session ended with its per-student summary
    AttentionSessionEnded {
        session_id: String,
        summary: Vec<SessionSummaryEntry>,
        timestamp: DateTime<Utc>,
    },

    /// A teaching session started
    TeachingStarted {
        teach_id: Uuid,
        document_fingerprint: String,
        total_units: usize,
        timestamp: DateTime<Utc>,
    },

    /// Delivery of a lesson unit began
    LessonStarted {
        teach_id: Uuid,
        /// 1-based unit index
        unit_index: usize,
        unit_title: String,
        /// Percentage of the curriculum reached with this unit
        progress: u8,
        source: LessonSource,
        timestamp: DateTime<Utc>,
    },

    /// One sentence of the lesson is being delivered (for UI highlighting)
    LessonSentence {
        teach_id: Uuid,
        unit_index: usize,
        sentence_index: usize,
        text: String,
        timestamp: DateTime<Utc>,
    },

    /// Delivery of a lesson unit finished
    LessonCompleted {
        teach_id: Uuid,
        unit_index: usize,
        timestamp: DateTime<Utc>,
    },

    /// A unit could not be generated and the fallback message was used
    LessonFallback {
        teach_id: Uuid,
        unit_index: usize,
        reason: String,
        timestamp: DateTime<Utc>,
    },

    /// Every unit of the curriculum has been delivered
    TeachingCompleted {
        teach_id: Uuid,
        units_delivered: usize,
        timestamp: DateTime<Utc>,
    },

    /// The teaching session was stopped before the end of the curriculum
    TeachingCancelled {
        teach_id: Uuid,
        units_delivered: usize,
        timestamp: DateTime<Utc>,
    },
}

impl LecternEvent {
    /// Get event type as string for SSE event field
    pub fn event_type(&self) -> &'static str {
        match self {
            LecternEvent::AttentionSessionStarted { .. } => "AttentionSessionStarted",
            LecternEvent::AttentionUpdated { .. } => "AttentionUpdated",
            LecternEvent::AttentionSessionEnded { .. } => "AttentionSessionEnded",
            LecternEvent::TeachingStarted { .. } => "TeachingStarted",
            LecternEvent::LessonStarted { .. } => "LessonStarted",
            LecternEvent::LessonSentence { .. } => "LessonSentence",
            LecternEvent::LessonCompleted { .. } => "LessonCompleted",
            LecternEvent::LessonFallback { .. } => "LessonFallback",
            LecternEvent::TeachingCompleted { .. } => "TeachingCompleted",
            LecternEvent::TeachingCancelled { .. } => "TeachingCancelled",
        }
    }

    /// True for events emitted by lectern-attend
    pub fn is_attention_event(&self) -> bool {
        matches!(
            self,
            LecternEvent::AttentionSessionStarted { .. }
                | LecternEvent::AttentionUpdated { .. }
                | LecternEvent::AttentionSessionEnded { .. }
        )
    }

    /// True for events emitted by lectern-tutor
    pub fn is_teaching_event(&self) -> bool {
        !self.is_attention_event()
    }
}

/// Central event distribution bus
///
/// Wraps `tokio::sync::broadcast`: publishing never blocks, slow subscribers
/// observe `Lagged` instead of stalling producers, and receivers clean up on drop.
///
/// ```
/// use lectern_common::events::{EventBus, LecternEvent};
///
/// let bus = EventBus::new(100);
/// let mut rx = bus.subscribe();
///
/// bus.emit_lossy(LecternEvent::AttentionSessionStarted {
///     session_id: "room-101".to_string(),
///     forced: false,
///     timestamp: chrono::Utc::now(),
/// });
/// assert!(rx.try_recv().is_ok());
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<LecternEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<LecternEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)`, or `Err` if nobody is listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: LecternEvent,
    ) -> Result<usize, broadcast::error::SendError<LecternEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: LecternEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started(id: &str) -> LecternEvent {
        LecternEvent::AttentionSessionStarted {
            session_id: id.to_string(),
            forced: false,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_emit_without_subscribers_fails() {
        let bus = EventBus::new(10);
        assert!(bus.emit(started("a")).is_err());
        bus.emit_lossy(started("a"));
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let bus = EventBus::new(10);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        assert_eq!(bus.emit(started("room")).ok(), Some(2));

        for rx in [&mut rx1, &mut rx2] {
            match rx.recv().await.unwrap() {
                LecternEvent::AttentionSessionStarted { session_id, .. } => {
                    assert_eq!(session_id, "room")
                }
                other => panic!("unexpected event {:?}", other),
            }
        }
    }

    #[test]
    fn test_serialized_event_is_tagged() {
        let event = LecternEvent::LessonFallback {
            teach_id: Uuid::new_v4(),
            unit_index: 2,
            reason: "timeout".to_string(),
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "LessonFallback");
        assert_eq!(json["unit_index"], 2);
        assert_eq!(event.event_type(), "LessonFallback");
        assert!(event.is_teaching_event());
    }

    #[test]
    fn test_capacity_reported() {
        assert_eq!(EventBus::new(42).capacity(), 42);
    }
}
