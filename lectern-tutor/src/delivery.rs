//! Lesson delivery
//!
//! A deliverer blocks until the lesson has been played back. The pipeline
//! overlaps this wait with generation of the next unit.

use crate::error::DeliveryError;
use crate::script;
use async_trait::async_trait;
use chrono::Utc;
use lectern_common::events::{EventBus, LecternEvent, LessonSource};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

/// One unit ready for delivery
#[derive(Debug, Clone)]
pub struct Lesson {
    pub teach_id: Uuid,
    /// 1-based curriculum position
    pub unit_index: usize,
    pub total_units: usize,
    pub title: String,
    /// Full script including header and speech markers
    pub text: String,
    pub source: LessonSource,
}

#[async_trait]
pub trait LectureDeliverer: Send + Sync {
    /// Returns once playback has finished or `cancel` fired
    async fn deliver(&self, lesson: &Lesson, cancel: &CancellationToken) -> Result<(), DeliveryError>;
}

/// Streams sentences as `LessonSentence` events at speaking pace
///
/// Stands in for speech output: each sentence is held for as long as it
/// would take to say at `words_per_minute`, so connected UIs can highlight
/// along.
pub struct PacedEventDeliverer {
    event_bus: EventBus,
    words_per_minute: u32,
}

impl PacedEventDeliverer {
    pub fn new(event_bus: EventBus, words_per_minute: u32) -> Self {
        Self {
            event_bus,
            words_per_minute: words_per_minute.max(1),
        }
    }

    /// Time needed to speak `sentence`
    pub fn speaking_time(&self, sentence: &str) -> Duration {
        let words = sentence.split_whitespace().count() as f64;
        Duration::from_secs_f64(words * 60.0 / self.words_per_minute as f64)
    }
}

#[async_trait]
impl LectureDeliverer for PacedEventDeliverer {
    async fn deliver(&self, lesson: &Lesson, cancel: &CancellationToken) -> Result<(), DeliveryError> {
        let sentences = script::split_sentences(&lesson.text);
        debug!(
            teach_id = %lesson.teach_id,
            unit = lesson.unit_index,
            sentences = sentences.len(),
            "Delivering lesson"
        );

        for (sentence_index, sentence) in sentences.into_iter().enumerate() {
            let hold = self.speaking_time(&sentence);
            self.event_bus.emit_lossy(LecternEvent::LessonSentence {
                teach_id: lesson.teach_id,
                unit_index: lesson.unit_index,
                sentence_index,
                text: sentence,
                timestamp: Utc::now(),
            });

            tokio::select! {
                _ = cancel.cancelled() => return Err(DeliveryError::Cancelled),
                _ = tokio::time::sleep(hold) => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lesson(text: &str) -> Lesson {
        Lesson {
            teach_id: Uuid::new_v4(),
            unit_index: 1,
            total_units: 1,
            title: "Optics".into(),
            text: text.into(),
            source: LessonSource::Generated,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_sentences_paced_by_word_count() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        let deliverer = PacedEventDeliverer::new(bus, 60);

        let start = tokio::time::Instant::now();
        deliverer
            .deliver(&lesson("Lesson 1\n\nLight bends. [PAUSE] Lenses focus light."), &CancellationToken::new())
            .await
            .unwrap();

        // 2 + 3 words at one word per second
        assert_eq!(start.elapsed(), Duration::from_secs(5));

        let mut texts = Vec::new();
        while let Ok(LecternEvent::LessonSentence { text, .. }) = rx.try_recv() {
            texts.push(text);
        }
        assert_eq!(texts, vec!["Light bends.", "Lenses focus light."]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_interrupts_delivery() {
        let deliverer = PacedEventDeliverer::new(EventBus::new(16), 1);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = deliverer.deliver(&lesson("A long sentence here."), &cancel).await;
        assert!(matches!(result, Err(DeliveryError::Cancelled)));
    }
}
