//! Background prefetch pipeline
//!
//! Teaches a curriculum unit by unit. While unit N is being delivered, a
//! single background task produces unit N+1 (cache hit or generation) and
//! hands the result back through a oneshot channel. When delivery of N
//! ends the pipeline joins that task, so generation only adds latency when
//! it is slower than delivery.
//!
//! A unit whose background production failed is retried synchronously; if
//! that fails too, the apology message is delivered and teaching moves on.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use lectern_common::events::{EventBus, LecternEvent, LessonSource};
use serde::Serialize;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::cache::{CacheKey, LectureCache};
use crate::curriculum::{Curriculum, CurriculumUnit};
use crate::delivery::{LectureDeliverer, Lesson};
use crate::error::{DeliveryError, GenerationError, PipelineError};
use crate::fingerprint::DocumentFingerprint;
use crate::providers::{GenerationRequest, ProviderChain};
use crate::retrieval::ContextRetriever;
use crate::script;

/// Teaching session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PipelineState {
    Idle,
    /// Producing unit 1 in the foreground
    GeneratingFirst,
    /// Delivering `unit` while the next one is produced in the background
    Delivering { unit: usize },
    /// Delivery finished; waiting for `unit` to be ready
    GeneratingNext { unit: usize },
    Done,
    Cancelled,
}

impl PipelineState {
    pub fn can_transition_to(&self, next: &PipelineState) -> bool {
        use PipelineState::*;
        matches!(
            (self, next),
            (Idle, GeneratingFirst)
                | (GeneratingFirst, Delivering { .. })
                | (Delivering { .. }, GeneratingNext { .. })
                | (GeneratingNext { .. }, Delivering { .. })
                | (Delivering { .. }, Done)
                | (
                    Idle | GeneratingFirst | Delivering { .. } | GeneratingNext { .. },
                    Cancelled
                )
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Cancelled)
    }
}

/// Lesson text ready for delivery
#[derive(Debug, Clone)]
pub struct ProducedLesson {
    pub text: String,
    pub source: LessonSource,
    /// Provider that generated the text, if any
    pub provider: Option<&'static str>,
    /// Why a scripted message replaced the lecture
    pub fallback_reason: Option<String>,
}

impl ProducedLesson {
    fn fallback(unit: &CurriculumUnit, reason: String) -> Self {
        Self {
            text: script::fallback_message(unit.index, &unit.title),
            source: LessonSource::Fallback,
            provider: None,
            fallback_reason: Some(reason),
        }
    }
}

pub type UnitResult = Result<ProducedLesson, GenerationError>;

/// Produces one unit: cache lookup, then retrieval and generation
#[derive(Clone)]
pub struct LessonProducer {
    cache: LectureCache,
    chain: Arc<ProviderChain>,
    retriever: Arc<dyn ContextRetriever>,
    fingerprint: DocumentFingerprint,
    total_units: usize,
}

impl LessonProducer {
    pub fn new(
        cache: LectureCache,
        chain: Arc<ProviderChain>,
        retriever: Arc<dyn ContextRetriever>,
        fingerprint: DocumentFingerprint,
        total_units: usize,
    ) -> Self {
        Self {
            cache,
            chain,
            retriever,
            fingerprint,
            total_units,
        }
    }

    pub fn fingerprint(&self) -> &DocumentFingerprint {
        &self.fingerprint
    }

    pub async fn produce(&self, unit: &CurriculumUnit, cancel: &CancellationToken) -> UnitResult {
        let key = CacheKey::new(self.fingerprint.clone(), unit.index);
        if let Some(text) = self.cache.get(&key).await {
            return Ok(ProducedLesson {
                text,
                source: LessonSource::Cached,
                provider: None,
                fallback_reason: None,
            });
        }

        let context = self.retriever.retrieve(&unit.title).await;
        let request = GenerationRequest::new(unit.index, self.total_units, &unit.title, context);

        match self.chain.generate(&request, cancel).await {
            Ok(generated) => {
                let text = format!("{}{}", script::lesson_header(unit.index), generated.text);
                self.cache.put(&key, &text).await;
                Ok(ProducedLesson {
                    text,
                    source: LessonSource::Generated,
                    provider: Some(generated.provider_id),
                    fallback_reason: None,
                })
            }
            // Nothing in the document and no provider could teach without it
            Err(GenerationError::Exhausted(reason)) if !request.has_context() => {
                Ok(ProducedLesson {
                    text: script::no_content_message(unit.index, &unit.title),
                    source: LessonSource::Fallback,
                    provider: None,
                    fallback_reason: Some(format!("No textbook content ({})", reason)),
                })
            }
            Err(e) => Err(e),
        }
    }
}

struct InFlight {
    unit_index: usize,
    result: oneshot::Receiver<UnitResult>,
    handle: JoinHandle<()>,
}

/// Holder for the single background production task
///
/// The result is written once by the task and read once by `join`.
#[derive(Default)]
pub struct BackgroundSlot {
    in_flight: Option<InFlight>,
}

impl BackgroundSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_flight_unit(&self) -> Option<usize> {
        self.in_flight.as_ref().map(|f| f.unit_index)
    }

    /// Spawn production of `unit_index`; fails if a task is already in flight
    pub fn launch<F>(&mut self, unit_index: usize, job: F) -> Result<(), PipelineError>
    where
        F: Future<Output = UnitResult> + Send + 'static,
    {
        if let Some(current) = &self.in_flight {
            return Err(PipelineError::PrefetchInFlight {
                in_flight: current.unit_index,
                requested: unit_index,
            });
        }

        let (tx, rx) = oneshot::channel();
        let handle = tokio::spawn(async move {
            let _ = tx.send(job.await);
        });
        self.in_flight = Some(InFlight {
            unit_index,
            result: rx,
            handle,
        });
        Ok(())
    }

    /// Wait for the in-flight task producing `unit_index`
    ///
    /// `None` when no such task exists or it ended without a result.
    pub async fn join(&mut self, unit_index: usize) -> Option<UnitResult> {
        if self.in_flight_unit() != Some(unit_index) {
            return None;
        }
        let in_flight = self.in_flight.take()?;
        in_flight.result.await.ok()
    }

    pub fn abort(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            in_flight.handle.abort();
        }
    }
}

/// Per-unit line of a teaching report
#[derive(Debug, Clone, Serialize)]
pub struct UnitReport {
    pub unit_index: usize,
    pub title: String,
    pub source: LessonSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TeachingOutcome {
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize)]
pub struct TeachingReport {
    pub teach_id: Uuid,
    pub document_fingerprint: DocumentFingerprint,
    pub outcome: TeachingOutcome,
    /// Delivered units in order
    pub units: Vec<UnitReport>,
}

/// Live view published after every state change
#[derive(Debug, Clone, Serialize)]
pub struct TeachingProgress {
    pub teach_id: Uuid,
    pub document_fingerprint: DocumentFingerprint,
    #[serde(flatten)]
    pub state: PipelineState,
    pub total_units: usize,
    pub units_delivered: usize,
    pub progress_percent: u8,
    pub units: Vec<UnitReport>,
}

pub struct PrefetchPipeline {
    teach_id: Uuid,
    curriculum: Curriculum,
    producer: LessonProducer,
    deliverer: Arc<dyn LectureDeliverer>,
    event_bus: EventBus,
    inter_unit_pause: Duration,
    cancel: CancellationToken,
    state: PipelineState,
    progress: watch::Sender<TeachingProgress>,
}

impl PrefetchPipeline {
    pub fn new(
        teach_id: Uuid,
        curriculum: Curriculum,
        producer: LessonProducer,
        deliverer: Arc<dyn LectureDeliverer>,
        event_bus: EventBus,
    ) -> Result<Self, PipelineError> {
        if curriculum.is_empty() {
            return Err(PipelineError::EmptyCurriculum);
        }

        let (progress, _) = watch::channel(TeachingProgress {
            teach_id,
            document_fingerprint: producer.fingerprint().clone(),
            state: PipelineState::Idle,
            total_units: curriculum.len(),
            units_delivered: 0,
            progress_percent: 0,
            units: Vec::new(),
        });

        Ok(Self {
            teach_id,
            curriculum,
            producer,
            deliverer,
            event_bus,
            inter_unit_pause: Duration::ZERO,
            cancel: CancellationToken::new(),
            state: PipelineState::Idle,
            progress,
        })
    }

    pub fn with_inter_unit_pause(mut self, pause: Duration) -> Self {
        self.inter_unit_pause = pause;
        self
    }

    /// Token that stops this pipeline when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn progress(&self) -> watch::Receiver<TeachingProgress> {
        self.progress.subscribe()
    }

    pub fn teach_id(&self) -> Uuid {
        self.teach_id
    }

    /// Teach every unit, or stop early on cancellation
    ///
    /// Unit failures never end the session; only a pipeline invariant
    /// violation returns an error.
    pub async fn run(mut self) -> Result<TeachingReport, PipelineError> {
        let units = self.curriculum.units().to_vec();
        let total = units.len();
        let mut reports: Vec<UnitReport> = Vec::with_capacity(total);
        let mut slot = BackgroundSlot::new();

        info!(
            teach_id = %self.teach_id,
            fingerprint = %self.producer.fingerprint(),
            total_units = total,
            "Teaching session started"
        );
        self.event_bus.emit_lossy(LecternEvent::TeachingStarted {
            teach_id: self.teach_id,
            document_fingerprint: self.producer.fingerprint().to_string(),
            total_units: total,
            timestamp: Utc::now(),
        });

        self.transition(PipelineState::GeneratingFirst);
        let Some(mut current) = self.produce_foreground(&units[0], None).await else {
            return Ok(self.finish(TeachingOutcome::Cancelled, reports));
        };

        for (position, unit) in units.iter().enumerate() {
            let next = units.get(position + 1);
            if let Some(next) = next {
                let producer = self.producer.clone();
                let next_unit = next.clone();
                let cancel = self.cancel.child_token();
                slot.launch(next.index, async move {
                    producer.produce(&next_unit, &cancel).await
                })?;
            }

            self.transition(PipelineState::Delivering { unit: unit.index });
            if !self.deliver(unit, total, &current).await {
                slot.abort();
                return Ok(self.finish(TeachingOutcome::Cancelled, reports));
            }

            reports.push(UnitReport {
                unit_index: unit.index,
                title: unit.title.clone(),
                source: current.source,
                provider: current.provider,
                fallback_reason: current.fallback_reason.clone(),
            });
            self.publish_units(&reports);

            let Some(next) = next else {
                break;
            };

            self.transition(PipelineState::GeneratingNext { unit: next.index });
            if !self.pause().await {
                slot.abort();
                return Ok(self.finish(TeachingOutcome::Cancelled, reports));
            }

            let joined = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => None,
                joined = slot.join(next.index) => Some(joined),
            };
            let Some(joined) = joined else {
                slot.abort();
                return Ok(self.finish(TeachingOutcome::Cancelled, reports));
            };

            let produced = match joined {
                Some(Ok(lesson)) => Some(lesson),
                Some(Err(GenerationError::Cancelled)) => None,
                Some(Err(e)) => {
                    warn!(
                        teach_id = %self.teach_id,
                        unit = next.index,
                        error = %e,
                        "Background generation failed, retrying in foreground"
                    );
                    self.produce_foreground(next, Some(e)).await
                }
                None => {
                    warn!(
                        teach_id = %self.teach_id,
                        unit = next.index,
                        "Background generation ended without a result, retrying in foreground"
                    );
                    self.produce_foreground(next, None).await
                }
            };
            match produced {
                Some(lesson) => current = lesson,
                None => return Ok(self.finish(TeachingOutcome::Cancelled, reports)),
            }
        }

        Ok(self.finish(TeachingOutcome::Completed, reports))
    }

    /// Blocking production with the apology message as last resort
    ///
    /// `None` only when the session was cancelled.
    async fn produce_foreground(
        &self,
        unit: &CurriculumUnit,
        earlier: Option<GenerationError>,
    ) -> Option<ProducedLesson> {
        match self.producer.produce(unit, &self.cancel).await {
            Ok(lesson) => Some(lesson),
            Err(GenerationError::Cancelled) => None,
            Err(e) => {
                let reason = match earlier {
                    Some(first) => format!("{}; retry: {}", first, e),
                    None => e.to_string(),
                };
                warn!(
                    teach_id = %self.teach_id,
                    unit = unit.index,
                    reason = %reason,
                    "Unit could not be generated, delivering fallback message"
                );
                Some(ProducedLesson::fallback(unit, reason))
            }
        }
    }

    /// Returns false when delivery was cancelled
    async fn deliver(&self, unit: &CurriculumUnit, total: usize, produced: &ProducedLesson) -> bool {
        if self.cancel.is_cancelled() {
            return false;
        }

        self.event_bus.emit_lossy(LecternEvent::LessonStarted {
            teach_id: self.teach_id,
            unit_index: unit.index,
            unit_title: unit.title.clone(),
            progress: percent(unit.index, total),
            source: produced.source,
            timestamp: Utc::now(),
        });
        if let Some(reason) = &produced.fallback_reason {
            self.event_bus.emit_lossy(LecternEvent::LessonFallback {
                teach_id: self.teach_id,
                unit_index: unit.index,
                reason: reason.clone(),
                timestamp: Utc::now(),
            });
        }

        let lesson = Lesson {
            teach_id: self.teach_id,
            unit_index: unit.index,
            total_units: total,
            title: unit.title.clone(),
            text: produced.text.clone(),
            source: produced.source,
        };

        match self.deliverer.deliver(&lesson, &self.cancel).await {
            Ok(()) => {}
            Err(DeliveryError::Cancelled) => return false,
            Err(e) => {
                warn!(teach_id = %self.teach_id, unit = unit.index, error = %e, "Lesson delivery failed");
            }
        }
        if self.cancel.is_cancelled() {
            return false;
        }

        self.event_bus.emit_lossy(LecternEvent::LessonCompleted {
            teach_id: self.teach_id,
            unit_index: unit.index,
            timestamp: Utc::now(),
        });
        true
    }

    /// Returns false when cancelled during the pause
    async fn pause(&self) -> bool {
        if self.inter_unit_pause.is_zero() {
            return !self.cancel.is_cancelled();
        }
        tokio::select! {
            _ = self.cancel.cancelled() => false,
            _ = tokio::time::sleep(self.inter_unit_pause) => true,
        }
    }

    fn transition(&mut self, next: PipelineState) {
        if !self.state.can_transition_to(&next) {
            error!(
                teach_id = %self.teach_id,
                from = ?self.state,
                to = ?next,
                "Invalid pipeline state transition"
            );
        }
        debug!(teach_id = %self.teach_id, from = ?self.state, to = ?next, "Pipeline state");
        self.state = next;
        self.progress.send_modify(|p| p.state = next);
    }

    fn publish_units(&self, reports: &[UnitReport]) {
        self.progress.send_modify(|p| {
            p.units_delivered = reports.len();
            p.progress_percent = percent(reports.len(), p.total_units);
            p.units = reports.to_vec();
        });
    }

    fn finish(mut self, outcome: TeachingOutcome, units: Vec<UnitReport>) -> TeachingReport {
        let units_delivered = units.len();
        match outcome {
            TeachingOutcome::Completed => {
                self.transition(PipelineState::Done);
                info!(teach_id = %self.teach_id, units_delivered, "Teaching session completed");
                self.event_bus.emit_lossy(LecternEvent::TeachingCompleted {
                    teach_id: self.teach_id,
                    units_delivered,
                    timestamp: Utc::now(),
                });
            }
            TeachingOutcome::Cancelled => {
                self.transition(PipelineState::Cancelled);
                info!(teach_id = %self.teach_id, units_delivered, "Teaching session cancelled");
                self.event_bus.emit_lossy(LecternEvent::TeachingCancelled {
                    teach_id: self.teach_id,
                    units_delivered,
                    timestamp: Utc::now(),
                });
            }
        }
        self.publish_units(&units);

        TeachingReport {
            teach_id: self.teach_id,
            document_fingerprint: self.producer.fingerprint().clone(),
            outcome,
            units,
        }
    }
}

fn percent(part: usize, total: usize) -> u8 {
    if total == 0 {
        0
    } else {
        (part * 100 / total).min(100) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok_lesson(text: &str) -> UnitResult {
        Ok(ProducedLesson {
            text: text.to_string(),
            source: LessonSource::Generated,
            provider: Some("test"),
            fallback_reason: None,
        })
    }

    #[test]
    fn test_state_transitions() {
        use PipelineState::*;
        assert!(Idle.can_transition_to(&GeneratingFirst));
        assert!(GeneratingFirst.can_transition_to(&Delivering { unit: 1 }));
        assert!(Delivering { unit: 1 }.can_transition_to(&GeneratingNext { unit: 2 }));
        assert!(GeneratingNext { unit: 2 }.can_transition_to(&Delivering { unit: 2 }));
        assert!(Delivering { unit: 3 }.can_transition_to(&Done));
        assert!(GeneratingNext { unit: 2 }.can_transition_to(&Cancelled));

        assert!(!Idle.can_transition_to(&Delivering { unit: 1 }));
        assert!(!Done.can_transition_to(&Cancelled));
        assert!(!GeneratingNext { unit: 2 }.can_transition_to(&Done));
    }

    #[tokio::test]
    async fn test_slot_rejects_second_launch() {
        let mut slot = BackgroundSlot::new();
        slot.launch(2, async { ok_lesson("two") }).unwrap();

        let err = slot.launch(3, async { ok_lesson("three") }).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::PrefetchInFlight {
                in_flight: 2,
                requested: 3
            }
        ));

        let joined = slot.join(2).await.unwrap().unwrap();
        assert_eq!(joined.text, "two");
        assert!(slot.in_flight_unit().is_none());

        // Free again after the join
        slot.launch(3, async { ok_lesson("three") }).unwrap();
        assert_eq!(slot.in_flight_unit(), Some(3));
    }

    #[tokio::test]
    async fn test_join_for_other_unit_is_none() {
        let mut slot = BackgroundSlot::new();
        assert!(slot.join(1).await.is_none());

        slot.launch(2, async { ok_lesson("two") }).unwrap();
        assert!(slot.join(5).await.is_none());
        assert_eq!(slot.in_flight_unit(), Some(2));
    }

    #[tokio::test]
    async fn test_aborted_task_yields_no_result() {
        let mut slot = BackgroundSlot::new();
        slot.launch(2, async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            ok_lesson("never")
        })
        .unwrap();

        slot.abort();
        assert!(slot.in_flight_unit().is_none());
        assert!(slot.join(2).await.is_none());
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(3, 3), 100);
        assert_eq!(percent(0, 0), 0);
    }
}
