//! Test doubles for generation, retrieval and delivery
#![allow(dead_code)]

use async_trait::async_trait;
use lectern_common::events::LessonSource;
use lectern_tutor::delivery::{LectureDeliverer, Lesson};
use lectern_tutor::error::{DeliveryError, GenerationError};
use lectern_tutor::providers::{Capability, GenerationRequest, LectureGenerator};
use lectern_tutor::retrieval::ContextRetriever;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Generator that sleeps, then fails or succeeds per unit title
pub struct ScriptedGenerator {
    id: &'static str,
    delay: Duration,
    always_fail: Vec<String>,
    /// Title -> number of leading calls that fail
    fail_first: Mutex<HashMap<String, usize>>,
    available: bool,
    capability: Capability,
    calls: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new(delay: Duration) -> Self {
        Self {
            id: "scripted",
            delay,
            always_fail: Vec::new(),
            fail_first: Mutex::new(HashMap::new()),
            available: true,
            capability: Capability::Online,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn named(mut self, id: &'static str) -> Self {
        self.id = id;
        self
    }

    pub fn failing_on(mut self, title: &str) -> Self {
        self.always_fail.push(title.to_string());
        self
    }

    pub fn failing_first(self, title: &str, times: usize) -> Self {
        self.fail_first.lock().unwrap().insert(title.to_string(), times);
        self
    }

    pub fn offline(mut self) -> Self {
        self.capability = Capability::Offline;
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_for(&self, title: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|t| *t == title).count()
    }
}

#[async_trait]
impl LectureGenerator for ScriptedGenerator {
    fn provider_id(&self) -> &'static str {
        self.id
    }

    fn capability(&self) -> Capability {
        self.capability
    }

    async fn is_available(&self) -> bool {
        self.available
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        self.calls.lock().unwrap().push(request.unit_title.clone());
        tokio::time::sleep(self.delay).await;

        if self.always_fail.contains(&request.unit_title) {
            return Err(GenerationError::provider(self.id, "model crashed"));
        }
        {
            let mut fail_first = self.fail_first.lock().unwrap();
            if let Some(remaining) = fail_first.get_mut(&request.unit_title) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(GenerationError::provider(self.id, "transient failure"));
                }
            }
        }

        Ok(format!(
            "{}, class! [PAUSE] Today we cover {}. It matters a great deal.",
            request.greeting, request.unit_title
        ))
    }
}

/// Generator whose first `slow_calls` calls hang far beyond any timeout
pub struct StallingGenerator {
    slow_calls: usize,
    calls: AtomicUsize,
}

impl StallingGenerator {
    pub fn new(slow_calls: usize) -> Self {
        Self {
            slow_calls,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LectureGenerator for StallingGenerator {
    fn provider_id(&self) -> &'static str {
        "stalling"
    }

    fn capability(&self) -> Capability {
        Capability::Online
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.slow_calls {
            tokio::time::sleep(Duration::from_secs(24 * 3600)).await;
        }
        Ok(format!("A lecture on {}.", request.unit_title))
    }
}

/// Retriever returning the same excerpt for every topic
pub struct FixedContext(pub &'static str);

#[async_trait]
impl ContextRetriever for FixedContext {
    async fn retrieve(&self, _topic: &str) -> String {
        self.0.to_string()
    }
}

#[derive(Debug, Clone)]
pub struct DeliveredLesson {
    pub unit_index: usize,
    pub source: LessonSource,
    pub text: String,
}

/// Deliverer that holds each lesson for a fixed time and records it
pub struct RecordingDeliverer {
    hold: Duration,
    delivered: Mutex<Vec<DeliveredLesson>>,
}

impl RecordingDeliverer {
    pub fn new(hold: Duration) -> Self {
        Self {
            hold,
            delivered: Mutex::new(Vec::new()),
        }
    }

    pub fn delivered(&self) -> Vec<DeliveredLesson> {
        self.delivered.lock().unwrap().clone()
    }
}

#[async_trait]
impl LectureDeliverer for RecordingDeliverer {
    async fn deliver(&self, lesson: &Lesson, cancel: &CancellationToken) -> Result<(), DeliveryError> {
        tokio::select! {
            _ = cancel.cancelled() => return Err(DeliveryError::Cancelled),
            _ = tokio::time::sleep(self.hold) => {}
        }
        self.delivered.lock().unwrap().push(DeliveredLesson {
            unit_index: lesson.unit_index,
            source: lesson.source,
            text: lesson.text.clone(),
        });
        Ok(())
    }
}
