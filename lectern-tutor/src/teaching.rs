//! Teaching session manager
//!
//! Each teaching session runs its own `PrefetchPipeline` task. The manager
//! keeps the session's cancellation token and progress receiver so the
//! HTTP layer can stop it or report on it. A finished session's handle is
//! dropped and only its final progress is kept, for the most recent
//! `RECENT_FINISHED` sessions.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use lectern_common::events::EventBus;
use tokio::sync::{watch, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use uuid::Uuid;

use crate::cache::LectureCache;
use crate::curriculum::Curriculum;
use crate::delivery::LectureDeliverer;
use crate::error::PipelineError;
use crate::fingerprint::DocumentFingerprint;
use crate::pipeline::{LessonProducer, PrefetchPipeline, TeachingProgress};
use crate::providers::ProviderChain;
use crate::retrieval::ContextRetriever;

/// Collaborators shared by every teaching session
#[derive(Clone)]
pub struct TutorServices {
    pub cache: LectureCache,
    pub chain: Arc<ProviderChain>,
    pub deliverer: Arc<dyn LectureDeliverer>,
    pub event_bus: EventBus,
    pub inter_unit_pause: Duration,
}

/// Everything needed to teach one document
pub struct TeachRequest {
    pub fingerprint: DocumentFingerprint,
    pub curriculum: Curriculum,
    pub retriever: Arc<dyn ContextRetriever>,
}

/// Finished sessions kept for status queries, oldest evicted first
pub const RECENT_FINISHED: usize = 32;

struct TeachingHandle {
    cancel: CancellationToken,
    progress: watch::Receiver<TeachingProgress>,
    /// Cancelled once the session has moved to the finished list
    retired: CancellationToken,
}

#[derive(Default)]
struct SessionTable {
    running: HashMap<Uuid, TeachingHandle>,
    finished: VecDeque<(Uuid, TeachingProgress)>,
}

impl SessionTable {
    fn retire(&mut self, teach_id: Uuid, last: TeachingProgress) -> Option<TeachingHandle> {
        let handle = self.running.remove(&teach_id);
        if self.finished.len() == RECENT_FINISHED {
            self.finished.pop_front();
        }
        self.finished.push_back((teach_id, last));
        handle
    }

    fn finished(&self, teach_id: Uuid) -> Option<&TeachingProgress> {
        self.finished
            .iter()
            .find(|(id, _)| *id == teach_id)
            .map(|(_, progress)| progress)
    }
}

pub struct TeachingSessions {
    services: TutorServices,
    table: Arc<RwLock<SessionTable>>,
    /// Pipeline aborts are reported here for `/health`
    last_error: Arc<RwLock<Option<String>>>,
}

impl TeachingSessions {
    pub fn new(services: TutorServices, last_error: Arc<RwLock<Option<String>>>) -> Self {
        Self {
            services,
            table: Arc::new(RwLock::new(SessionTable::default())),
            last_error,
        }
    }

    /// Spawn a pipeline for `request` and return its teach id
    pub async fn start(&self, request: TeachRequest) -> Result<Uuid, PipelineError> {
        let teach_id = Uuid::new_v4();
        let producer = LessonProducer::new(
            self.services.cache.clone(),
            Arc::clone(&self.services.chain),
            request.retriever,
            request.fingerprint,
            request.curriculum.len(),
        );
        let pipeline = PrefetchPipeline::new(
            teach_id,
            request.curriculum,
            producer,
            Arc::clone(&self.services.deliverer),
            self.services.event_bus.clone(),
        )?
        .with_inter_unit_pause(self.services.inter_unit_pause);

        let progress = pipeline.progress();
        let handle = TeachingHandle {
            cancel: pipeline.cancellation_token(),
            progress: progress.clone(),
            retired: CancellationToken::new(),
        };
        self.table.write().await.running.insert(teach_id, handle);

        let table = Arc::clone(&self.table);
        let last_error = Arc::clone(&self.last_error);
        tokio::spawn(async move {
            match pipeline.run().await {
                Ok(report) => info!(
                    teach_id = %report.teach_id,
                    outcome = ?report.outcome,
                    units = report.units.len(),
                    "Teaching pipeline finished"
                ),
                Err(e) => {
                    error!(teach_id = %teach_id, error = %e, "Teaching pipeline aborted");
                    *last_error.write().await =
                        Some(format!("Teaching session {} aborted: {}", teach_id, e));
                }
            }

            let last = progress.borrow().clone();
            if let Some(handle) = table.write().await.retire(teach_id, last) {
                handle.retired.cancel();
            }
        });

        Ok(teach_id)
    }

    /// Signal the session to stop; does not wait for it to wind down
    ///
    /// `Some(false)` means the session had already finished.
    pub async fn stop(&self, teach_id: Uuid) -> Option<bool> {
        let table = self.table.read().await;
        if let Some(handle) = table.running.get(&teach_id) {
            handle.cancel.cancel();
            info!(teach_id = %teach_id, "Teaching session stop requested");
            return Some(true);
        }
        table.finished(teach_id).map(|_| false)
    }

    pub async fn stop_all(&self) {
        for handle in self.table.read().await.running.values() {
            handle.cancel.cancel();
        }
    }

    pub async fn progress(&self, teach_id: Uuid) -> Option<TeachingProgress> {
        let table = self.table.read().await;
        match table.running.get(&teach_id) {
            Some(handle) => Some(handle.progress.borrow().clone()),
            None => table.finished(teach_id).cloned(),
        }
    }

    /// Wait until the session has finished and been retired
    pub async fn wait_finished(&self, teach_id: Uuid) -> Option<TeachingProgress> {
        let (progress, retired) = {
            let table = self.table.read().await;
            match table.running.get(&teach_id) {
                Some(handle) => (handle.progress.clone(), handle.retired.clone()),
                None => return table.finished(teach_id).cloned(),
            }
        };
        retired.cancelled().await;
        let last = progress.borrow().clone();
        Some(last)
    }

    /// Sessions that have not reached a terminal state
    pub async fn active_sessions(&self) -> Vec<Uuid> {
        self.table
            .read()
            .await
            .running
            .iter()
            .filter(|(_, handle)| !handle.progress.borrow().state.is_terminal())
            .map(|(id, _)| *id)
            .collect()
    }

    /// Running plus recently finished sessions
    pub async fn tracked_sessions(&self) -> usize {
        let table = self.table.read().await;
        table.running.len() + table.finished.len()
    }
}
