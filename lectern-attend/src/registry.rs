//! Active attention sessions, keyed by session id
//!
//! The map sits behind a `RwLock`; each session behind its own `Mutex`, so
//! frames for different sessions never contend and frames for different
//! students of one session are serialized at that session's lock.

use crate::attention::{AttentionSession, FrameObservation, StudentSnapshot};
use crate::config::AttentionConfig;
use crate::error::{AttendError, Result};
use chrono::{DateTime, Utc};
use lectern_common::SessionSummaryEntry;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// Live status of one session
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub session_id: String,
    pub started_at: DateTime<Utc>,
    pub students: Vec<StudentSnapshot>,
}

pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Arc<Mutex<AttentionSession>>>>,
    config: Arc<AttentionConfig>,
}

impl SessionRegistry {
    pub fn new(config: AttentionConfig) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &AttentionConfig {
        &self.config
    }

    /// Begin tracking a session with an empty student collection
    ///
    /// Fails with `SessionAlreadyActive` if the id is active, unless `force`
    /// is set, in which case the old state is discarded. Returns whether an
    /// active session was replaced.
    pub async fn start_session(&self, session_id: &str, force: bool) -> Result<bool> {
        let mut sessions = self.sessions.write().await;

        let replaced = sessions.contains_key(session_id);
        if replaced && !force {
            return Err(AttendError::SessionAlreadyActive(session_id.to_string()));
        }
        if replaced {
            warn!(session_id = %session_id, "Overwriting active attention session (forced)");
        }

        sessions.insert(
            session_id.to_string(),
            Arc::new(Mutex::new(AttentionSession::new(session_id, Arc::clone(&self.config)))),
        );
        info!(session_id = %session_id, "Attention session started");
        Ok(replaced)
    }

    async fn session(&self, session_id: &str) -> Result<Arc<Mutex<AttentionSession>>> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .ok_or_else(|| AttendError::SessionNotFound(session_id.to_string()))
    }

    /// Feed one frame into a session and return the student's smoothed verdict
    pub async fn observe(&self, session_id: &str, observation: &FrameObservation) -> Result<bool> {
        let session = self.session(session_id).await?;
        let mut session = session.lock().await;
        // end_session may have summarized it while we waited for the lock
        if session.is_closed() {
            return Err(AttendError::SessionNotFound(session_id.to_string()));
        }
        let attentive = session.observe(observation);
        drop(session);
        debug!(
            session_id = %session_id,
            student = %observation.label(),
            attentive,
            "Frame observed"
        );
        Ok(attentive)
    }

    /// Remove a session and return its summary
    pub async fn end_session(&self, session_id: &str) -> Result<Vec<SessionSummaryEntry>> {
        let session = self
            .sessions
            .write()
            .await
            .remove(session_id)
            .ok_or_else(|| AttendError::SessionNotFound(session_id.to_string()))?;

        // Frames still waiting on the lock see it closed and are rejected
        let summary = session.lock().await.close();
        info!(
            session_id = %session_id,
            students = summary.len(),
            "Attention session ended"
        );
        Ok(summary)
    }

    pub async fn live_status(&self, session_id: &str) -> Result<SessionStatus> {
        let session = self.session(session_id).await?;
        let session = session.lock().await;
        Ok(SessionStatus {
            session_id: session.session_id().to_string(),
            started_at: session.started_at(),
            students: session.snapshot(),
        })
    }

    /// Ids of all active sessions, sorted
    pub async fn active_sessions(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sessions.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }
}
