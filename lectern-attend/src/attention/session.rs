//! One lecture session's collection of student states

use super::observation::FrameObservation;
use super::state::StudentAttentionState;
use crate::config::AttentionConfig;
use chrono::{DateTime, Utc};
use lectern_common::SessionSummaryEntry;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Live per-student view for dashboards
#[derive(Debug, Clone, Serialize)]
pub struct StudentSnapshot {
    pub name: String,
    pub attentive: bool,
    pub total_frames: u64,
    pub attentive_frames: u64,
    pub last_seen_at: DateTime<Utc>,
}

/// Owns every `StudentAttentionState` of one session
///
/// Not internally synchronized; the registry serializes access.
#[derive(Debug)]
pub struct AttentionSession {
    session_id: String,
    started_at: DateTime<Utc>,
    config: Arc<AttentionConfig>,
    students: HashMap<String, StudentAttentionState>,
    closed: bool,
}

impl AttentionSession {
    pub fn new(session_id: impl Into<String>, config: Arc<AttentionConfig>) -> Self {
        Self {
            session_id: session_id.into(),
            started_at: Utc::now(),
            config,
            students: HashMap::new(),
            closed: false,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Set once the session has been summarized for the last time
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Summarize and refuse further frames
    pub fn close(&mut self) -> Vec<SessionSummaryEntry> {
        self.closed = true;
        self.summarize()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Route a frame to its student's state, creating it on first sight
    pub fn observe(&mut self, observation: &FrameObservation) -> bool {
        self.observe_at(observation, Utc::now())
    }

    pub fn observe_at(&mut self, observation: &FrameObservation, now: DateTime<Utc>) -> bool {
        let history_length = self.config.history_length;
        let state = self
            .students
            .entry(observation.label().to_string())
            .or_insert_with(|| StudentAttentionState::new(history_length, now));
        state.observe(observation, &self.config, now)
    }

    pub fn student(&self, label: &str) -> Option<&StudentAttentionState> {
        self.students.get(label)
    }

    pub fn student_count(&self) -> usize {
        self.students.len()
    }

    /// Current verdicts, sorted by student name
    pub fn snapshot(&self) -> Vec<StudentSnapshot> {
        let mut students: Vec<StudentSnapshot> = self
            .students
            .iter()
            .map(|(name, state)| StudentSnapshot {
                name: name.clone(),
                attentive: state.current_smoothed_state(),
                total_frames: state.total_frames_seen(),
                attentive_frames: state.attentive_frames(),
                last_seen_at: state.last_seen_at(),
            })
            .collect();
        students.sort_by(|a, b| a.name.cmp(&b.name));
        students
    }

    /// End-of-session summary, one entry per observed student, sorted by name
    pub fn summarize(&self) -> Vec<SessionSummaryEntry> {
        let mut entries: Vec<SessionSummaryEntry> = self
            .students
            .iter()
            .map(|(name, state)| state.summarize(name, &self.config))
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        entries
    }
}
