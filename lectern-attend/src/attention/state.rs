//! Per-student streaming attentiveness state machine

use super::observation::FrameObservation;
use super::window::SmoothingWindow;
use crate::config::AttentionConfig;
use chrono::{DateTime, Utc};
use lectern_common::summary::{rounded_percentage, AttendanceStatus, NO_DISTRACTION};
use lectern_common::SessionSummaryEntry;
use std::collections::HashMap;

/// Classifier state for one student within one session
///
/// Created lazily on the first frame for a label and dropped when the
/// session ends.
#[derive(Debug, Clone)]
pub struct StudentAttentionState {
    total_frames_seen: u64,
    attentive_frames: u64,
    window: SmoothingWindow,
    distraction_tally: HashMap<String, u64>,
    current_smoothed_state: bool,
    last_seen_at: DateTime<Utc>,
}

impl StudentAttentionState {
    /// Fresh state, optimistic (attentive) until the first accepted frame
    pub fn new(history_length: usize, now: DateTime<Utc>) -> Self {
        Self {
            total_frames_seen: 0,
            attentive_frames: 0,
            window: SmoothingWindow::new(history_length),
            distraction_tally: HashMap::new(),
            current_smoothed_state: true,
            last_seen_at: now,
        }
    }

    /// Feed one frame and return the smoothed verdict
    ///
    /// Frames below `confidence_threshold` leave the window untouched but are
    /// still counted, credited with the previous smoothed verdict.
    pub fn observe(
        &mut self,
        observation: &FrameObservation,
        config: &AttentionConfig,
        now: DateTime<Utc>,
    ) -> bool {
        if observation.emotion_confidence >= config.confidence_threshold {
            let raw = observation.is_attentive();
            self.window.push(raw, observation.emotion_confidence);

            self.current_smoothed_state = if self.window.is_full() {
                self.window.majority(config.consecutive_frames_required)
            } else {
                raw
            };

            if !raw {
                if let Some(reason) = observation.reason() {
                    *self.distraction_tally.entry(reason.to_string()).or_insert(0) += 1;
                }
            }
        } else {
            tracing::trace!(
                student = %observation.label(),
                confidence = observation.emotion_confidence,
                "Frame below confidence threshold, window unchanged"
            );
        }

        self.total_frames_seen += 1;
        if self.current_smoothed_state {
            self.attentive_frames += 1;
        }
        self.last_seen_at = now;

        self.current_smoothed_state
    }

    pub fn total_frames_seen(&self) -> u64 {
        self.total_frames_seen
    }

    pub fn attentive_frames(&self) -> u64 {
        self.attentive_frames
    }

    pub fn current_smoothed_state(&self) -> bool {
        self.current_smoothed_state
    }

    pub fn last_seen_at(&self) -> DateTime<Utc> {
        self.last_seen_at
    }

    pub fn window(&self) -> &SmoothingWindow {
        &self.window
    }

    pub fn distraction_tally(&self) -> &HashMap<String, u64> {
        &self.distraction_tally
    }

    /// Most frequent distraction reason; ties resolve to the alphabetically first
    pub fn top_distraction_reason(&self) -> Option<&str> {
        self.distraction_tally
            .iter()
            .max_by(|(a_reason, a_count), (b_reason, b_count)| {
                a_count.cmp(b_count).then_with(|| b_reason.cmp(a_reason))
            })
            .map(|(reason, _)| reason.as_str())
    }

    /// Final summary for this student
    pub fn summarize(&self, name: &str, config: &AttentionConfig) -> SessionSummaryEntry {
        let attentive_percentage = rounded_percentage(self.attentive_frames, self.total_frames_seen);

        SessionSummaryEntry {
            name: name.to_string(),
            total_frames: self.total_frames_seen,
            attentive_frames: self.attentive_frames,
            attentive_percentage,
            estimated_seconds: self.total_frames_seen as f64 * config.seconds_per_frame,
            average_confidence: self.window.mean_confidence(),
            top_distraction_reason: self
                .top_distraction_reason()
                .unwrap_or(NO_DISTRACTION)
                .to_string(),
            distraction_event_count: self.distraction_tally.values().sum(),
            attendance_status: AttendanceStatus::classify(
                f64::from(attentive_percentage),
                config.present_threshold_percent,
                config.partial_threshold_percent,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_optimistic() {
        let state = StudentAttentionState::new(3, Utc::now());
        assert!(state.current_smoothed_state());
        assert_eq!(state.total_frames_seen(), 0);
        assert!(state.window().is_empty());
    }

    #[test]
    fn test_tally_tie_breaks_alphabetically() {
        let mut state = StudentAttentionState::new(3, Utc::now());
        state.distraction_tally.insert("Looking Up".into(), 2);
        state.distraction_tally.insert("Drowsy/Sleeping".into(), 2);
        state.distraction_tally.insert("Sad".into(), 1);
        assert_eq!(state.top_distraction_reason(), Some("Drowsy/Sleeping"));
    }

    #[test]
    fn test_summary_percentage_and_estimate() {
        let mut state = StudentAttentionState::new(3, Utc::now());
        state.total_frames_seen = 10;
        state.attentive_frames = 7;

        let entry = state.summarize("alice", &AttentionConfig::default());
        assert_eq!(entry.attentive_percentage, 70);
        assert_eq!(entry.estimated_seconds, 20.0);
        assert_eq!(entry.attendance_status, AttendanceStatus::Partial);
    }

    #[test]
    fn test_zero_frame_summary() {
        let state = StudentAttentionState::new(3, Utc::now());
        let entry = state.summarize("bob", &AttentionConfig::default());
        assert_eq!(entry.attentive_percentage, 0);
        assert_eq!(entry.estimated_seconds, 0.0);
        assert_eq!(entry.average_confidence, 0.0);
        assert_eq!(entry.top_distraction_reason, "None");
        assert_eq!(entry.attendance_status, AttendanceStatus::Absent);
    }
}
