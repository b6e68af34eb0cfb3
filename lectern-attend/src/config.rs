//! `[attention]` configuration section
//!
//! Calibration constants for the attentiveness classifier and session
//! summaries. All values have compiled defaults; a config file only needs
//! to name the keys it overrides.

use crate::error::{AttendError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tuning for the attentiveness classifier and session aggregator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttentionConfig {
    /// Smoothing window size (frames that passed the confidence gate)
    pub history_length: usize,

    /// Number of attentive frames in a full window needed to report attentive.
    ///
    /// Despite the name this is a majority threshold over the window, not a
    /// run of consecutive frames.
    pub consecutive_frames_required: usize,

    /// Minimum emotion confidence for a frame to enter the smoothing window
    pub confidence_threshold: f32,

    /// Expected client polling interval, used to estimate time on camera
    pub seconds_per_frame: f64,

    /// Attentive percentage strictly above which a student is Present
    pub present_threshold_percent: f64,

    /// Attentive percentage at or above which a student is at least Partial
    pub partial_threshold_percent: f64,

    /// EventBus channel capacity
    pub event_capacity: usize,
}

impl Default for AttentionConfig {
    fn default() -> Self {
        Self {
            history_length: 3,
            consecutive_frames_required: 2,
            confidence_threshold: 0.6,
            seconds_per_frame: 2.0,
            present_threshold_percent: 80.0,
            partial_threshold_percent: 50.0,
            event_capacity: 100,
        }
    }
}

impl AttentionConfig {
    /// Load the `[attention]` section, falling back to defaults when absent
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let config: Self = lectern_common::config::load_section(config_file, "attention");
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.history_length == 0 {
            return Err(AttendError::Config("history_length must be at least 1".into()));
        }
        if self.consecutive_frames_required == 0
            || self.consecutive_frames_required > self.history_length
        {
            return Err(AttendError::Config(format!(
                "consecutive_frames_required must be between 1 and history_length ({}), got {}",
                self.history_length, self.consecutive_frames_required
            )));
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(AttendError::Config(format!(
                "confidence_threshold must be within [0, 1], got {}",
                self.confidence_threshold
            )));
        }
        if self.seconds_per_frame.is_nan() || self.seconds_per_frame <= 0.0 {
            return Err(AttendError::Config(format!(
                "seconds_per_frame must be positive, got {}",
                self.seconds_per_frame
            )));
        }
        if !(0.0..=100.0).contains(&self.partial_threshold_percent)
            || !(0.0..=100.0).contains(&self.present_threshold_percent)
            || self.partial_threshold_percent > self.present_threshold_percent
        {
            return Err(AttendError::Config(format!(
                "thresholds must satisfy 0 <= partial ({}) <= present ({}) <= 100",
                self.partial_threshold_percent, self.present_threshold_percent
            )));
        }
        if self.event_capacity == 0 {
            return Err(AttendError::Config("event_capacity must be at least 1".into()));
        }
        Ok(())
    }
}
