//! End-of-session attendance summary types
//!
//! Shared between lectern-attend (which produces summaries) and anything
//! consuming `AttentionSessionEnded` events.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Reason reported when a student never had a distraction recorded
pub const NO_DISTRACTION: &str = "None";

/// Attendance verdict derived from the attentive percentage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttendanceStatus {
    /// Attentive for more than the present threshold
    Present,
    /// Attentive between the partial and present thresholds (inclusive)
    Partial,
    /// Attentive for less than the partial threshold
    Absent,
}

impl AttendanceStatus {
    /// Classify a percentage against the present/partial thresholds
    pub fn classify(percentage: f64, present_threshold: f64, partial_threshold: f64) -> Self {
        if percentage > present_threshold {
            AttendanceStatus::Present
        } else if percentage >= partial_threshold {
            AttendanceStatus::Partial
        } else {
            AttendanceStatus::Absent
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "Present",
            AttendanceStatus::Partial => "Partial",
            AttendanceStatus::Absent => "Absent",
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttendanceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Present" => Ok(AttendanceStatus::Present),
            "Partial" => Ok(AttendanceStatus::Partial),
            "Absent" => Ok(AttendanceStatus::Absent),
            other => Err(format!("Unknown attendance status: {}", other)),
        }
    }
}

/// Per-student result of a finished attention session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummaryEntry {
    /// Student label ("Unknown" for unidentified faces)
    pub name: String,
    pub total_frames: u64,
    pub attentive_frames: u64,
    /// Rounded integer percentage, 0 when no frames were seen
    pub attentive_percentage: u32,
    /// `total_frames * seconds_per_frame`
    pub estimated_seconds: f64,
    /// Mean of the confidences still in the smoothing window
    pub average_confidence: f64,
    /// Most frequent distraction reason, or "None"
    pub top_distraction_reason: String,
    /// Total number of distraction events tallied
    pub distraction_event_count: u64,
    pub attendance_status: AttendanceStatus,
}

/// Rounded percentage of `part` over `total`, 0 when `total` is 0
///
/// Halves round to even, so 5 of 8 frames (62.5%) reports 62.
pub fn rounded_percentage(part: u64, total: u64) -> u32 {
    if total == 0 {
        return 0;
    }
    let pct = part as f64 / total as f64 * 100.0;
    pct.round_ties_even() as u32
}
