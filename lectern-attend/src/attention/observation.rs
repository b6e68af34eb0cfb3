//! Per-frame detector output consumed by the classifier

use serde::{Deserialize, Serialize};

/// Label used for faces the recognizer could not identify
pub const UNKNOWN_STUDENT: &str = "Unknown";

/// Discrete emotion reported by the external emotion model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Emotion {
    Angry,
    Disgust,
    Fear,
    Happy,
    Neutral,
    Sad,
    Surprise,
    #[default]
    #[serde(other)]
    Unknown,
}

impl Emotion {
    /// Emotions compatible with paying attention
    pub fn is_engaged(&self) -> bool {
        matches!(self, Emotion::Neutral | Emotion::Happy | Emotion::Surprise)
    }
}

/// One detector result for one face in one webcam frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameObservation {
    /// Recognized identity, or "Unknown"
    #[serde(default = "unknown_label")]
    pub student_label: String,

    /// Face recognition confidence in [0, 100]
    #[serde(default)]
    pub recognition_confidence: f32,

    #[serde(default)]
    pub emotion_label: Emotion,

    /// Emotion model confidence in [0, 1]; drives the confidence gate
    pub emotion_confidence: f32,

    pub is_looking_at_screen: bool,

    #[serde(default)]
    pub is_drowsy: bool,

    /// Detector's explanation when the frame is not attentive
    #[serde(default)]
    pub distraction_reason: Option<String>,
}

fn unknown_label() -> String {
    UNKNOWN_STUDENT.to_string()
}

impl FrameObservation {
    /// Raw, unsmoothed verdict for this single frame
    pub fn is_attentive(&self) -> bool {
        self.is_looking_at_screen && !self.is_drowsy && self.emotion_label.is_engaged()
    }

    /// Key under which this face is tracked; blank labels fold into "Unknown"
    pub fn label(&self) -> &str {
        let trimmed = self.student_label.trim();
        if trimmed.is_empty() {
            UNKNOWN_STUDENT
        } else {
            trimmed
        }
    }

    /// Non-blank distraction reason, if any
    pub fn reason(&self) -> Option<&str> {
        self.distraction_reason
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(emotion: Emotion, looking: bool, drowsy: bool) -> FrameObservation {
        FrameObservation {
            student_label: "alice".into(),
            recognition_confidence: 90.0,
            emotion_label: emotion,
            emotion_confidence: 0.9,
            is_looking_at_screen: looking,
            is_drowsy: drowsy,
            distraction_reason: None,
        }
    }

    #[test]
    fn test_raw_verdict_requires_gaze_alertness_and_engaged_emotion() {
        assert!(frame(Emotion::Neutral, true, false).is_attentive());
        assert!(frame(Emotion::Happy, true, false).is_attentive());
        assert!(frame(Emotion::Surprise, true, false).is_attentive());

        assert!(!frame(Emotion::Sad, true, false).is_attentive());
        assert!(!frame(Emotion::Unknown, true, false).is_attentive());
        assert!(!frame(Emotion::Neutral, false, false).is_attentive());
        assert!(!frame(Emotion::Neutral, true, true).is_attentive());
    }

    #[test]
    fn test_blank_label_tracks_as_unknown() {
        let mut obs = frame(Emotion::Neutral, true, false);
        obs.student_label = "  ".into();
        assert_eq!(obs.label(), UNKNOWN_STUDENT);
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let obs: FrameObservation = serde_json::from_str(
            r#"{"emotion_label":"Bored","emotion_confidence":0.8,"is_looking_at_screen":true}"#,
        )
        .unwrap();
        assert_eq!(obs.label(), UNKNOWN_STUDENT);
        assert_eq!(obs.emotion_label, Emotion::Unknown);
        assert!(!obs.is_drowsy);
        assert_eq!(obs.reason(), None);
    }
}
