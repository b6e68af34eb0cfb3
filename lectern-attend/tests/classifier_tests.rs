//! Attentiveness classifier behaviour
//!
//! Exercises confidence gating, the bounded smoothing window, majority-vote
//! smoothing, warm-up behaviour and frame accounting through the public
//! `AttentionSession` API.

use chrono::Utc;
use lectern_attend::attention::{AttentionSession, Emotion, FrameObservation, UNKNOWN_STUDENT};
use lectern_attend::config::AttentionConfig;
use lectern_common::AttendanceStatus;
use std::sync::Arc;

fn session() -> AttentionSession {
    AttentionSession::new("room-101", Arc::new(AttentionConfig::default()))
}

fn attentive(label: &str) -> FrameObservation {
    FrameObservation {
        student_label: label.to_string(),
        recognition_confidence: 92.0,
        emotion_label: Emotion::Neutral,
        emotion_confidence: 0.9,
        is_looking_at_screen: true,
        is_drowsy: false,
        distraction_reason: None,
    }
}

fn distracted(label: &str, reason: &str) -> FrameObservation {
    FrameObservation {
        is_looking_at_screen: false,
        distraction_reason: Some(reason.to_string()),
        ..attentive(label)
    }
}

fn low_confidence(mut frame: FrameObservation) -> FrameObservation {
    frame.emotion_confidence = 0.3;
    frame
}

#[test]
fn test_low_confidence_frame_leaves_window_unchanged() {
    // Given a student with one accepted frame
    let mut session = session();
    session.observe(&attentive("alice"));
    let before = session.student("alice").unwrap().window().len();

    // When a low-confidence distracted frame arrives
    session.observe(&low_confidence(distracted("alice", "Looking Up")));

    // Then the window is unchanged but the frame is counted
    let state = session.student("alice").unwrap();
    assert_eq!(state.window().len(), before);
    assert_eq!(state.total_frames_seen(), 2);
    assert!(state.distraction_tally().is_empty());
}

#[test]
fn test_low_confidence_frame_credited_with_previous_verdict() {
    let mut session = session();
    session.observe(&attentive("alice"));

    assert!(session.observe(&low_confidence(distracted("alice", "Looking Up"))));
    assert_eq!(session.student("alice").unwrap().attentive_frames(), 2);
}

#[test]
fn test_confidence_exactly_at_threshold_is_accepted() {
    let mut session = session();
    let mut frame = distracted("alice", "Looking Up");
    frame.emotion_confidence = 0.6;

    assert!(!session.observe(&frame));
    assert_eq!(session.student("alice").unwrap().window().len(), 1);
}

#[test]
fn test_window_never_exceeds_history_length() {
    let mut session = session();
    for i in 0..50 {
        let frame = match i % 4 {
            0 => attentive("alice"),
            1 => distracted("alice", "Looking Sideways"),
            2 => low_confidence(attentive("alice")),
            _ => attentive("alice"),
        };
        session.observe(&frame);

        let state = session.student("alice").unwrap();
        assert!(state.window().len() <= 3);
        assert_eq!(state.window().history().count(), state.window().confidences().count());
        assert!(state.attentive_frames() <= state.total_frames_seen());
    }
    assert_eq!(session.student("alice").unwrap().total_frames_seen(), 50);
}

#[test]
fn test_two_of_three_is_attentive() {
    let mut session = session();
    session.observe(&attentive("alice"));
    session.observe(&distracted("alice", "Looking Up"));
    let verdict = session.observe(&attentive("alice"));

    let history: Vec<bool> = session.student("alice").unwrap().window().history().collect();
    assert_eq!(history, vec![true, false, true]);
    assert!(verdict);
}

#[test]
fn test_one_of_three_is_distracted() {
    let mut session = session();
    session.observe(&distracted("alice", "Looking Up"));
    session.observe(&distracted("alice", "Looking Up"));
    let verdict = session.observe(&attentive("alice"));

    let history: Vec<bool> = session.student("alice").unwrap().window().history().collect();
    assert_eq!(history, vec![false, false, true]);
    assert!(!verdict);
}

#[test]
fn test_warm_up_mirrors_latest_accepted_frame() {
    let mut session = session();

    assert!(session.observe(&attentive("alice")));
    assert!(!session.observe(&distracted("alice", "Drowsy/Sleeping")));
    // Low-confidence frame is not "accepted"; verdict stays at the last raw value
    assert!(!session.observe(&low_confidence(attentive("alice"))));
    assert_eq!(session.student("alice").unwrap().window().len(), 2);
}

#[test]
fn test_single_noisy_frame_does_not_flip_verdict() {
    let mut session = session();
    for _ in 0..3 {
        session.observe(&attentive("alice"));
    }

    assert!(session.observe(&distracted("alice", "Looking Sideways")));
    assert!(session.observe(&attentive("alice")));
}

#[test]
fn test_even_window_tie_is_distracted() {
    let config = AttentionConfig {
        history_length: 4,
        consecutive_frames_required: 2,
        ..Default::default()
    };
    let mut session = AttentionSession::new("room", Arc::new(config));

    session.observe(&attentive("alice"));
    session.observe(&distracted("alice", "Looking Up"));
    session.observe(&attentive("alice"));
    assert!(!session.observe(&distracted("alice", "Looking Up")));
}

#[test]
fn test_distraction_reasons_tallied_for_gated_distracted_frames() {
    let mut session = session();
    session.observe(&distracted("alice", "Looking Sideways"));
    session.observe(&distracted("alice", "Looking Sideways"));
    session.observe(&distracted("alice", "Drowsy/Sleeping"));
    session.observe(&low_confidence(distracted("alice", "Drowsy/Sleeping")));

    // Attentive frame carrying a stale reason is not a distraction
    let mut stale = attentive("alice");
    stale.distraction_reason = Some("Looking Up".into());
    session.observe(&stale);

    let state = session.student("alice").unwrap();
    assert_eq!(state.distraction_tally().get("Looking Sideways"), Some(&2));
    assert_eq!(state.distraction_tally().get("Drowsy/Sleeping"), Some(&1));
    assert_eq!(state.distraction_tally().get("Looking Up"), None);
    assert_eq!(state.top_distraction_reason(), Some("Looking Sideways"));
}

#[test]
fn test_unknown_faces_are_tracked() {
    let mut session = session();
    session.observe(&attentive(UNKNOWN_STUDENT));
    session.observe(&attentive(""));

    let state = session.student(UNKNOWN_STUDENT).unwrap();
    assert_eq!(state.total_frames_seen(), 2);
    assert_eq!(session.student_count(), 1);
}

#[test]
fn test_students_are_isolated() {
    let mut session = session();
    for _ in 0..3 {
        session.observe(&distracted("bob", "Looking Up"));
    }
    assert!(session.observe(&attentive("alice")));
    assert_eq!(session.student("alice").unwrap().total_frames_seen(), 1);
    assert!(!session.student("bob").unwrap().current_smoothed_state());
}

/// Given A sends 5 attentive then 3 distracted frames and B sends nothing,
/// when the session is summarized,
/// then only A appears. The first distracted frame is absorbed by the
/// 2-of-3 window, so 6 of 8 frames count as attentive.
#[test]
fn test_two_student_scenario() {
    let mut session = session();
    for _ in 0..5 {
        session.observe(&attentive("A"));
    }
    for _ in 0..3 {
        session.observe(&distracted("A", "Looking Sideways"));
    }

    let summary = session.summarize();
    assert_eq!(summary.len(), 1);

    let a = &summary[0];
    assert_eq!(a.name, "A");
    assert_eq!(a.total_frames, 8);
    assert_eq!(a.attentive_frames, 6);
    assert_eq!(a.attentive_percentage, 75);
    assert_eq!(a.estimated_seconds, 16.0);
    assert_eq!(a.top_distraction_reason, "Looking Sideways");
    assert_eq!(a.distraction_event_count, 3);
    assert!((a.average_confidence - 0.9).abs() < 1e-6);
    assert_eq!(a.attendance_status, AttendanceStatus::Partial);
    assert!(summary.iter().all(|e| e.name != "B"));
}

#[test]
fn test_summary_never_fails_for_attentive_student() {
    let mut session = session();
    for _ in 0..10 {
        session.observe_at(&attentive("alice"), Utc::now());
    }
    let summary = session.summarize();
    assert_eq!(summary[0].attentive_percentage, 100);
    assert_eq!(summary[0].top_distraction_reason, "None");
    assert_eq!(summary[0].attendance_status, AttendanceStatus::Present);
}
