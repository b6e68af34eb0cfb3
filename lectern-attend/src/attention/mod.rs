//! Attentiveness classifier and session aggregation
//!
//! Converts noisy per-frame detector output into a stable attentive /
//! distracted verdict per student:
//! - Confidence gating keeps low-confidence frames out of the vote
//! - A bounded window of accepted frames is smoothed by majority vote
//! - Until the window fills, the latest accepted raw verdict is reported
//!
//! `AttentionSession` owns one state per student label and produces the
//! end-of-session summary.

mod observation;
mod session;
mod state;
mod window;

pub use observation::{Emotion, FrameObservation, UNKNOWN_STUDENT};
pub use session::{AttentionSession, StudentSnapshot};
pub use state::StudentAttentionState;
pub use window::SmoothingWindow;
