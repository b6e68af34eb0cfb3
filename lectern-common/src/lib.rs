//! # Lectern Common Library
//!
//! Shared code for the Lectern services including:
//! - Error type shared across crates
//! - Bootstrap configuration loading and root folder resolution
//! - Event types (LecternEvent enum) and the EventBus
//! - Attendance summary types produced by lectern-attend
//! - Server-Sent Events helpers

pub mod config;
pub mod error;
pub mod events;
pub mod sse;
pub mod summary;

pub use error::{Error, Result};
pub use summary::{AttendanceStatus, SessionSummaryEntry};
