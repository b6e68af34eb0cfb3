//! HTTP API handlers

pub mod health;
pub mod lectures;
pub mod sse;
pub mod teach;

pub use health::health_routes;
pub use lectures::lecture_routes;
pub use sse::event_stream;
pub use teach::teach_routes;
