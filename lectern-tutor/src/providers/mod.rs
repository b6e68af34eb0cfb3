//! Lecture generation providers
//!
//! Each provider turns a unit title plus retrieved context into a spoken
//! lecture script. Providers are tried in order by `ProviderChain`.

mod chain;
mod offline;
mod ollama;

pub use chain::{Generated, ProviderChain};
pub use offline::OfflineGenerator;
pub use ollama::OllamaGenerator;

use crate::error::GenerationError;
use async_trait::async_trait;
use serde::Serialize;

/// Whether a provider needs network access
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Capability {
    Online,
    Offline,
}

/// Input for one unit's lecture script
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// 1-based curriculum position
    pub unit_index: usize,
    pub total_units: usize,
    pub unit_title: String,
    /// Retrieved textbook excerpts; may be empty
    pub context: String,
    pub greeting: &'static str,
}

impl GenerationRequest {
    pub fn new(unit_index: usize, total_units: usize, unit_title: &str, context: String) -> Self {
        Self {
            unit_index,
            total_units,
            unit_title: unit_title.to_string(),
            context,
            greeting: crate::prompt::current_greeting(),
        }
    }

    pub fn has_context(&self) -> bool {
        !self.context.trim().is_empty()
    }
}

/// A lecture script generator
#[async_trait]
pub trait LectureGenerator: Send + Sync {
    /// Provider identifier (e.g. "ollama", "offline")
    fn provider_id(&self) -> &'static str;

    fn capability(&self) -> Capability;

    /// Cheap readiness probe; unavailable providers are skipped by the chain
    async fn is_available(&self) -> bool {
        true
    }

    /// Produce the lecture body (without the `Lesson N` header)
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}
