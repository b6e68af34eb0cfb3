//! Ordered provider fallback
//!
//! Providers are tried in list order. Every call gets the same contract: a
//! bounded timeout, `max_retries` extra attempts on timeout or provider
//! error, immediate abandonment on cancellation. In offline-only mode
//! providers tagged `Capability::Online` are never called.

use super::{Capability, GenerationRequest, LectureGenerator};
use crate::error::GenerationError;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Text produced by one provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generated {
    pub text: String,
    pub provider_id: &'static str,
    pub capability: Capability,
}

pub struct ProviderChain {
    providers: Vec<Arc<dyn LectureGenerator>>,
    timeout: Duration,
    max_retries: u32,
    offline_only: bool,
}

impl ProviderChain {
    pub fn new(timeout: Duration, max_retries: u32) -> Self {
        Self {
            providers: Vec::new(),
            timeout,
            max_retries,
            offline_only: false,
        }
    }

    /// Restrict the chain to providers that need no network
    pub fn with_offline_only(mut self, offline_only: bool) -> Self {
        self.offline_only = offline_only;
        self
    }

    /// Append a provider; earlier providers are preferred
    pub fn with_provider(mut self, provider: Arc<dyn LectureGenerator>) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn capabilities(&self) -> Vec<(&'static str, Capability)> {
        self.providers
            .iter()
            .map(|p| (p.provider_id(), p.capability()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub async fn generate(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<Generated, GenerationError> {
        let mut last_error = GenerationError::Unavailable("no providers configured".into());

        for provider in &self.providers {
            if cancel.is_cancelled() {
                return Err(GenerationError::Cancelled);
            }

            let capability = provider.capability();
            if self.offline_only && capability == Capability::Online {
                debug!(provider = provider.provider_id(), "Online provider skipped in offline-only mode");
                last_error = GenerationError::Unavailable(provider.provider_id().to_string());
                continue;
            }

            let available = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(GenerationError::Cancelled),
                available = provider.is_available() => available,
            };
            if !available {
                debug!(provider = provider.provider_id(), "Provider unavailable, skipping");
                last_error = GenerationError::Unavailable(provider.provider_id().to_string());
                continue;
            }

            match self.attempt(provider.as_ref(), request, cancel).await {
                Ok(text) => {
                    info!(
                        provider = provider.provider_id(),
                        capability = ?capability,
                        unit = request.unit_index,
                        "Lecture generated"
                    );
                    return Ok(Generated {
                        text,
                        provider_id: provider.provider_id(),
                        capability,
                    });
                }
                Err(GenerationError::Cancelled) => return Err(GenerationError::Cancelled),
                Err(e) => last_error = e,
            }
        }

        Err(GenerationError::Exhausted(last_error.to_string()))
    }

    /// One provider with its retry budget
    async fn attempt(
        &self,
        provider: &dyn LectureGenerator,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<String, GenerationError> {
        let attempts = self.max_retries + 1;
        let mut last_error = None;

        for attempt in 1..=attempts {
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(GenerationError::Cancelled),
                result = tokio::time::timeout(self.timeout, provider.generate(request)) => result,
            };

            let error = match result {
                Ok(Ok(text)) if !text.trim().is_empty() => return Ok(text),
                Ok(Ok(_)) => GenerationError::provider(provider.provider_id(), "Empty lecture text"),
                Ok(Err(e @ GenerationError::Unavailable(_))) => {
                    warn!(provider = provider.provider_id(), error = %e, "Provider unavailable");
                    return Err(e);
                }
                Ok(Err(e)) => e,
                Err(_) => GenerationError::Timeout(self.timeout),
            };

            warn!(
                provider = provider.provider_id(),
                capability = ?provider.capability(),
                unit = request.unit_index,
                attempt,
                attempts,
                error = %error,
                "Generation attempt failed"
            );
            last_error = Some(error);
        }

        Err(last_error.unwrap_or(GenerationError::Timeout(self.timeout)))
    }
}
