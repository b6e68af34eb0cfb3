//! Ollama text generation client

use super::{Capability, GenerationRequest, LectureGenerator};
use crate::error::GenerationError;
use crate::prompt;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Readiness probes must not hold up a teaching session
const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Serialize)]
struct GenerateBody<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Local Ollama server (`/api/generate`, non-streaming)
pub struct OllamaGenerator {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaGenerator {
    /// `request_timeout` should cover the slowest expected generation;
    /// the provider chain applies its own bound on top.
    pub fn new(
        base_url: &str,
        model: &str,
        request_timeout: Duration,
    ) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("lectern-tutor/", env!("CARGO_PKG_VERSION")))
            .timeout(request_timeout)
            .build()
            .map_err(|e| GenerationError::provider("ollama", e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl LectureGenerator for OllamaGenerator {
    fn provider_id(&self) -> &'static str {
        "ollama"
    }

    fn capability(&self) -> Capability {
        Capability::Online
    }

    async fn is_available(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);
        match self.client.get(&url).timeout(PROBE_TIMEOUT).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!(error = %e, "Ollama not reachable");
                false
            }
        }
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let prompt = prompt::lecture_prompt(request);
        let url = format!("{}/api/generate", self.base_url);
        debug!(unit = request.unit_index, model = %self.model, "Requesting lecture from Ollama");

        let response = self
            .client
            .post(&url)
            .json(&GenerateBody {
                model: &self.model,
                prompt: &prompt,
                stream: false,
            })
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    GenerationError::Unavailable(format!("Ollama at {}: {}", self.base_url, e))
                } else {
                    GenerationError::provider("ollama", e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(GenerationError::provider(
                "ollama",
                format!("HTTP {}", response.status()),
            ));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::provider("ollama", format!("Invalid response: {}", e)))?;

        let text = body.response.trim();
        if text.is_empty() {
            return Err(GenerationError::provider("ollama", "Empty response"));
        }
        Ok(text.to_string())
    }
}
