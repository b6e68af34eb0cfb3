//! `[tutor]` configuration section

use lectern_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Lecture generation and delivery settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TutorConfig {
    /// Upper bound for a single provider call
    pub generation_timeout_secs: u64,

    /// Extra attempts per provider after the first failure
    pub max_retries: u32,

    pub ollama_url: String,
    pub ollama_model: String,

    /// Append the offline template generator after the online providers
    pub offline_fallback: bool,

    /// Never call providers that need network access
    pub offline_only: bool,

    /// Speaking rate used to pace sentence events
    pub words_per_minute: u32,

    /// Silence between two lessons
    pub inter_unit_pause_ms: u64,

    /// EventBus channel capacity
    pub event_capacity: usize,
}

impl Default for TutorConfig {
    fn default() -> Self {
        Self {
            generation_timeout_secs: 180,
            max_retries: 2,
            ollama_url: "http://localhost:11434".to_string(),
            ollama_model: "mistral".to_string(),
            offline_fallback: true,
            offline_only: false,
            words_per_minute: 150,
            inter_unit_pause_ms: 1000,
            event_capacity: 100,
        }
    }
}

impl TutorConfig {
    /// Load the `[tutor]` section, falling back to defaults when absent
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let config: Self = lectern_common::config::load_section(config_file, "tutor");
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.generation_timeout_secs == 0 {
            return Err(Error::Config("generation_timeout_secs must be positive".into()));
        }
        if self.words_per_minute == 0 {
            return Err(Error::Config("words_per_minute must be positive".into()));
        }
        if self.event_capacity == 0 {
            return Err(Error::Config("event_capacity must be at least 1".into()));
        }
        if self.offline_only && !self.offline_fallback {
            return Err(Error::Config(
                "offline_only requires offline_fallback, no provider would remain".into(),
            ));
        }
        if !self.ollama_url.starts_with("http://") && !self.ollama_url.starts_with("https://") {
            return Err(Error::Config(format!(
                "ollama_url must be an http(s) URL, got {}",
                self.ollama_url
            )));
        }
        Ok(())
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }

    pub fn inter_unit_pause(&self) -> Duration {
        Duration::from_millis(self.inter_unit_pause_ms)
    }
}
