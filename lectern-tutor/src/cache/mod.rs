//! Lecture content cache
//!
//! Generated lesson text keyed by `(document fingerprint, unit index)`.
//! Backend failures are logged and treated as misses; generation is safe
//! to repeat, so the cache never fails a teaching session.

mod file;
mod memory;

pub use file::FileBackend;
pub use memory::MemoryBackend;

use crate::error::CacheError;
use crate::fingerprint::DocumentFingerprint;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

/// Stable address of one cached lesson
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub fingerprint: DocumentFingerprint,
    /// 1-based curriculum unit index
    pub unit_index: usize,
}

impl CacheKey {
    pub fn new(fingerprint: DocumentFingerprint, unit_index: usize) -> Self {
        Self {
            fingerprint,
            unit_index,
        }
    }
}

/// Storage behind `LectureCache`
///
/// Implementations must tolerate concurrent `load`/`store` for the same
/// key; last writer wins.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    fn name(&self) -> &'static str;

    async fn load(&self, key: &CacheKey) -> Result<Option<String>, CacheError>;

    async fn store(&self, key: &CacheKey, text: &str) -> Result<(), CacheError>;

    /// Returns whether an entry existed
    async fn remove(&self, key: &CacheKey) -> Result<bool, CacheError>;
}

/// Shared handle to the lecture cache
#[derive(Clone)]
pub struct LectureCache {
    backend: Arc<dyn CacheBackend>,
}

impl LectureCache {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self { backend }
    }

    pub fn memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    pub fn file(root: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(FileBackend::new(root)))
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Pure lookup
    pub async fn get(&self, key: &CacheKey) -> Option<String> {
        match self.backend.load(key).await {
            Ok(hit) => {
                debug!(
                    fingerprint = %key.fingerprint,
                    unit = key.unit_index,
                    hit = hit.is_some(),
                    "Lecture cache lookup"
                );
                hit
            }
            Err(e) => {
                warn!(
                    backend = self.backend.name(),
                    unit = key.unit_index,
                    error = %e,
                    "Lecture cache read failed, treating as miss"
                );
                None
            }
        }
    }

    /// Store generated text; a failed write only costs a later regeneration
    pub async fn put(&self, key: &CacheKey, text: &str) {
        if let Err(e) = self.backend.store(key, text).await {
            warn!(
                backend = self.backend.name(),
                unit = key.unit_index,
                error = %e,
                "Lecture cache write failed"
            );
        }
    }

    /// Drop an entry so the next teaching run regenerates it
    pub async fn invalidate(&self, key: &CacheKey) -> bool {
        match self.backend.remove(key).await {
            Ok(existed) => existed,
            Err(e) => {
                warn!(
                    backend = self.backend.name(),
                    unit = key.unit_index,
                    error = %e,
                    "Lecture cache invalidation failed"
                );
                false
            }
        }
    }
}
