//! Lecture cache semantics across backends

use async_trait::async_trait;
use lectern_tutor::cache::{CacheBackend, CacheKey, LectureCache};
use lectern_tutor::error::CacheError;
use lectern_tutor::fingerprint::DocumentFingerprint;
use std::sync::Arc;

fn key(unit: usize) -> CacheKey {
    CacheKey::new(DocumentFingerprint::from_bytes(b"chemistry textbook"), unit)
}

#[tokio::test]
async fn test_put_then_get_is_stable() {
    let cache = LectureCache::memory();
    assert!(cache.get(&key(1)).await.is_none());

    cache.put(&key(1), "Lesson 1\n\nAtoms").await;
    assert_eq!(cache.get(&key(1)).await.as_deref(), Some("Lesson 1\n\nAtoms"));
    assert_eq!(cache.get(&key(1)).await.as_deref(), Some("Lesson 1\n\nAtoms"));
    assert!(cache.get(&key(2)).await.is_none());
}

#[tokio::test]
async fn test_overwrite_and_invalidate() {
    let cache = LectureCache::memory();
    cache.put(&key(1), "first").await;
    cache.put(&key(1), "regenerated").await;
    assert_eq!(cache.get(&key(1)).await.as_deref(), Some("regenerated"));

    assert!(cache.invalidate(&key(1)).await);
    assert!(!cache.invalidate(&key(1)).await);
    assert!(cache.get(&key(1)).await.is_none());
}

#[tokio::test]
async fn test_documents_are_partitioned() {
    let cache = LectureCache::memory();
    let other = CacheKey::new(DocumentFingerprint::from_bytes(b"physics textbook"), 1);
    cache.put(&key(1), "chemistry").await;

    assert!(cache.get(&other).await.is_none());
}

#[tokio::test]
async fn test_file_cache_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    {
        let cache = LectureCache::file(dir.path());
        cache.put(&key(3), "Lesson 3\n\nCovalent bonds").await;
    }

    let reopened = LectureCache::file(dir.path());
    assert_eq!(
        reopened.get(&key(3)).await.as_deref(),
        Some("Lesson 3\n\nCovalent bonds")
    );
}

#[tokio::test]
async fn test_concurrent_writers_leave_one_complete_entry() {
    let dir = tempfile::tempdir().unwrap();
    let cache = LectureCache::file(dir.path());
    let versions: Vec<String> = (0..16).map(|i| format!("version {} {}", i, "x".repeat(4096))).collect();

    let mut handles = Vec::new();
    for version in versions.clone() {
        let cache = cache.clone();
        handles.push(tokio::spawn(async move {
            cache.put(&key(1), &version).await;
            cache.get(&key(1)).await
        }));
    }
    for handle in handles {
        // Readers never observe a torn write
        let seen = handle.await.unwrap().unwrap();
        assert!(versions.contains(&seen));
    }

    let last = cache.get(&key(1)).await.unwrap();
    assert!(versions.contains(&last));
}

struct BrokenBackend;

#[async_trait]
impl CacheBackend for BrokenBackend {
    fn name(&self) -> &'static str {
        "broken"
    }

    async fn load(&self, _key: &CacheKey) -> Result<Option<String>, CacheError> {
        Err(CacheError::Unavailable("disk gone".into()))
    }

    async fn store(&self, _key: &CacheKey, _text: &str) -> Result<(), CacheError> {
        Err(CacheError::Unavailable("disk gone".into()))
    }

    async fn remove(&self, _key: &CacheKey) -> Result<bool, CacheError> {
        Err(CacheError::Unavailable("disk gone".into()))
    }
}

#[tokio::test]
async fn test_unavailable_backend_degrades_to_miss() {
    let cache = LectureCache::new(Arc::new(BrokenBackend));

    cache.put(&key(1), "lost").await;
    assert!(cache.get(&key(1)).await.is_none());
    assert!(!cache.invalidate(&key(1)).await);
    assert_eq!(cache.backend_name(), "broken");
}
