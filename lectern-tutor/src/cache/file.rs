//! Filesystem cache backend
//!
//! Layout: `<root>/<fingerprint>/lesson_<n>.txt`. Writes go to a uniquely
//! named temp file in the same directory and are renamed into place, so a
//! reader sees either the old or the new text, never a partial one.

use super::{CacheBackend, CacheKey};
use crate::error::CacheError;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use uuid::Uuid;

pub struct FileBackend {
    root: PathBuf,
}

impl FileBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn document_dir(&self, key: &CacheKey) -> PathBuf {
        self.root.join(key.fingerprint.as_str())
    }

    fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.document_dir(key)
            .join(format!("lesson_{}.txt", key.unit_index))
    }
}

#[async_trait]
impl CacheBackend for FileBackend {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn load(&self, key: &CacheKey) -> Result<Option<String>, CacheError> {
        match tokio::fs::read_to_string(self.entry_path(key)).await {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn store(&self, key: &CacheKey, text: &str) -> Result<(), CacheError> {
        let dir = self.document_dir(key);
        tokio::fs::create_dir_all(&dir).await?;

        let tmp = dir.join(format!(
            ".lesson_{}.{}.tmp",
            key.unit_index,
            Uuid::new_v4().simple()
        ));
        if let Err(e) = tokio::fs::write(&tmp, text).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        if let Err(e) = tokio::fs::rename(&tmp, self.entry_path(key)).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn remove(&self, key: &CacheKey) -> Result<bool, CacheError> {
        match tokio::fs::remove_file(self.entry_path(key)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::DocumentFingerprint;

    #[tokio::test]
    async fn test_entry_layout() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path());
        let fp = DocumentFingerprint::from_bytes(b"book");
        let key = CacheKey::new(fp.clone(), 4);

        backend.store(&key, "Lesson 4\n\nText").await.unwrap();

        let expected = dir.path().join(fp.as_str()).join("lesson_4.txt");
        assert_eq!(std::fs::read_to_string(expected).unwrap(), "Lesson 4\n\nText");

        // No temp files left behind
        let names: Vec<_> = std::fs::read_dir(dir.path().join(fp.as_str()))
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_entry_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path());
        let key = CacheKey::new(DocumentFingerprint::from_bytes(b"x"), 1);

        assert!(backend.load(&key).await.unwrap().is_none());
        assert!(!backend.remove(&key).await.unwrap());
    }
}
