//! Document fingerprints
//!
//! A fingerprint is the lowercase hex SHA-256 of the document bytes. It
//! partitions the lecture cache, so two uploads of the same file share
//! their generated lessons.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::Path;
use tokio::io::AsyncReadExt;

const READ_CHUNK: usize = 8192;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentFingerprint(String);

impl DocumentFingerprint {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(format!("{:x}", Sha256::digest(bytes)))
    }

    /// Hash a file in fixed-size chunks
    pub async fn from_file(path: &Path) -> std::io::Result<Self> {
        let mut file = tokio::fs::File::open(path).await?;
        let mut hasher = Sha256::new();
        let mut buffer = vec![0u8; READ_CHUNK];

        loop {
            let n = file.read(&mut buffer).await?;
            if n == 0 {
                break;
            }
            hasher.update(&buffer[..n]);
        }

        Ok(Self(format!("{:x}", hasher.finalize())))
    }

    /// Accept an externally supplied fingerprint
    ///
    /// Only 64 hex digits are accepted; the value ends up in file paths.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.len() == 64 && value.chars().all(|c| c.is_ascii_hexdigit()) {
            Some(Self(value.to_ascii_lowercase()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digest() {
        let fp = DocumentFingerprint::from_bytes(b"abc");
        assert_eq!(
            fp.as_str(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[tokio::test]
    async fn test_file_matches_bytes() {
        // Larger than one read chunk
        let content: Vec<u8> = (0..20_000u32).map(|i| (i % 251) as u8).collect();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.txt");
        std::fs::write(&path, &content).unwrap();

        let from_file = DocumentFingerprint::from_file(&path).await.unwrap();
        assert_eq!(from_file, DocumentFingerprint::from_bytes(&content));
    }

    #[test]
    fn test_parse_rejects_path_like_values() {
        assert!(DocumentFingerprint::parse("../../etc/passwd").is_none());
        assert!(DocumentFingerprint::parse("abc").is_none());

        let upper = "BA7816BF8F01CFEA414140DE5DAE2223B00361A396177A9CB410FF61F20015AD";
        let parsed = DocumentFingerprint::parse(upper).unwrap();
        assert_eq!(parsed, DocumentFingerprint::from_bytes(b"abc"));
    }
}
