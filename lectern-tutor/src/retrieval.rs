//! Context retrieval for lecture generation
//!
//! Retrieval never fails a unit: an empty string means "no context", and
//! the pipeline decides what to say about it.

use async_trait::async_trait;
use std::collections::HashSet;

/// Chunks returned per query
pub const TOP_K: usize = 3;

/// Each chunk is cut to this many characters before joining
pub const MAX_CHUNK_CHARS: usize = 450;

pub const CHUNK_SEPARATOR: &str = "\n\n---\n\n";

/// Paragraphs are merged into chunks of roughly this size
const TARGET_CHUNK_CHARS: usize = 800;

/// Words too common to say anything about a topic
const STOPWORDS: [&str; 16] = [
    "the", "and", "for", "with", "from", "into", "that", "this", "what", "are", "its", "our",
    "your", "how", "why", "chapter",
];

#[async_trait]
pub trait ContextRetriever: Send + Sync {
    /// Textbook excerpts relevant to `topic`, or an empty string
    async fn retrieve(&self, topic: &str) -> String;
}

/// Retriever for sessions without a document body
pub struct NoContext;

#[async_trait]
impl ContextRetriever for NoContext {
    async fn retrieve(&self, _topic: &str) -> String {
        String::new()
    }
}

/// Keyword-overlap ranking over in-memory document chunks
pub struct ChunkRetriever {
    chunks: Vec<Chunk>,
    top_k: usize,
}

struct Chunk {
    text: String,
    terms: HashSet<String>,
}

impl ChunkRetriever {
    pub fn new<I, S>(chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let chunks = chunks
            .into_iter()
            .map(Into::into)
            .filter(|text: &String| !text.trim().is_empty())
            .map(|text| Chunk {
                terms: terms(&text),
                text,
            })
            .collect();
        Self {
            chunks,
            top_k: TOP_K,
        }
    }

    /// Split a document on blank lines and merge paragraphs into chunks
    pub fn from_document(text: &str) -> Self {
        let mut chunks = Vec::new();
        let mut current = String::new();

        for paragraph in text.split("\n\n").map(str::trim).filter(|p| !p.is_empty()) {
            if !current.is_empty() && current.len() + paragraph.len() > TARGET_CHUNK_CHARS {
                chunks.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push_str("\n\n");
            }
            current.push_str(paragraph);
        }
        if !current.is_empty() {
            chunks.push(current);
        }

        Self::new(chunks)
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    fn rank(&self, topic: &str) -> Vec<&Chunk> {
        let query = terms(topic);
        if query.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<(usize, usize, &Chunk)> = self
            .chunks
            .iter()
            .enumerate()
            .filter_map(|(position, chunk)| {
                let score = query.intersection(&chunk.terms).count();
                (score > 0).then_some((score, position, chunk))
            })
            .collect();

        // Highest overlap first; document order breaks ties
        scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        scored
            .into_iter()
            .take(self.top_k)
            .map(|(_, _, chunk)| chunk)
            .collect()
    }
}

#[async_trait]
impl ContextRetriever for ChunkRetriever {
    async fn retrieve(&self, topic: &str) -> String {
        self.rank(topic)
            .into_iter()
            .map(|chunk| truncate_chars(&chunk.text, MAX_CHUNK_CHARS))
            .collect::<Vec<_>>()
            .join(CHUNK_SEPARATOR)
    }
}

fn terms(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= 3)
        .map(str::to_lowercase)
        .filter(|w| !STOPWORDS.contains(&w.as_str()))
        .collect()
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ranks_by_overlap() {
        let retriever = ChunkRetriever::new([
            "Mitochondria produce energy for the cell.",
            "The French Revolution began in 1789.",
            "Cell membranes control what enters the cell and energy flow.",
        ]);

        let context = retriever.retrieve("Cell energy").await;
        let parts: Vec<&str> = context.split(CHUNK_SEPARATOR).collect();
        assert_eq!(parts.len(), 2);
        assert!(parts[0].starts_with("Mitochondria"));
        assert!(parts[1].starts_with("Cell membranes"));
    }

    #[tokio::test]
    async fn test_unrelated_topic_is_empty() {
        let retriever = ChunkRetriever::new(["Mitochondria produce energy."]);
        assert_eq!(retriever.retrieve("Medieval poetry").await, "");
        assert_eq!(retriever.retrieve("the and").await, "");
    }

    #[tokio::test]
    async fn test_chunks_truncated_and_limited() {
        let long = format!("photosynthesis {}", "é".repeat(600));
        let retriever = ChunkRetriever::new(vec![long.clone(); 5]);

        let context = retriever.retrieve("Photosynthesis").await;
        let parts: Vec<&str> = context.split(CHUNK_SEPARATOR).collect();
        assert_eq!(parts.len(), TOP_K);
        assert!(parts.iter().all(|p| p.chars().count() == MAX_CHUNK_CHARS));
    }

    #[test]
    fn test_from_document_merges_paragraphs() {
        let paragraph = "word ".repeat(60);
        let document = vec![paragraph.as_str(); 6].join("\n\n");
        let retriever = ChunkRetriever::from_document(&document);
        // ~300 chars per paragraph, two per chunk
        assert_eq!(retriever.chunk_count(), 3);
    }

    #[tokio::test]
    async fn test_no_context() {
        assert!(NoContext.retrieve("anything").await.is_empty());
    }
}
