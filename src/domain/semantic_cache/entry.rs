//! Cache entry and search outcome types

use serde::{Deserialize, Serialize};

use crate::domain::chat::{Message, Usage};

/// Everything stored alongside a vector. Persisted as one record per vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryMetadata {
    pub request_messages: Vec<Message>,
    pub response_messages: Vec<Message>,
    pub model: String,
    #[serde(default)]
    pub usage: Usage,
    /// Unix timestamp (seconds) when the entry was created
    #[serde(default)]
    pub created_at: i64,
    /// TTL requested by the caller; recorded for the backend, not enforced
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl_secs: Option<u64>,
}

/// A stored cache unit. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    embedding: Vec<f32>,
    metadata: EntryMetadata,
}

impl CacheEntry {
    /// Create a new cache entry stamped with the current time
    pub fn new(
        embedding: Vec<f32>,
        request_messages: Vec<Message>,
        response_messages: Vec<Message>,
        model: impl Into<String>,
        usage: Usage,
    ) -> Self {
        Self {
            embedding,
            metadata: EntryMetadata {
                request_messages,
                response_messages,
                model: model.into(),
                usage,
                created_at: chrono::Utc::now().timestamp(),
                ttl_secs: None,
            },
        }
    }

    /// Rebuild an entry from its persisted halves
    pub fn from_parts(embedding: Vec<f32>, metadata: EntryMetadata) -> Self {
        Self {
            embedding,
            metadata,
        }
    }

    pub fn with_ttl_secs(mut self, ttl_secs: Option<u64>) -> Self {
        self.metadata.ttl_secs = ttl_secs;
        self
    }

    pub fn embedding(&self) -> &[f32] {
        &self.embedding
    }

    pub fn metadata(&self) -> &EntryMetadata {
        &self.metadata
    }

    pub fn model(&self) -> &str {
        &self.metadata.model
    }

    pub fn request_messages(&self) -> &[Message] {
        &self.metadata.request_messages
    }

    pub fn response_messages(&self) -> &[Message] {
        &self.metadata.response_messages
    }

    pub fn usage(&self) -> Usage {
        self.metadata.usage
    }

    pub fn into_parts(self) -> (Vec<f32>, EntryMetadata) {
        (self.embedding, self.metadata)
    }
}

/// A search hit. References the entry it came from without owning it.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatch {
    pub response_messages: Vec<Message>,
    /// Raw metric value reported by the index (inner product for the
    /// shipped backends)
    pub similarity_score: f32,
    pub usage: Usage,
}

impl SimilarityMatch {
    pub fn from_metadata(metadata: &EntryMetadata, similarity_score: f32) -> Self {
        Self {
            response_messages: metadata.response_messages.clone(),
            similarity_score,
            usage: metadata.usage,
        }
    }
}

/// Whether a best-neighbour score is good enough to serve from cache.
/// The boundary itself counts as a hit.
pub fn meets_threshold(score: f32, threshold: f32) -> bool {
    score >= threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_entry_creation() {
        let entry = CacheEntry::new(
            vec![0.1, 0.2],
            vec![Message::user("What is 2+2?")],
            vec![Message::assistant("4")],
            "gpt-4o-mini",
            Usage::new(5, 1, 6),
        )
        .with_ttl_secs(Some(60));

        assert_eq!(entry.embedding(), &[0.1, 0.2]);
        assert_eq!(entry.model(), "gpt-4o-mini");
        assert_eq!(entry.response_messages()[0].text(), "4");
        assert_eq!(entry.usage().total_tokens, 6);
        assert_eq!(entry.metadata().ttl_secs, Some(60));
        assert!(entry.metadata().created_at > 0);
    }

    #[test]
    fn test_parts_roundtrip() {
        let entry = CacheEntry::new(
            vec![1.0],
            vec![Message::user("q")],
            vec![Message::assistant("a")],
            "m",
            Usage::default(),
        );

        let (embedding, metadata) = entry.clone().into_parts();
        assert_eq!(CacheEntry::from_parts(embedding, metadata), entry);
    }

    #[test]
    fn test_meets_threshold_boundary() {
        assert!(meets_threshold(0.9, 0.9));
        assert!(meets_threshold(0.91, 0.9));
        assert!(!meets_threshold(0.89, 0.9));
        assert!(meets_threshold(-0.5, -1.0));
    }

    #[test]
    fn test_similarity_match_from_metadata() {
        let entry = CacheEntry::new(
            vec![1.0],
            vec![Message::user("q")],
            vec![Message::assistant("a")],
            "m",
            Usage::new(1, 2, 3),
        );

        let hit = SimilarityMatch::from_metadata(entry.metadata(), 0.97);

        assert_eq!(hit.response_messages, vec![Message::assistant("a")]);
        assert_eq!(hit.usage, Usage::new(1, 2, 3));
        assert!((hit.similarity_score - 0.97).abs() < f32::EPSILON);
    }
}
