//! Vector index adapter contract

use std::fmt::Debug;

use async_trait::async_trait;

use super::{CacheEntry, SimilarityMatch};
use crate::domain::DomainError;

/// Durable, queryable store of cache entries.
///
/// `search` returns the single nearest neighbour by inner product, and only
/// when its score meets `threshold` and its model equals `model`. An empty
/// index is a miss, never an error. `store` must be durable before it
/// returns. Adapters do not retry; storage failures surface as
/// `DomainError::IndexUnavailable`.
#[async_trait]
pub trait VectorIndex: Send + Sync + Debug {
    /// Find the nearest cached entry for this model
    async fn search(
        &self,
        embedding: &[f32],
        model: &str,
        threshold: f32,
    ) -> Result<Option<SimilarityMatch>, DomainError>;

    /// Append a new entry
    async fn store(&self, entry: CacheEntry) -> Result<(), DomainError>;

    /// Number of stored entries
    async fn len(&self) -> Result<usize, DomainError>;

    /// Whether the index holds no entries
    async fn is_empty(&self) -> Result<bool, DomainError> {
        Ok(self.len().await? == 0)
    }

    /// Backend name for logs and health checks
    fn backend_name(&self) -> &'static str;
}
