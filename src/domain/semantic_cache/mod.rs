//! Semantic cache domain models and traits
//!
//! Matches semantically similar conversations by embedding similarity
//! rather than requiring exact key matches.

mod config;
mod entry;
mod index;
mod pending;

pub use config::SemanticCacheConfig;
pub use entry::{meets_threshold, CacheEntry, EntryMetadata, SimilarityMatch};
pub use index::VectorIndex;
pub use pending::{PendingOperation, PendingOperationRegistry};
