//! Domain layer - Core cache entities, contracts and errors

pub mod capabilities;
pub mod chat;
pub mod embedding;
pub mod error;
pub mod model_selection;
pub mod semantic_cache;

pub use capabilities::Capabilities;
pub use chat::{Message, Usage};
pub use error::DomainError;
pub use semantic_cache::{
    CacheEntry, PendingOperation, PendingOperationRegistry, SemanticCacheConfig, SimilarityMatch,
    VectorIndex,
};
