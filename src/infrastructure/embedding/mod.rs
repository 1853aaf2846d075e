//! Embedding provider implementations

mod factory;
mod hashing;
mod local;
mod openai;

pub use factory::{EmbeddingConfig, EmbeddingProviderFactory, EmbeddingProviderKind};
pub use hashing::{HashingEmbeddingProvider, DEFAULT_HASHING_DIMENSIONS};
#[cfg(feature = "local-embeddings")]
pub use local::LocalEmbeddingProvider;
pub use local::{DEFAULT_LOCAL_MODEL, LOCAL_EMBEDDING_DIMENSIONS};
pub use openai::{OpenAiEmbeddingProvider, DEFAULT_OPENAI_BASE_URL, DEFAULT_OPENAI_EMBEDDING_MODEL};
