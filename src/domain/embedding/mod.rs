//! Embedding provider domain models and traits

mod provider;
mod request;
mod response;
mod vector;

pub use provider::{embed_conversation, EmbeddingProvider};
pub use request::EmbeddingRequest;
pub use response::{Embedding, EmbeddingResponse, EmbeddingUsage};
pub use vector::{inner_product, l2_normalize};

#[cfg(test)]
pub use provider::mock::MockEmbeddingProvider;
