//! Embedding provider trait definition

use async_trait::async_trait;
use std::fmt::Debug;

use super::{l2_normalize, EmbeddingRequest, EmbeddingResponse};
use crate::domain::chat::{conversation_text, Message};
use crate::domain::DomainError;

/// Trait for embedding providers (local hashing, OpenAI-compatible APIs, ...)
///
/// Implementations hold no mutable per-call state and are shared across
/// request tasks.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync + Debug {
    /// Generate an embedding for the given input
    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, DomainError>;

    /// Get the provider name
    fn provider_name(&self) -> &'static str;

    /// Get the default model for this provider
    fn default_model(&self) -> &str;

    /// Get the embedding dimensions for a model
    fn dimensions(&self, model: &str) -> Option<usize>;
}

/// Embed a whole conversation into one unit-length vector.
///
/// Any failure, including an empty conversation or an empty provider
/// response, is reported as `EmbeddingUnavailable`.
pub async fn embed_conversation(
    provider: &dyn EmbeddingProvider,
    model: &str,
    messages: &[Message],
) -> Result<Vec<f32>, DomainError> {
    let text = conversation_text(messages);

    if text.is_empty() {
        return Err(DomainError::embedding_unavailable(
            "conversation has no text content to embed",
        ));
    }

    let response = provider
        .embed(EmbeddingRequest::new(model, text))
        .await
        .map_err(|e| match e {
            DomainError::EmbeddingUnavailable { .. } => e,
            other => DomainError::embedding_unavailable(other.to_string()),
        })?;

    let mut vector = response
        .into_first()
        .map(|e| e.into_vector())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            DomainError::embedding_unavailable(format!(
                "provider '{}' returned no embedding",
                provider.provider_name()
            ))
        })?;

    let norm = l2_normalize(&mut vector);

    if !norm.is_finite() || norm <= f32::EPSILON {
        return Err(DomainError::embedding_unavailable(format!(
            "provider '{}' returned a zero or non-finite vector",
            provider.provider_name()
        )));
    }

    Ok(vector)
}
