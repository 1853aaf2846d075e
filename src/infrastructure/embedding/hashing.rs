//! In-process feature-hashing embedding provider

use async_trait::async_trait;

use crate::domain::embedding::{
    l2_normalize, Embedding, EmbeddingProvider, EmbeddingRequest, EmbeddingResponse,
    EmbeddingUsage,
};
use crate::domain::DomainError;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

pub const DEFAULT_HASHING_DIMENSIONS: usize = 384;

/// Bag-of-words embedder that hashes lower-cased tokens into signed buckets.
///
/// Needs no model download and is stable across processes and platforms,
/// which keeps persisted snapshots valid between restarts. Texts sharing
/// vocabulary score close to each other; paraphrases do not.
#[derive(Debug, Clone)]
pub struct HashingEmbeddingProvider {
    dimensions: usize,
}

impl HashingEmbeddingProvider {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    fn fnv1a(token: &str) -> u64 {
        token.bytes().fold(FNV_OFFSET, |hash, b| {
            (hash ^ u64::from(b)).wrapping_mul(FNV_PRIME)
        })
    }

    fn vectorize(&self, text: &str) -> (Vec<f32>, u32) {
        let mut vector = vec![0.0f32; self.dimensions];
        let mut tokens = 0u32;

        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let hash = Self::fnv1a(&token.to_lowercase());
            let bucket = (hash % self.dimensions as u64) as usize;
            let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };

            vector[bucket] += sign;
            tokens += 1;
        }

        l2_normalize(&mut vector);

        (vector, tokens)
    }
}

impl Default for HashingEmbeddingProvider {
    fn default() -> Self {
        Self::new(DEFAULT_HASHING_DIMENSIONS)
    }
}

#[async_trait]
impl EmbeddingProvider for HashingEmbeddingProvider {
    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, DomainError> {
        let (vector, tokens) = self.vectorize(request.input());

        if tokens == 0 {
            return Err(DomainError::embedding_unavailable(
                "input contains no tokens to embed",
            ));
        }

        Ok(EmbeddingResponse::new(
            request.model().to_string(),
            vec![Embedding::new(0, vector)],
            EmbeddingUsage::new(tokens, tokens),
        ))
    }

    fn provider_name(&self) -> &'static str {
        "hashing"
    }

    fn default_model(&self) -> &str {
        "feature-hashing"
    }

    fn dimensions(&self, _model: &str) -> Option<usize> {
        Some(self.dimensions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::embedding::inner_product;

    async fn embed(provider: &HashingEmbeddingProvider, text: &str) -> Vec<f32> {
        provider
            .embed(EmbeddingRequest::new("feature-hashing", text))
            .await
            .unwrap()
            .into_first()
            .unwrap()
            .into_vector()
    }

    #[test]
    fn test_fnv1a_known_value() {
        // Reference value of 64-bit FNV-1a for "a"
        assert_eq!(HashingEmbeddingProvider::fnv1a("a"), 0xaf63_dc4c_8601_ec8c);
    }

    #[tokio::test]
    async fn test_identical_text_scores_one() {
        let provider = HashingEmbeddingProvider::default();

        let a = embed(&provider, "What is 2+2?").await;
        let b = embed(&provider, "What is 2+2?").await;

        assert_eq!(a.len(), DEFAULT_HASHING_DIMENSIONS);
        assert!((inner_product(&a, &b) - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_case_and_punctuation_insensitive() {
        let provider = HashingEmbeddingProvider::new(128);

        let a = embed(&provider, "Capital of France?").await;
        let b = embed(&provider, "capital of france").await;

        assert!((inner_product(&a, &b) - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_overlap_ranks_above_unrelated() {
        let provider = HashingEmbeddingProvider::default();

        let query = embed(&provider, "what is the capital of france").await;
        let close = embed(&provider, "tell me the capital of france").await;
        let far = embed(&provider, "population of tokyo in 2020").await;

        assert!(inner_product(&query, &close) > inner_product(&query, &far));
    }

    #[tokio::test]
    async fn test_no_tokens_is_unavailable() {
        let provider = HashingEmbeddingProvider::default();

        let result = provider.embed(EmbeddingRequest::new("m", "?!  ")).await;

        assert!(matches!(
            result,
            Err(DomainError::EmbeddingUnavailable { .. })
        ));
    }

    #[test]
    fn test_zero_dimensions_clamped() {
        let provider = HashingEmbeddingProvider::new(0);
        assert_eq!(provider.dimensions("any"), Some(1));
    }
}
