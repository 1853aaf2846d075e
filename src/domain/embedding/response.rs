//! Embedding response types

use serde::{Deserialize, Serialize};

/// A single embedding vector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Embedding {
    /// Index of this embedding in the batch
    index: usize,
    /// The embedding vector
    embedding: Vec<f32>,
}

impl Embedding {
    pub fn new(index: usize, embedding: Vec<f32>) -> Self {
        Self { index, embedding }
    }

    /// Consume and return the vector
    pub fn into_vector(self) -> Vec<f32> {
        self.embedding
    }
}

/// Usage statistics for embedding request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmbeddingUsage {
    prompt_tokens: u32,
    total_tokens: u32,
}

impl EmbeddingUsage {
    pub fn new(prompt_tokens: u32, total_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            total_tokens,
        }
    }
}

/// Response from an embedding request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingResponse {
    model: String,
    data: Vec<Embedding>,
    usage: EmbeddingUsage,
}

impl EmbeddingResponse {
    pub fn new(model: String, data: Vec<Embedding>, usage: EmbeddingUsage) -> Self {
        Self { model, data, usage }
    }

    /// Consume the response and return the first embedding, if any
    pub fn into_first(self) -> Option<Embedding> {
        self.data.into_iter().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_first_takes_batch_head() {
        let embeddings = vec![
            Embedding::new(0, vec![0.1, 0.2]),
            Embedding::new(1, vec![0.3, 0.4]),
        ];
        let response =
            EmbeddingResponse::new("test-model".into(), embeddings, EmbeddingUsage::new(10, 10));

        assert_eq!(response.into_first().unwrap().into_vector(), vec![0.1, 0.2]);
    }

    #[test]
    fn test_into_first_empty_batch() {
        let response = EmbeddingResponse::new("m".into(), vec![], EmbeddingUsage::default());

        assert!(response.into_first().is_none());
    }

    #[test]
    fn test_deserialize_openai_shape() {
        let response: EmbeddingResponse = serde_json::from_str(
            r#"{"model": "m", "data": [{"index": 0, "embedding": [0.5, 0.5]}],
                "usage": {"prompt_tokens": 3, "total_tokens": 3}}"#,
        )
        .unwrap();

        assert_eq!(response.into_first().unwrap().into_vector(), vec![0.5, 0.5]);
    }
}
