//! In-process ONNX sentence embedder.
//!
//! Runs a BERT-style sentence-transformers model (all-MiniLM-L6-v2 by
//! default, 384 dimensions) with mean pooling over the attention mask.
//! Model and tokenizer files are fetched from the Hugging Face hub on
//! first use and cached locally. The session itself is only compiled with
//! the `local-embeddings` feature.

use crate::domain::DomainError;

/// Hub repository used when `embedding.model` is not set
pub const DEFAULT_LOCAL_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Output width of the default model
pub const LOCAL_EMBEDDING_DIMENSIONS: usize = 384;

/// Longer inputs are truncated by the tokenizer
#[cfg_attr(not(feature = "local-embeddings"), allow(dead_code))]
const MAX_SEQUENCE_TOKENS: usize = 256;

/// Validate a `(batch, seq_len, hidden)` output shape and return `hidden`
#[cfg_attr(not(feature = "local-embeddings"), allow(dead_code))]
pub(crate) fn hidden_size(shape: &[i64], expected: usize) -> Result<usize, DomainError> {
    match shape {
        [1, _, hidden] if *hidden as usize == expected => Ok(expected),
        _ => Err(DomainError::embedding_unavailable(format!(
            "unexpected model output shape {:?}, expected [1, seq_len, {}]",
            shape, expected
        ))),
    }
}

/// Average token embeddings, counting only positions the mask keeps
#[cfg_attr(not(feature = "local-embeddings"), allow(dead_code))]
pub(crate) fn mean_pool(hidden: &[f32], hidden_dim: usize, attention_mask: &[u32]) -> Vec<f32> {
    let mut pooled = vec![0.0f32; hidden_dim];

    for (token, chunk) in hidden.chunks(hidden_dim).enumerate() {
        let mask = attention_mask.get(token).copied().unwrap_or(0) as f32;
        if mask == 0.0 {
            continue;
        }

        for (value, x) in pooled.iter_mut().zip(chunk) {
            *value += x * mask;
        }
    }

    let mask_sum = attention_mask
        .iter()
        .map(|&m| m as f32)
        .sum::<f32>()
        .max(1e-9);

    for value in pooled.iter_mut() {
        *value /= mask_sum;
    }

    pooled
}

#[cfg(feature = "local-embeddings")]
pub use engine::LocalEmbeddingProvider;

#[cfg(feature = "local-embeddings")]
mod engine {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use hf_hub::api::sync::Api;
    use ort::inputs;
    use ort::session::builder::GraphOptimizationLevel;
    use ort::session::Session;
    use ort::value::Tensor;
    use tokenizers::{Tokenizer, TruncationParams};
    use tracing::info;

    use super::{hidden_size, mean_pool, LOCAL_EMBEDDING_DIMENSIONS, MAX_SEQUENCE_TOKENS};
    use crate::domain::embedding::{
        l2_normalize, Embedding, EmbeddingProvider, EmbeddingRequest, EmbeddingResponse,
        EmbeddingUsage,
    };
    use crate::domain::DomainError;

    struct Engine {
        session: Mutex<Session>,
        tokenizer: Tokenizer,
    }

    impl Engine {
        fn embed(&self, text: &str) -> Result<(Vec<f32>, u32), DomainError> {
            let encoding = self
                .tokenizer
                .encode(text, true)
                .map_err(|e| DomainError::embedding_unavailable(format!("tokenizer: {}", e)))?;

            let attention_mask = encoding.get_attention_mask();
            let seq_len = encoding.get_ids().len();
            if seq_len == 0 {
                return Err(DomainError::embedding_unavailable(
                    "tokenizer produced no tokens",
                ));
            }

            let ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();
            let mask: Vec<i64> = attention_mask.iter().map(|&m| m as i64).collect();
            let type_ids = vec![0i64; seq_len];

            let tensor = |values: Vec<i64>| {
                Tensor::from_array(([1usize, seq_len], values))
                    .map_err(|e| DomainError::embedding_unavailable(format!("onnx input: {}", e)))
            };
            let ids = tensor(ids)?;
            let mask = tensor(mask)?;
            let type_ids = tensor(type_ids)?;

            let mut session = self
                .session
                .lock()
                .map_err(|_| DomainError::embedding_unavailable("onnx session lock poisoned"))?;

            let outputs = session
                .run(inputs![
                    "input_ids" => ids,
                    "attention_mask" => mask,
                    "token_type_ids" => type_ids
                ])
                .map_err(|e| DomainError::embedding_unavailable(format!("onnx run: {}", e)))?;

            let (shape, data) = outputs
                .get("last_hidden_state")
                .or_else(|| outputs.get("token_embeddings"))
                .ok_or_else(|| {
                    DomainError::embedding_unavailable("model has no token embedding output")
                })?
                .try_extract_tensor::<f32>()
                .map_err(|e| DomainError::embedding_unavailable(format!("onnx output: {}", e)))?;

            let hidden = hidden_size(shape, LOCAL_EMBEDDING_DIMENSIONS)?;
            let mut pooled = mean_pool(data, hidden, attention_mask);
            l2_normalize(&mut pooled);

            Ok((pooled, seq_len as u32))
        }
    }

    /// Embedding provider that runs the model in process
    pub struct LocalEmbeddingProvider {
        model: String,
        engine: Arc<Engine>,
    }

    impl std::fmt::Debug for LocalEmbeddingProvider {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("LocalEmbeddingProvider")
                .field("model", &self.model)
                .finish()
        }
    }

    impl LocalEmbeddingProvider {
        /// Fetch (or reuse the cached) model and tokenizer, then open the
        /// ONNX session. Blocks while downloading.
        pub fn load(model_id: &str) -> Result<Self, DomainError> {
            let hub = |e: hf_hub::api::sync::ApiError| {
                DomainError::configuration(format!("model '{}': {}", model_id, e))
            };

            let api = Api::new().map_err(hub)?;
            let repo = api.model(model_id.to_string());

            let model_path = repo
                .get("onnx/model.onnx")
                .or_else(|_| repo.get("model.onnx"))
                .map_err(hub)?;
            let tokenizer_path = repo.get("tokenizer.json").map_err(hub)?;

            let mut tokenizer = Tokenizer::from_file(tokenizer_path)
                .map_err(|e| DomainError::configuration(format!("tokenizer: {}", e)))?;
            tokenizer
                .with_padding(None)
                .with_truncation(Some(TruncationParams {
                    max_length: MAX_SEQUENCE_TOKENS,
                    ..Default::default()
                }))
                .map_err(|e| DomainError::configuration(format!("tokenizer: {}", e)))?;

            let session = Session::builder()
                .map_err(|e| DomainError::configuration(format!("onnx session: {}", e)))?
                .with_optimization_level(GraphOptimizationLevel::Level1)
                .map_err(|e| DomainError::configuration(format!("onnx session: {}", e)))?
                .commit_from_file(&model_path)
                .map_err(|e| DomainError::configuration(format!("onnx session: {}", e)))?;

            info!(model = %model_id, "Loaded local embedding model");

            Ok(Self {
                model: model_id.to_string(),
                engine: Arc::new(Engine {
                    session: Mutex::new(session),
                    tokenizer,
                }),
            })
        }
    }

    #[async_trait]
    impl EmbeddingProvider for LocalEmbeddingProvider {
        async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, DomainError> {
            let engine = Arc::clone(&self.engine);
            let text = request.input().to_string();

            let (vector, tokens) = tokio::task::spawn_blocking(move || engine.embed(&text))
                .await
                .map_err(|e| DomainError::embedding_unavailable(format!("embed task: {}", e)))??;

            Ok(EmbeddingResponse::new(
                self.model.clone(),
                vec![Embedding::new(0, vector)],
                EmbeddingUsage::new(tokens, tokens),
            ))
        }

        fn provider_name(&self) -> &'static str {
            "local"
        }

        fn default_model(&self) -> &str {
            &self.model
        }

        fn dimensions(&self, _model: &str) -> Option<usize> {
            Some(LOCAL_EMBEDDING_DIMENSIONS)
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_pool_ignores_masked_tokens() {
        let hidden = vec![1.0, 2.0, 3.0, 4.0, 100.0, 100.0];

        let pooled = mean_pool(&hidden, 2, &[1, 1, 0]);

        assert_eq!(pooled, vec![2.0, 3.0]);
    }

    #[test]
    fn test_mean_pool_empty_mask_is_zero() {
        let pooled = mean_pool(&[5.0, 5.0], 2, &[0]);

        assert_eq!(pooled, vec![0.0, 0.0]);
    }

    #[test]
    fn test_hidden_size_accepts_expected_shape() {
        assert_eq!(hidden_size(&[1, 7, 384], 384).unwrap(), 384);
    }

    #[test]
    fn test_hidden_size_rejects_batch_or_width_mismatch() {
        assert!(hidden_size(&[2, 7, 384], 384).is_err());
        assert!(hidden_size(&[1, 7, 768], 384).is_err());
        assert!(hidden_size(&[1, 384], 384).is_err());
    }
}
