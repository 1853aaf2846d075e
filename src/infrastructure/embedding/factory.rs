use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use super::{
    HashingEmbeddingProvider, OpenAiEmbeddingProvider, DEFAULT_HASHING_DIMENSIONS,
    DEFAULT_LOCAL_MODEL, LOCAL_EMBEDDING_DIMENSIONS,
};
use crate::domain::embedding::EmbeddingProvider;
use crate::domain::DomainError;
use crate::infrastructure::http::HttpClient;

/// Which embedding backend to build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProviderKind {
    #[default]
    Hashing,
    OpenAi,
    /// In-process ONNX model, needs the `local-embeddings` feature
    Local,
}

/// Embedding provider configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProviderKind,
    /// Output dimension; for OpenAI-compatible servers this is forwarded
    /// as the `dimensions` request field when set
    pub dimensions: Option<usize>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProviderKind::Hashing,
            dimensions: None,
            model: None,
            base_url: None,
            api_key: None,
            timeout_secs: 10,
        }
    }
}

/// Factory for creating embedding providers
#[derive(Debug)]
pub struct EmbeddingProviderFactory;

impl EmbeddingProviderFactory {
    pub fn create(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingProvider>, DomainError> {
        if config.dimensions == Some(0) {
            return Err(DomainError::configuration(
                "embedding.dimensions must be greater than zero",
            ));
        }

        match config.provider {
            EmbeddingProviderKind::Hashing => {
                let dims = config.dimensions.unwrap_or(DEFAULT_HASHING_DIMENSIONS);
                Ok(Arc::new(HashingEmbeddingProvider::new(dims)))
            }

            EmbeddingProviderKind::OpenAi => {
                let http_client = HttpClient::with_timeout(Duration::from_secs(
                    config.timeout_secs.max(1),
                ))
                .map_err(|e| DomainError::configuration(e.to_string()))?;

                let mut provider = match config.base_url.as_deref() {
                    Some(base_url) => OpenAiEmbeddingProvider::with_base_url(
                        http_client,
                        config.api_key.clone(),
                        base_url,
                    ),
                    None => {
                        let api_key = config.api_key.clone().ok_or_else(|| {
                            DomainError::configuration(
                                "embedding.api_key is required for the OpenAI API",
                            )
                        })?;
                        OpenAiEmbeddingProvider::new(http_client, api_key)
                    }
                };

                if let Some(ref model) = config.model {
                    provider = provider.with_model(model);
                }
                if let Some(dims) = config.dimensions {
                    provider = provider.with_dimensions(dims);
                }

                Ok(Arc::new(provider))
            }

            EmbeddingProviderKind::Local => Self::create_local(config),
        }
    }

    fn create_local(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingProvider>, DomainError> {
        if let Some(dims) = config.dimensions.filter(|d| *d != LOCAL_EMBEDDING_DIMENSIONS) {
            return Err(DomainError::configuration(format!(
                "local embedding model produces {} dimensions, embedding.dimensions is {}",
                LOCAL_EMBEDDING_DIMENSIONS, dims
            )));
        }

        let model = config.model.as_deref().unwrap_or(DEFAULT_LOCAL_MODEL);

        #[cfg(feature = "local-embeddings")]
        {
            Ok(Arc::new(super::LocalEmbeddingProvider::load(model)?))
        }

        #[cfg(not(feature = "local-embeddings"))]
        {
            Err(DomainError::configuration(format!(
                "embedding provider 'local' (model '{}') requires building with the local-embeddings feature",
                model
            )))
        }
    }
}
