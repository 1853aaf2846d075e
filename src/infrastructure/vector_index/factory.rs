use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::info;

use super::{FlatIndex, MilvusConfig, MilvusIndex};
use crate::domain::semantic_cache::VectorIndex;
use crate::domain::DomainError;
use crate::infrastructure::http::HttpClient;

/// Which index backend to build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum VectorIndexBackend {
    #[default]
    Flat,
    Milvus,
}

/// Vector index configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VectorIndexConfig {
    pub backend: VectorIndexBackend,
    /// Snapshot directory for the flat backend
    pub data_dir: Option<PathBuf>,
    /// Set to false to keep the flat index purely in memory
    pub persist: bool,
    pub milvus: MilvusConfig,
}

impl Default for VectorIndexConfig {
    fn default() -> Self {
        Self {
            backend: VectorIndexBackend::Flat,
            data_dir: Some(PathBuf::from("data/semantic_cache")),
            persist: true,
            milvus: MilvusConfig::default(),
        }
    }
}

/// Factory for creating vector index backends
#[derive(Debug)]
pub struct VectorIndexFactory;

impl VectorIndexFactory {
    /// Build and initialise the configured backend. `dimensions` is the
    /// embedder's output size.
    pub async fn create(
        config: &VectorIndexConfig,
        dimensions: usize,
    ) -> Result<Arc<dyn VectorIndex>, DomainError> {
        match config.backend {
            VectorIndexBackend::Flat => match config.data_dir.as_ref().filter(|_| config.persist) {
                Some(dir) => {
                    info!(path = %dir.display(), dimensions, "Opening flat vector index");
                    Ok(Arc::new(FlatIndex::open(dimensions, dir).await?))
                }
                None => {
                    info!(dimensions, "Using in-memory flat vector index");
                    Ok(Arc::new(FlatIndex::in_memory(dimensions)))
                }
            },

            VectorIndexBackend::Milvus => {
                let http_client = HttpClient::with_timeout(Duration::from_secs(
                    config.milvus.timeout_secs.max(1),
                ))
                .map_err(|e| DomainError::configuration(e.to_string()))?;

                let index = MilvusIndex::new(http_client, &config.milvus, dimensions);

                info!(
                    url = %config.milvus.url,
                    collection = %config.milvus.collection,
                    "Connecting to Milvus vector index"
                );
                index.ensure_collection().await?;

                Ok(Arc::new(index))
            }
        }
    }
}
