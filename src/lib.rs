//! LLM Semantic Cache
//!
//! Answers repeated LLM conversations from a vector index of earlier
//! exchanges:
//! - Embedding-similarity lookup gated by model
//! - Single-call and two-phase (initiate/complete) search and store
//! - Flat in-process or Milvus-backed index
//! - Optional forwarding to an external model selection service

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::info;

use api::state::AppState;
use infrastructure::{
    embedding::EmbeddingProviderFactory,
    http::HttpClient,
    model_selection::HttpModelSelector,
    pending::{InMemoryPendingRegistry, PendingRegistryConfig},
    services::SemanticCacheService,
    vector_index::VectorIndexFactory,
};

/// Application state plus the pending registry, whose sweeper the caller
/// owns
pub struct AppComponents {
    pub state: AppState,
    pub pending: Arc<InMemoryPendingRegistry>,
}

/// Create the application state with custom configuration
pub async fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppComponents> {
    let embedding_provider = EmbeddingProviderFactory::create(&config.embedding)
        .context("failed to create embedding provider")?;

    let dimensions = config
        .embedding
        .dimensions
        .or_else(|| embedding_provider.dimensions(embedding_provider.default_model()))
        .context(
            "embedding dimensions are unknown for this model; set embedding.dimensions",
        )?;

    let index = VectorIndexFactory::create(&config.vector_index, dimensions)
        .await
        .context("failed to initialise vector index")?;

    let cache_config = config.semantic_cache.clone();
    let pending = Arc::new(InMemoryPendingRegistry::with_config(PendingRegistryConfig {
        ttl: cache_config.pending_ttl(),
        max_capacity: cache_config.pending_max_capacity,
    }));

    info!(
        embedding_provider = embedding_provider.provider_name(),
        index_backend = index.backend_name(),
        dimensions,
        threshold = cache_config.default_similarity_threshold,
        stateful = cache_config.stateful_enabled,
        "Semantic cache configured"
    );

    let mut service =
        SemanticCacheService::with_config(index, embedding_provider, pending.clone(), cache_config);

    if let Some(ref url) = config.model_selection.url {
        let client = HttpClient::with_timeout(Duration::from_secs(30))
            .context("failed to create model selection client")?;
        let selector = HttpModelSelector::new(client, url).with_default_models(
            config.model_selection.simple_models.clone(),
            config.model_selection.strong_models.clone(),
        );

        info!(url = %url, "Model selection enabled");
        service = service.with_model_selector(Arc::new(selector));
    }

    Ok(AppComponents {
        state: AppState::new(Arc::new(service)),
        pending,
    })
}
