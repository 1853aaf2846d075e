//! Semantic cache engine
//!
//! Composes the embedder, the vector index and the pending operation
//! registry into the single-call and two-phase cache operations.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::chat::{Message, Usage};
use crate::domain::embedding::{embed_conversation, EmbeddingProvider};
use crate::domain::model_selection::{ModelSelectionRequest, ModelSelectionResponse, ModelSelector};
use crate::domain::semantic_cache::{
    CacheEntry, PendingOperation, PendingOperationRegistry, SemanticCacheConfig, SimilarityMatch,
    VectorIndex,
};
use crate::domain::{Capabilities, DomainError};
use crate::infrastructure::observability::{
    record_cache_lookup, record_cache_store, record_embedding_duration, set_pending_operations,
    LookupOutcome,
};

/// Result of a store. Store failures are reported here, never as `Err`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StoreOutcome {
    pub fn stored() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Counters and sizes exposed for diagnostics
#[derive(Debug, Clone, Serialize)]
pub struct SemanticCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub stores: u64,
    pub store_failures: u64,
    pub entries: usize,
    pub pending_operations: usize,
    pub index_backend: &'static str,
    pub embedding_provider: &'static str,
}

/// The semantic cache engine
#[derive(Debug)]
pub struct SemanticCacheService {
    index: Arc<dyn VectorIndex>,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    pending: Arc<dyn PendingOperationRegistry>,
    model_selector: Option<Arc<dyn ModelSelector>>,
    config: SemanticCacheConfig,
    embedding_model: String,
    hits: AtomicU64,
    misses: AtomicU64,
    stores: AtomicU64,
    store_failures: AtomicU64,
}

impl SemanticCacheService {
    pub fn new(
        index: Arc<dyn VectorIndex>,
        embedding_provider: Arc<dyn EmbeddingProvider>,
        pending: Arc<dyn PendingOperationRegistry>,
    ) -> Self {
        Self::with_config(index, embedding_provider, pending, SemanticCacheConfig::default())
    }

    pub fn with_config(
        index: Arc<dyn VectorIndex>,
        embedding_provider: Arc<dyn EmbeddingProvider>,
        pending: Arc<dyn PendingOperationRegistry>,
        config: SemanticCacheConfig,
    ) -> Self {
        let embedding_model = embedding_provider.default_model().to_string();

        Self {
            index,
            embedding_provider,
            pending,
            model_selector: None,
            config,
            embedding_model,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            stores: AtomicU64::new(0),
            store_failures: AtomicU64::new(0),
        }
    }

    /// Attach a model selection client; enables `select_model`
    pub fn with_model_selector(mut self, selector: Arc<dyn ModelSelector>) -> Self {
        self.model_selector = Some(selector);
        self
    }

    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.index
    }

    fn resolve_model(&self, model: &str) -> Result<String, DomainError> {
        let model = model.trim();

        if !model.is_empty() {
            return Ok(model.to_string());
        }

        self.config
            .default_model
            .clone()
            .filter(|m| !m.is_empty())
            .ok_or_else(|| DomainError::validation("model is required"))
    }

    fn resolve_threshold(&self, threshold: Option<f32>) -> Result<f32, DomainError> {
        let threshold = threshold.unwrap_or(self.config.default_similarity_threshold);

        if !threshold.is_finite() {
            return Err(DomainError::validation(
                "similarity_threshold must be a finite number",
            ));
        }

        Ok(threshold)
    }

    fn ensure_stateful(&self) -> Result<(), DomainError> {
        if !self.config.stateful_enabled {
            return Err(DomainError::validation(
                "stateful semantic cache operations are disabled",
            ));
        }
        Ok(())
    }

    async fn embed(&self, messages: &[Message]) -> Result<Vec<f32>, DomainError> {
        let started = Instant::now();
        let result =
            embed_conversation(self.embedding_provider.as_ref(), &self.embedding_model, messages)
                .await;

        record_embedding_duration(self.embedding_provider.provider_name(), started.elapsed());

        result
    }

    async fn lookup(
        &self,
        operation: &'static str,
        embedding: &[f32],
        model: &str,
        threshold: f32,
    ) -> Result<Option<SimilarityMatch>, DomainError> {
        match self.index.search(embedding, model, threshold).await {
            Ok(Some(hit)) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                record_cache_lookup(operation, LookupOutcome::Hit);
                debug!(
                    model,
                    score = hit.similarity_score,
                    threshold,
                    "Semantic cache hit"
                );
                Ok(Some(hit))
            }
            Ok(None) => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                record_cache_lookup(operation, LookupOutcome::Miss);
                debug!(model, threshold, "Semantic cache miss");
                Ok(None)
            }
            Err(e) => {
                record_cache_lookup(operation, LookupOutcome::Error);
                warn!(model, error = %e, "Semantic cache search failed");
                Err(e)
            }
        }
    }

    async fn persist(&self, operation: &'static str, entry: CacheEntry) -> StoreOutcome {
        let model = entry.model().to_string();

        match self.index.store(entry).await {
            Ok(()) => {
                self.stores.fetch_add(1, Ordering::Relaxed);
                record_cache_store(operation, true);
                debug!(model = %model, operation, "Stored semantic cache entry");
                StoreOutcome::stored()
            }
            Err(e) => self.store_failed(operation, e),
        }
    }

    fn store_failed(&self, operation: &'static str, error: DomainError) -> StoreOutcome {
        self.store_failures.fetch_add(1, Ordering::Relaxed);
        record_cache_store(operation, false);
        warn!(operation, error = %error, "Semantic cache store failed");
        StoreOutcome::failed(error.to_string())
    }

    async fn publish_pending(&self) {
        set_pending_operations(self.pending.len().await);
    }

    /// Look up a cached answer for this conversation
    pub async fn search_cache(
        &self,
        messages: &[Message],
        model: &str,
        similarity_threshold: Option<f32>,
    ) -> Result<Option<SimilarityMatch>, DomainError> {
        let outcome = async {
            let model = self.resolve_model(model)?;
            let threshold = self.resolve_threshold(similarity_threshold)?;
            let embedding = self.embed(messages).await?;
            Ok::<_, DomainError>((model, threshold, embedding))
        }
        .await;

        match outcome {
            Ok((model, threshold, embedding)) => {
                self.lookup("search", &embedding, &model, threshold).await
            }
            Err(e) => {
                record_cache_lookup("search", LookupOutcome::Error);
                Err(e)
            }
        }
    }

    /// Embed and store a completed exchange
    pub async fn store_chat(
        &self,
        request_messages: Vec<Message>,
        response_messages: Vec<Message>,
        model: &str,
        usage: Usage,
        ttl_secs: Option<u64>,
    ) -> StoreOutcome {
        let model = match self.resolve_model(model) {
            Ok(model) => model,
            Err(e) => return self.store_failed("store", e),
        };

        let embedding = match self.embed(&request_messages).await {
            Ok(embedding) => embedding,
            Err(e) => return self.store_failed("store", e),
        };

        let entry = CacheEntry::new(embedding, request_messages, response_messages, model, usage)
            .with_ttl_secs(Some(ttl_secs.unwrap_or(self.config.default_ttl_secs)));

        self.persist("store", entry).await
    }

    /// Embed now, search later. Returns the token for `complete_cache_search`.
    pub async fn initiate_cache_search(
        &self,
        messages: &[Message],
        model: &str,
        similarity_threshold: Option<f32>,
    ) -> Result<String, DomainError> {
        self.ensure_stateful()?;

        let model = self.resolve_model(model)?;
        let similarity_threshold = self.resolve_threshold(similarity_threshold)?;
        let embedding = self.embed(messages).await?;

        let token = self
            .pending
            .put(PendingOperation::Search {
                embedding,
                model,
                similarity_threshold,
            })
            .await?;

        self.publish_pending().await;
        debug!(request_id = %token, "Initiated cache search");

        Ok(token)
    }

    /// Finish a search started by `initiate_cache_search`
    pub async fn complete_cache_search(
        &self,
        request_id: &str,
    ) -> Result<Option<SimilarityMatch>, DomainError> {
        let operation = self.pending.take(request_id).await?;
        self.publish_pending().await;

        match operation {
            Some(PendingOperation::Search {
                embedding,
                model,
                similarity_threshold,
            }) => {
                self.lookup("complete_search", &embedding, &model, similarity_threshold)
                    .await
            }
            other => {
                if let Some(op) = other {
                    warn!(request_id, kind = op.kind(), "Token belongs to another operation");
                }
                record_cache_lookup("complete_search", LookupOutcome::InvalidToken);
                Err(DomainError::invalid_token(request_id))
            }
        }
    }

    /// Park the request half of an exchange until its response arrives
    pub async fn initiate_cache_store(
        &self,
        request_messages: Vec<Message>,
        model: &str,
    ) -> Result<String, DomainError> {
        self.ensure_stateful()?;

        let model = self.resolve_model(model)?;
        let embedding = self.embed(&request_messages).await?;

        let token = self
            .pending
            .put(PendingOperation::Store {
                embedding,
                request_messages,
                model,
            })
            .await?;

        self.publish_pending().await;
        debug!(request_id = %token, "Initiated cache store");

        Ok(token)
    }

    /// Attach the response to a parked request and store the entry
    pub async fn complete_cache_store(
        &self,
        request_id: &str,
        response_messages: Vec<Message>,
        usage: Usage,
    ) -> StoreOutcome {
        let operation = match self.pending.take(request_id).await {
            Ok(operation) => operation,
            Err(e) => return self.store_failed("complete_store", e),
        };
        self.publish_pending().await;

        match operation {
            Some(PendingOperation::Store {
                embedding,
                request_messages,
                model,
            }) => {
                let entry =
                    CacheEntry::new(embedding, request_messages, response_messages, model, usage)
                        .with_ttl_secs(Some(self.config.default_ttl_secs));

                self.persist("complete_store", entry).await
            }
            other => {
                if let Some(op) = other {
                    warn!(request_id, kind = op.kind(), "Token belongs to another operation");
                }
                self.store_failures.fetch_add(1, Ordering::Relaxed);
                record_cache_store("complete_store", false);
                StoreOutcome::failed("unknown or expired token")
            }
        }
    }

    /// Forward a routing decision to the model selection service
    pub async fn select_model(
        &self,
        request: &ModelSelectionRequest,
    ) -> Result<ModelSelectionResponse, DomainError> {
        let selector = self
            .model_selector
            .as_ref()
            .ok_or_else(|| DomainError::validation("model selection is not configured"))?;

        let response = selector.select_model(request).await?;
        info!(selected_model = %response.selected_model, "Model selected");

        Ok(response)
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            stateless_semantic_cache_supported: true,
            stateful_semantic_cache_supported: self.config.stateful_enabled,
            model_selection_supported: self.model_selector.is_some(),
            immediate_response_supported: true,
        }
    }

    pub async fn stats(&self) -> Result<SemanticCacheStats, DomainError> {
        Ok(SemanticCacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            stores: self.stores.load(Ordering::Relaxed),
            store_failures: self.store_failures.load(Ordering::Relaxed),
            entries: self.index.len().await?,
            pending_operations: self.pending.len().await,
            index_backend: self.index.backend_name(),
            embedding_provider: self.embedding_provider.provider_name(),
        })
    }
}

/// Trait for semantic cache operations, as consumed by the API layer
#[async_trait]
pub trait SemanticCacheServiceTrait: Send + Sync + std::fmt::Debug {
    async fn search_cache(
        &self,
        messages: &[Message],
        model: &str,
        similarity_threshold: Option<f32>,
    ) -> Result<Option<SimilarityMatch>, DomainError>;

    async fn store_chat(
        &self,
        request_messages: Vec<Message>,
        response_messages: Vec<Message>,
        model: &str,
        usage: Usage,
        ttl_secs: Option<u64>,
    ) -> StoreOutcome;

    async fn initiate_cache_search(
        &self,
        messages: &[Message],
        model: &str,
        similarity_threshold: Option<f32>,
    ) -> Result<String, DomainError>;

    async fn complete_cache_search(
        &self,
        request_id: &str,
    ) -> Result<Option<SimilarityMatch>, DomainError>;

    async fn initiate_cache_store(
        &self,
        request_messages: Vec<Message>,
        model: &str,
    ) -> Result<String, DomainError>;

    async fn complete_cache_store(
        &self,
        request_id: &str,
        response_messages: Vec<Message>,
        usage: Usage,
    ) -> StoreOutcome;

    async fn select_model(
        &self,
        request: &ModelSelectionRequest,
    ) -> Result<ModelSelectionResponse, DomainError>;

    fn capabilities(&self) -> Capabilities;

    async fn stats(&self) -> Result<SemanticCacheStats, DomainError>;

    /// Entry count of the backing index; used by readiness checks
    async fn index_len(&self) -> Result<usize, DomainError>;
}

#[async_trait]
impl SemanticCacheServiceTrait for SemanticCacheService {
    async fn search_cache(
        &self,
        messages: &[Message],
        model: &str,
        similarity_threshold: Option<f32>,
    ) -> Result<Option<SimilarityMatch>, DomainError> {
        SemanticCacheService::search_cache(self, messages, model, similarity_threshold).await
    }

    async fn store_chat(
        &self,
        request_messages: Vec<Message>,
        response_messages: Vec<Message>,
        model: &str,
        usage: Usage,
        ttl_secs: Option<u64>,
    ) -> StoreOutcome {
        SemanticCacheService::store_chat(
            self,
            request_messages,
            response_messages,
            model,
            usage,
            ttl_secs,
        )
        .await
    }

    async fn initiate_cache_search(
        &self,
        messages: &[Message],
        model: &str,
        similarity_threshold: Option<f32>,
    ) -> Result<String, DomainError> {
        SemanticCacheService::initiate_cache_search(self, messages, model, similarity_threshold)
            .await
    }

    async fn complete_cache_search(
        &self,
        request_id: &str,
    ) -> Result<Option<SimilarityMatch>, DomainError> {
        SemanticCacheService::complete_cache_search(self, request_id).await
    }

    async fn initiate_cache_store(
        &self,
        request_messages: Vec<Message>,
        model: &str,
    ) -> Result<String, DomainError> {
        SemanticCacheService::initiate_cache_store(self, request_messages, model).await
    }

    async fn complete_cache_store(
        &self,
        request_id: &str,
        response_messages: Vec<Message>,
        usage: Usage,
    ) -> StoreOutcome {
        SemanticCacheService::complete_cache_store(self, request_id, response_messages, usage)
            .await
    }

    async fn select_model(
        &self,
        request: &ModelSelectionRequest,
    ) -> Result<ModelSelectionResponse, DomainError> {
        SemanticCacheService::select_model(self, request).await
    }

    fn capabilities(&self) -> Capabilities {
        SemanticCacheService::capabilities(self)
    }

    async fn stats(&self) -> Result<SemanticCacheStats, DomainError> {
        SemanticCacheService::stats(self).await
    }

    async fn index_len(&self) -> Result<usize, DomainError> {
        self.index.len().await
    }
}
