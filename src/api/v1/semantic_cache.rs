//! Semantic cache endpoint handlers

use axum::extract::State;
use tracing::{debug, info};

use crate::api::state::AppState;
use crate::api::types::{
    ApiError, CompleteCacheSearchRequest, CompleteCacheStoreRequest, InitiateCacheStoreRequest,
    InitiateResponse, Json, SearchCacheRequest, SearchCacheResponse, StoreChatRequest,
    StoreChatResponse,
};
use crate::domain::DomainError;
use crate::infrastructure::services::SemanticCacheStats;

/// POST /v1/semantic-cache/search
pub async fn search_cache(
    State(state): State<AppState>,
    Json(request): Json<SearchCacheRequest>,
) -> Result<Json<SearchCacheResponse>, ApiError> {
    debug!(
        model = %request.model,
        messages = request.messages.len(),
        "Searching semantic cache"
    );

    let result = state
        .semantic_cache
        .search_cache(
            &request.messages,
            &request.model,
            request.similarity_threshold,
        )
        .await?;

    Ok(Json(SearchCacheResponse::from(result)))
}

/// POST /v1/semantic-cache/store
pub async fn store_chat(
    State(state): State<AppState>,
    Json(request): Json<StoreChatRequest>,
) -> Json<StoreChatResponse> {
    let ttl_secs = request.ttl_secs();

    let outcome = state
        .semantic_cache
        .store_chat(
            request.request_messages,
            request.response_messages,
            &request.model,
            request.usage,
            ttl_secs,
        )
        .await;

    Json(StoreChatResponse::from(outcome))
}

/// POST /v1/semantic-cache/search/initiate
pub async fn initiate_cache_search(
    State(state): State<AppState>,
    Json(request): Json<SearchCacheRequest>,
) -> Result<Json<InitiateResponse>, ApiError> {
    let request_id = state
        .semantic_cache
        .initiate_cache_search(
            &request.messages,
            &request.model,
            request.similarity_threshold,
        )
        .await?;

    Ok(Json(InitiateResponse { request_id }))
}

/// POST /v1/semantic-cache/search/complete
///
/// An unknown or expired token is answered in-band with `found = false`.
pub async fn complete_cache_search(
    State(state): State<AppState>,
    Json(request): Json<CompleteCacheSearchRequest>,
) -> Result<Json<SearchCacheResponse>, ApiError> {
    match state
        .semantic_cache
        .complete_cache_search(&request.request_id)
        .await
    {
        Ok(result) => Ok(Json(SearchCacheResponse::from(result))),
        Err(DomainError::InvalidToken { .. }) => {
            info!(request_id = %request.request_id, "Cache search completed with unknown token");
            Ok(Json(SearchCacheResponse::invalid_token()))
        }
        Err(e) => Err(e.into()),
    }
}

/// POST /v1/semantic-cache/store/initiate
pub async fn initiate_cache_store(
    State(state): State<AppState>,
    Json(request): Json<InitiateCacheStoreRequest>,
) -> Result<Json<InitiateResponse>, ApiError> {
    let request_id = state
        .semantic_cache
        .initiate_cache_store(request.request_messages, &request.model)
        .await?;

    Ok(Json(InitiateResponse { request_id }))
}

/// POST /v1/semantic-cache/store/complete
pub async fn complete_cache_store(
    State(state): State<AppState>,
    Json(request): Json<CompleteCacheStoreRequest>,
) -> Json<StoreChatResponse> {
    let outcome = state
        .semantic_cache
        .complete_cache_store(
            &request.request_id,
            request.response_messages,
            request.usage,
        )
        .await;

    Json(StoreChatResponse::from(outcome))
}

/// GET /v1/semantic-cache/stats
pub async fn get_stats(
    State(state): State<AppState>,
) -> Result<Json<SemanticCacheStats>, ApiError> {
    let stats = state.semantic_cache.stats().await?;
    Ok(Json(stats))
}
