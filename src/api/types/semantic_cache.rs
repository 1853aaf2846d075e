//! Wire types for the semantic cache operations

use serde::{Deserialize, Serialize};

use crate::domain::chat::{Message, Usage};
use crate::domain::semantic_cache::SimilarityMatch;
use crate::domain::Capabilities;
use crate::infrastructure::services::StoreOutcome;

/// Request for SearchCache and InitiateCacheSearch
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchCacheRequest {
    pub messages: Vec<Message>,
    #[serde(default)]
    pub model: String,
    /// Falls back to the configured default when omitted
    #[serde(default)]
    pub similarity_threshold: Option<f32>,
}

/// Response for SearchCache and CompleteCacheSearch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchCacheResponse {
    pub found: bool,
    pub response_messages: Vec<Message>,
    pub similarity_score: f32,
    pub usage: Usage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SearchCacheResponse {
    pub fn miss() -> Self {
        Self {
            found: false,
            response_messages: Vec::new(),
            similarity_score: 0.0,
            usage: Usage::default(),
            error: None,
        }
    }

    pub fn invalid_token() -> Self {
        Self {
            error: Some("unknown or expired request id".to_string()),
            ..Self::miss()
        }
    }
}

impl From<Option<SimilarityMatch>> for SearchCacheResponse {
    fn from(result: Option<SimilarityMatch>) -> Self {
        match result {
            Some(hit) => Self {
                found: true,
                response_messages: hit.response_messages,
                similarity_score: hit.similarity_score,
                usage: hit.usage,
                error: None,
            },
            None => Self::miss(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreChatRequest {
    pub request_messages: Vec<Message>,
    pub response_messages: Vec<Message>,
    #[serde(default)]
    pub model: String,
    /// Seconds; zero or absent means the configured default
    #[serde(default)]
    pub ttl: Option<u64>,
    #[serde(default)]
    pub usage: Usage,
}

impl StoreChatRequest {
    pub fn ttl_secs(&self) -> Option<u64> {
        self.ttl.filter(|ttl| *ttl > 0)
    }
}

/// Response for StoreChat and CompleteCacheStore
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreChatResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<StoreOutcome> for StoreChatResponse {
    fn from(outcome: StoreOutcome) -> Self {
        Self {
            success: outcome.success,
            error: outcome.error,
        }
    }
}

/// Response for both initiate operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitiateResponse {
    pub request_id: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CompleteCacheSearchRequest {
    pub request_id: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InitiateCacheStoreRequest {
    pub request_messages: Vec<Message>,
    #[serde(default)]
    pub model: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CompleteCacheStoreRequest {
    pub request_id: String,
    pub response_messages: Vec<Message>,
    #[serde(default)]
    pub usage: Usage,
}

/// Capability flags under both naming schemes; `semantic_cache_supported`
/// mirrors the stateless flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitiesResponse {
    pub stateless_semantic_cache_supported: bool,
    pub stateful_semantic_cache_supported: bool,
    pub semantic_cache_supported: bool,
    pub model_selection_supported: bool,
    pub immediate_response_supported: bool,
}

impl From<Capabilities> for CapabilitiesResponse {
    fn from(c: Capabilities) -> Self {
        Self {
            stateless_semantic_cache_supported: c.stateless_semantic_cache_supported,
            stateful_semantic_cache_supported: c.stateful_semantic_cache_supported,
            semantic_cache_supported: c.stateless_semantic_cache_supported,
            model_selection_supported: c.model_selection_supported,
            immediate_response_supported: c.immediate_response_supported,
        }
    }
}
