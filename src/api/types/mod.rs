//! HTTP wire types

pub mod error;
pub mod json;
pub mod semantic_cache;

pub use error::{ApiError, ApiErrorResponse};
pub use json::Json;
pub use semantic_cache::{
    CapabilitiesResponse, CompleteCacheSearchRequest, CompleteCacheStoreRequest,
    InitiateCacheStoreRequest, InitiateResponse, SearchCacheRequest, SearchCacheResponse,
    StoreChatRequest, StoreChatResponse,
};
