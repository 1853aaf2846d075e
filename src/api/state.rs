//! Application state shared by the handlers

use std::sync::Arc;

use crate::infrastructure::services::SemanticCacheServiceTrait;

/// Application state using dynamic dispatch so handlers can be tested
/// against any cache implementation
#[derive(Clone)]
pub struct AppState {
    pub semantic_cache: Arc<dyn SemanticCacheServiceTrait>,
}

impl AppState {
    pub fn new(semantic_cache: Arc<dyn SemanticCacheServiceTrait>) -> Self {
        Self { semantic_cache }
    }
}
