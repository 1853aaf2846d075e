//! v1 API endpoints

pub mod capabilities;
pub mod model_selection;
pub mod semantic_cache;

use axum::{
    routing::{get, post},
    Router,
};

use super::state::AppState;

/// Create v1 API router
pub fn create_v1_router() -> Router<AppState> {
    Router::new()
        .route("/semantic-cache/search", post(semantic_cache::search_cache))
        .route("/semantic-cache/store", post(semantic_cache::store_chat))
        .route(
            "/semantic-cache/search/initiate",
            post(semantic_cache::initiate_cache_search),
        )
        .route(
            "/semantic-cache/search/complete",
            post(semantic_cache::complete_cache_search),
        )
        .route(
            "/semantic-cache/store/initiate",
            post(semantic_cache::initiate_cache_store),
        )
        .route(
            "/semantic-cache/store/complete",
            post(semantic_cache::complete_cache_store),
        )
        .route("/semantic-cache/stats", get(semantic_cache::get_stats))
        .route(
            "/capabilities",
            get(capabilities::get_capabilities).post(capabilities::get_capabilities),
        )
        .route("/model-selection", post(model_selection::select_model))
}
