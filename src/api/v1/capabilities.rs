//! Capability discovery

use axum::extract::State;

use crate::api::state::AppState;
use crate::api::types::{CapabilitiesResponse, Json};

/// GET|POST /v1/capabilities
pub async fn get_capabilities(State(state): State<AppState>) -> Json<CapabilitiesResponse> {
    Json(state.semantic_cache.capabilities().into())
}
