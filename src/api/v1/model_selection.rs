//! Model selection endpoint handler

use axum::extract::State;
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::model_selection::{ModelSelectionRequest, ModelSelectionResponse};

/// POST /v1/model-selection
pub async fn select_model(
    State(state): State<AppState>,
    Json(request): Json<ModelSelectionRequest>,
) -> Result<Json<ModelSelectionResponse>, ApiError> {
    debug!(
        simple_models = request.simple_models.len(),
        strong_models = request.strong_models.len(),
        "Selecting model"
    );

    let response = state.semantic_cache.select_model(&request).await?;
    Ok(Json(response))
}
