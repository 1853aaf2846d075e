//! HTTP client for an external model selection classifier

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::model_selection::{
    ModelSelectionRequest, ModelSelectionResponse, ModelSelector,
};
use crate::domain::DomainError;
use crate::infrastructure::http::HttpClientTrait;

/// Model selection endpoint and the default candidate lists
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ModelSelectionConfig {
    /// Classifier endpoint; model selection is disabled when unset
    pub url: Option<String>,
    pub simple_models: Vec<String>,
    pub strong_models: Vec<String>,
}

/// Forwards selection requests to the classifier's JSON endpoint.
/// Empty candidate lists in a request fall back to the configured ones.
#[derive(Debug)]
pub struct HttpModelSelector<C: HttpClientTrait> {
    client: C,
    url: String,
    simple_models: Vec<String>,
    strong_models: Vec<String>,
}

impl<C: HttpClientTrait> HttpModelSelector<C> {
    pub fn new(client: C, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            simple_models: Vec::new(),
            strong_models: Vec::new(),
        }
    }

    pub fn with_default_models(mut self, simple: Vec<String>, strong: Vec<String>) -> Self {
        self.simple_models = simple;
        self.strong_models = strong;
        self
    }
}

#[async_trait]
impl<C: HttpClientTrait> ModelSelector for HttpModelSelector<C> {
    async fn select_model(
        &self,
        request: &ModelSelectionRequest,
    ) -> Result<ModelSelectionResponse, DomainError> {
        let mut request = request.clone();
        if request.simple_models.is_empty() && request.strong_models.is_empty() {
            request.simple_models = self.simple_models.clone();
            request.strong_models = self.strong_models.clone();
        }
        request.validate()?;

        let body = serde_json::to_value(&request)
            .map_err(|e| DomainError::internal(format!("cannot encode request: {}", e)))?;

        let response = self
            .client
            .post_json(&self.url, vec![("Content-Type", "application/json")], &body)
            .await
            .map_err(|e| DomainError::internal(format!("model selection failed: {}", e)))?;

        let response: SelectorResponse = serde_json::from_value(response).map_err(|e| {
            DomainError::internal(format!("malformed model selection response: {}", e))
        })?;

        Ok(ModelSelectionResponse {
            selected_model: response.selected_model,
        })
    }
}

#[derive(Debug, Deserialize)]
struct SelectorResponse {
    selected_model: String,
}
