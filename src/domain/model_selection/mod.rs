//! Model selection contract
//!
//! Choosing an upstream model is delegated to an external classifier. Only
//! the request/response shape and the client trait live here.

use std::fmt::Debug;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Request sent to the model selection service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSelectionRequest {
    pub text: String,
    #[serde(default)]
    pub simple_models: Vec<String>,
    #[serde(default)]
    pub strong_models: Vec<String>,
}

impl ModelSelectionRequest {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.simple_models.is_empty() && self.strong_models.is_empty() {
            return Err(DomainError::validation("No models provided"));
        }

        Ok(())
    }
}

/// Response from the model selection service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSelectionResponse {
    pub selected_model: String,
}

/// Client for the external model selection service
#[async_trait]
pub trait ModelSelector: Send + Sync + Debug {
    async fn select_model(
        &self,
        request: &ModelSelectionRequest,
    ) -> Result<ModelSelectionResponse, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_requires_models() {
        let request = ModelSelectionRequest {
            text: "hi".into(),
            simple_models: vec![],
            strong_models: vec![],
        };

        assert!(request.validate().is_err());
    }

    #[test]
    fn test_request_defaults_model_lists() {
        let request: ModelSelectionRequest =
            serde_json::from_str(r#"{"text": "hi", "strong_models": ["gpt-4o"]}"#).unwrap();

        assert!(request.simple_models.is_empty());
        assert!(request.validate().is_ok());
    }
}
