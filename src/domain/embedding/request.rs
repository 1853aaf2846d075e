//! Embedding request types

use serde::{Deserialize, Serialize};

/// Request to embed a single piece of text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    /// Model to use for embedding
    model: String,
    /// Input text to embed
    input: String,
    /// Optional dimensions (for models that support it)
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

impl EmbeddingRequest {
    /// Create a new embedding request
    pub fn new(model: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            input: input.into(),
            dimensions: None,
        }
    }

    /// Set the output dimensions
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = Some(dimensions);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn dimensions(&self) -> Option<usize> {
        self.dimensions
    }
}
