//! OpenAI-compatible embedding provider

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::embedding::{
    Embedding, EmbeddingProvider, EmbeddingRequest, EmbeddingResponse, EmbeddingUsage,
};
use crate::domain::DomainError;
use crate::infrastructure::http::HttpClientTrait;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_OPENAI_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Known OpenAI embedding models and their dimensions
const EMBEDDING_MODELS: &[(&str, usize)] = &[
    ("text-embedding-3-small", 1536),
    ("text-embedding-3-large", 3072),
    ("text-embedding-ada-002", 1536),
];

/// Embedding provider for any server speaking the OpenAI `/v1/embeddings`
/// protocol (OpenAI itself, vLLM, text-embeddings-inference, Ollama, ...)
#[derive(Debug)]
pub struct OpenAiEmbeddingProvider<C: HttpClientTrait> {
    client: C,
    auth_header: Option<String>,
    base_url: String,
    model: String,
    dimensions: Option<usize>,
}

impl<C: HttpClientTrait> OpenAiEmbeddingProvider<C> {
    /// Create a provider for the public OpenAI API
    pub fn new(client: C, api_key: impl Into<String>) -> Self {
        Self::with_base_url(client, Some(api_key.into()), DEFAULT_OPENAI_BASE_URL)
    }

    /// Create a provider with a custom base URL; self-hosted servers often
    /// need no key
    pub fn with_base_url(
        client: C,
        api_key: Option<String>,
        base_url: impl Into<String>,
    ) -> Self {
        let auth_header = api_key
            .filter(|k| !k.is_empty())
            .map(|k| format!("Bearer {}", k));
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Self {
            client,
            auth_header,
            base_url,
            model: DEFAULT_OPENAI_EMBEDDING_MODEL.to_string(),
            dimensions: None,
        }
    }

    /// Set the model used when building requests
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Request a specific output dimension (text-embedding-3-* only)
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = Some(dimensions);
        self
    }

    fn embeddings_url(&self) -> String {
        format!("{}/v1/embeddings", self.base_url)
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        let mut headers = vec![("Content-Type", "application/json")];

        if let Some(ref auth) = self.auth_header {
            headers.push(("Authorization", auth.as_str()));
        }

        headers
    }

    fn build_request(&self, request: &EmbeddingRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": request.model(),
            "input": request.input(),
            "encoding_format": "float",
        });

        if let Some(dims) = request.dimensions().or(self.dimensions) {
            body["dimensions"] = serde_json::json!(dims);
        }

        body
    }

    fn parse_response(&self, json: serde_json::Value) -> Result<EmbeddingResponse, DomainError> {
        let response: OpenAiEmbeddingResponse = serde_json::from_value(json).map_err(|e| {
            DomainError::embedding_unavailable(format!(
                "Failed to parse embedding response: {}",
                e
            ))
        })?;

        let embeddings = response
            .data
            .into_iter()
            .map(|d| Embedding::new(d.index, d.embedding))
            .collect();

        let usage = response
            .usage
            .map(|u| EmbeddingUsage::new(u.prompt_tokens, u.total_tokens))
            .unwrap_or_default();

        Ok(EmbeddingResponse::new(response.model, embeddings, usage))
    }
}

#[async_trait]
impl<C: HttpClientTrait> EmbeddingProvider for OpenAiEmbeddingProvider<C> {
    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, DomainError> {
        let request = if request.model().is_empty() {
            let mut rebuilt = EmbeddingRequest::new(&self.model, request.input());
            if let Some(dims) = request.dimensions() {
                rebuilt = rebuilt.with_dimensions(dims);
            }
            rebuilt
        } else {
            request
        };

        let url = self.embeddings_url();
        let body = self.build_request(&request);

        let response = self
            .client
            .post_json(&url, self.headers(), &body)
            .await
            .map_err(|e| DomainError::embedding_unavailable(format!("openai: {}", e)))?;

        self.parse_response(response)
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }

    fn default_model(&self) -> &str {
        &self.model
    }

    fn dimensions(&self, model: &str) -> Option<usize> {
        self.dimensions.or_else(|| {
            EMBEDDING_MODELS
                .iter()
                .find(|(name, _)| *name == model)
                .map(|(_, dims)| *dims)
        })
    }
}

// OpenAI API types for embeddings

#[derive(Debug, Deserialize)]
struct OpenAiEmbeddingResponse {
    #[serde(default)]
    model: String,
    data: Vec<OpenAiEmbeddingData>,
    #[serde(default)]
    usage: Option<OpenAiEmbeddingUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiEmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct OpenAiEmbeddingUsage {
    prompt_tokens: u32,
    total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::http::MockHttpClient;

    const TEST_URL: &str = "https://api.openai.com/v1/embeddings";

    fn create_mock_response(dimensions: usize) -> serde_json::Value {
        let embedding: Vec<f32> = (0..dimensions).map(|j| j as f32 * 0.001).collect();

        serde_json::json!({
            "model": "text-embedding-3-small",
            "data": [{"index": 0, "embedding": embedding, "object": "embedding"}],
            "usage": {"prompt_tokens": 10, "total_tokens": 10}
        })
    }

    #[tokio::test]
    async fn test_embed_single_text() {
        let client = MockHttpClient::new().with_response(TEST_URL, create_mock_response(1536));
        let provider = OpenAiEmbeddingProvider::new(client, "test-api-key");

        let request = EmbeddingRequest::new("text-embedding-3-small", "Hello world");
        let response = provider.embed(request).await.unwrap();

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["model"], "text-embedding-3-small");
        assert_eq!(json["usage"]["prompt_tokens"], 10);
        assert_eq!(response.into_first().unwrap().into_vector().len(), 1536);
    }

    #[tokio::test]
    async fn test_request_body_uses_configured_model_and_dimensions() {
        let client = std::sync::Arc::new(
            MockHttpClient::new().with_response(TEST_URL, create_mock_response(256)),
        );
        let provider = OpenAiEmbeddingProvider::new(client.clone(), "key")
            .with_model("text-embedding-3-large")
            .with_dimensions(256);

        provider.embed(EmbeddingRequest::new("", "Hello")).await.unwrap();

        let (_, body) = &client.requests()[0];
        assert_eq!(body["model"], "text-embedding-3-large");
        assert_eq!(body["dimensions"], 256);
        assert_eq!(body["input"], "Hello");
    }

    #[tokio::test]
    async fn test_embed_error_is_unavailable() {
        let client = MockHttpClient::new().with_error(TEST_URL, "Rate limit exceeded");
        let provider = OpenAiEmbeddingProvider::new(client, "test-api-key");

        let result = provider.embed(EmbeddingRequest::new("m", "Hello")).await;

        assert!(matches!(
            result,
            Err(DomainError::EmbeddingUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_malformed_response_is_unavailable() {
        let client =
            MockHttpClient::new().with_response(TEST_URL, serde_json::json!({"unexpected": 1}));
        let provider = OpenAiEmbeddingProvider::new(client, "test-api-key");

        let result = provider.embed(EmbeddingRequest::new("m", "Hello")).await;

        assert!(matches!(
            result,
            Err(DomainError::EmbeddingUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_custom_base_url_without_key() {
        let custom_url = "http://localhost:8080/v1/embeddings";
        let client = MockHttpClient::new().with_response(custom_url, create_mock_response(384));
        let provider = OpenAiEmbeddingProvider::with_base_url(client, None, "http://localhost:8080/");

        assert!(provider.headers().iter().all(|(k, _)| *k != "Authorization"));

        let response = provider
            .embed(EmbeddingRequest::new("all-minilm", "Test"))
            .await
            .unwrap();

        assert_eq!(response.into_first().unwrap().into_vector().len(), 384);
    }

    #[test]
    fn test_provider_info() {
        let provider = OpenAiEmbeddingProvider::new(MockHttpClient::new(), "test-key");

        assert_eq!(provider.provider_name(), "openai");
        assert_eq!(provider.default_model(), "text-embedding-3-small");
        assert_eq!(provider.dimensions("text-embedding-3-small"), Some(1536));
        assert_eq!(provider.dimensions("text-embedding-3-large"), Some(3072));
        assert_eq!(provider.dimensions("unknown-model"), None);
    }
}
