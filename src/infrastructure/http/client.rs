use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Transport-level failure. Each adapter maps it onto its own domain error.
#[derive(Debug, Error)]
pub enum HttpClientError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to parse response: {0}")]
    Decode(String),
}

/// Trait for HTTP client operations (for mocking)
#[async_trait]
pub trait HttpClientTrait: Send + Sync + std::fmt::Debug {
    async fn post_json(
        &self,
        url: &str,
        headers: Vec<(&str, &str)>,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, HttpClientError>;
}

/// Real HTTP client using reqwest
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, HttpClientError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| HttpClientError::Transport(e.to_string()))?;

        Ok(Self { client })
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClientTrait for HttpClient {
    async fn post_json(
        &self,
        url: &str,
        headers: Vec<(&str, &str)>,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, HttpClientError> {
        let mut request = self.client.post(url);

        for (key, value) in headers {
            request = request.header(key, value);
        }

        let response = request
            .json(body)
            .send()
            .await
            .map_err(|e| HttpClientError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(HttpClientError::Status { status, body });
        }

        response
            .json()
            .await
            .map_err(|e| HttpClientError::Decode(e.to_string()))
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::RwLock;

    /// Canned responses keyed by URL; every request body is recorded
    #[derive(Debug, Default)]
    pub struct MockHttpClient {
        responses: RwLock<HashMap<String, serde_json::Value>>,
        errors: RwLock<HashMap<String, String>>,
        requests: RwLock<Vec<(String, serde_json::Value)>>,
    }

    impl MockHttpClient {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_response(self, url: impl Into<String>, response: serde_json::Value) -> Self {
            self.responses.write().unwrap().insert(url.into(), response);
            self
        }

        pub fn with_error(self, url: impl Into<String>, error: impl Into<String>) -> Self {
            self.errors.write().unwrap().insert(url.into(), error.into());
            self
        }

        /// Bodies posted so far, in order
        pub fn requests(&self) -> Vec<(String, serde_json::Value)> {
            self.requests.read().unwrap().clone()
        }
    }

    #[async_trait]
    impl HttpClientTrait for MockHttpClient {
        async fn post_json(
            &self,
            url: &str,
            _headers: Vec<(&str, &str)>,
            body: &serde_json::Value,
        ) -> Result<serde_json::Value, HttpClientError> {
            self.requests
                .write()
                .unwrap()
                .push((url.to_string(), body.clone()));

            if let Some(error) = self.errors.read().unwrap().get(url) {
                return Err(HttpClientError::Transport(error.clone()));
            }

            self.responses
                .read()
                .unwrap()
                .get(url)
                .cloned()
                .ok_or_else(|| HttpClientError::Status {
                    status: 404,
                    body: format!("No mock response for {}", url),
                })
        }
    }

    #[async_trait]
    impl HttpClientTrait for std::sync::Arc<MockHttpClient> {
        async fn post_json(
            &self,
            url: &str,
            headers: Vec<(&str, &str)>,
            body: &serde_json::Value,
        ) -> Result<serde_json::Value, HttpClientError> {
            self.as_ref().post_json(url, headers, body).await
        }
    }
}
