use axum::{middleware, routing::get, Router};
use tower_http::trace::TraceLayer;

use super::health;
use super::middleware::{logging_middleware, metrics_middleware};
use super::state::AppState;
use super::v1;
use crate::infrastructure::observability::{create_metrics_router, PrometheusMetrics};

/// Create the full router with application state, request middleware and
/// the Prometheus endpoint when metrics are enabled
pub fn create_router_with_state(
    state: AppState,
    metrics: Option<PrometheusMetrics>,
    metrics_path: &str,
) -> Router {
    let mut router = Router::new()
        // Health endpoints
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/live", get(health::live_check))
        // Cache, capabilities and model selection
        .nest("/v1", v1::create_v1_router())
        .with_state(state)
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http());

    if let Some(m) = metrics {
        router = router.merge(create_metrics_router(m, metrics_path));
    }

    router
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::domain::embedding::{EmbeddingProvider, MockEmbeddingProvider};
    use crate::domain::SemanticCacheConfig;
    use crate::infrastructure::embedding::HashingEmbeddingProvider;
    use crate::infrastructure::pending::InMemoryPendingRegistry;
    use crate::infrastructure::services::SemanticCacheService;
    use crate::infrastructure::vector_index::FlatIndex;

    fn app_with(provider: Arc<dyn EmbeddingProvider>, config: SemanticCacheConfig) -> Router {
        let service = SemanticCacheService::with_config(
            Arc::new(FlatIndex::in_memory(64)),
            provider,
            Arc::new(InMemoryPendingRegistry::new()),
            config,
        );

        create_router_with_state(AppState::new(Arc::new(service)), None, "/metrics")
    }

    fn app() -> Router {
        app_with(
            Arc::new(HashingEmbeddingProvider::new(64)),
            SemanticCacheConfig::default(),
        )
    }

    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let body = match body {
            Some(v) => Body::from(v.to_string()),
            None => Body::empty(),
        };
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body)
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (status, value)
    }

    fn question() -> Value {
        json!([{"role": "user", "content": "What is 2+2?"}])
    }

    #[tokio::test]
    async fn test_health_endpoints() {
        let app = app();

        let (status, body) = call(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");

        let (status, body) = call(&app, Method::GET, "/ready", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["checks"][0]["name"], "vector_index");

        let (status, _) = call(&app, Method::GET, "/live", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_store_then_search_round_trip() {
        let app = app();

        let (status, body) = call(
            &app,
            Method::POST,
            "/v1/semantic-cache/store",
            Some(json!({
                "request_messages": question(),
                "response_messages": [{"role": "assistant", "content": "4"}],
                "model": "gpt-4o-mini",
                "usage": {"prompt_tokens": 5, "completion_tokens": 1, "total_tokens": 6}
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);

        let (status, body) = call(
            &app,
            Method::POST,
            "/v1/semantic-cache/search",
            Some(json!({
                "messages": question(),
                "model": "gpt-4o-mini",
                "similarity_threshold": 0.99
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["found"], true);
        assert_eq!(body["response_messages"][0]["role"], "assistant");
        assert_eq!(body["response_messages"][0]["content"], "4");
        assert_eq!(body["usage"]["total_tokens"], 6);
    }

    #[tokio::test]
    async fn test_store_tool_call_response_with_null_content() {
        let app = app();

        let (status, body) = call(
            &app,
            Method::POST,
            "/v1/semantic-cache/store",
            Some(json!({
                "request_messages": [{"role": "user", "content": "Weather in Paris?"}],
                "response_messages": [{
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {"name": "get_weather", "arguments": "{\"city\":\"Paris\"}"}
                    }]
                }],
                "model": "gpt-4o-mini"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);

        let (status, body) = call(
            &app,
            Method::POST,
            "/v1/semantic-cache/search",
            Some(json!({
                "messages": [{"role": "user", "content": "Weather in Paris?"}],
                "model": "gpt-4o-mini",
                "similarity_threshold": 0.99
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["found"], true);
        assert_eq!(
            body["response_messages"][0]["tool_calls"][0]["function"]["name"],
            "get_weather"
        );
    }

    #[tokio::test]
    async fn test_search_other_model_misses() {
        let app = app();

        call(
            &app,
            Method::POST,
            "/v1/semantic-cache/store",
            Some(json!({
                "request_messages": question(),
                "response_messages": [{"role": "assistant", "content": "4"}],
                "model": "gpt-4o-mini"
            })),
        )
        .await;

        let (status, body) = call(
            &app,
            Method::POST,
            "/v1/semantic-cache/search",
            Some(json!({"messages": question(), "model": "gpt-4o", "similarity_threshold": 0.0})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["found"], false);
    }

    #[tokio::test]
    async fn test_two_phase_flow() {
        let app = app();

        let (_, body) = call(
            &app,
            Method::POST,
            "/v1/semantic-cache/store/initiate",
            Some(json!({"request_messages": question(), "model": "gpt-4o-mini"})),
        )
        .await;
        let store_id = body["request_id"].as_str().unwrap().to_string();

        let (_, body) = call(
            &app,
            Method::POST,
            "/v1/semantic-cache/store/complete",
            Some(json!({
                "request_id": store_id,
                "response_messages": [{"role": "assistant", "content": "4"}],
                "usage": {"prompt_tokens": 5, "completion_tokens": 1, "total_tokens": 6}
            })),
        )
        .await;
        assert_eq!(body["success"], true);

        let (_, body) = call(
            &app,
            Method::POST,
            "/v1/semantic-cache/search/initiate",
            Some(json!({"messages": question(), "model": "gpt-4o-mini", "similarity_threshold": 0.99})),
        )
        .await;
        let search_id = body["request_id"].as_str().unwrap().to_string();

        let (status, body) = call(
            &app,
            Method::POST,
            "/v1/semantic-cache/search/complete",
            Some(json!({"request_id": search_id})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["found"], true);
        assert_eq!(body["response_messages"][0]["content"], "4");

        // Tokens are single use
        let (status, body) = call(
            &app,
            Method::POST,
            "/v1/semantic-cache/search/complete",
            Some(json!({"request_id": search_id})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["found"], false);
        assert_eq!(body["error"], "unknown or expired request id");
    }

    #[tokio::test]
    async fn test_complete_store_unknown_token() {
        let app = app();

        let (status, body) = call(
            &app,
            Method::POST,
            "/v1/semantic-cache/store/complete",
            Some(json!({"request_id": "nope", "response_messages": []})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("token"));
    }

    #[tokio::test]
    async fn test_embedding_failure_is_503() {
        let app = app_with(
            Arc::new(MockEmbeddingProvider::new("mock", 64).with_error("connection refused")),
            SemanticCacheConfig::default(),
        );

        let (status, body) = call(
            &app,
            Method::POST,
            "/v1/semantic-cache/search",
            Some(json!({"messages": question(), "model": "gpt-4o-mini"})),
        )
        .await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"]["code"], "embedding_unavailable");
    }

    #[tokio::test]
    async fn test_store_failure_is_in_band() {
        let app = app_with(
            Arc::new(MockEmbeddingProvider::new("mock", 64).with_error("connection refused")),
            SemanticCacheConfig::default(),
        );

        let (status, body) = call(
            &app,
            Method::POST,
            "/v1/semantic-cache/store",
            Some(json!({
                "request_messages": question(),
                "response_messages": [{"role": "assistant", "content": "4"}],
                "model": "gpt-4o-mini"
            })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_missing_model_is_400() {
        let app = app();

        let (status, body) = call(
            &app,
            Method::POST,
            "/v1/semantic-cache/search",
            Some(json!({"messages": question()})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["type"], "invalid_request_error");
    }

    #[tokio::test]
    async fn test_malformed_json_is_rejected() {
        let app = app();

        let request = Request::builder()
            .method(Method::POST)
            .uri("/v1/semantic-cache/search")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_capabilities_get_and_post() {
        let app = app_with(
            Arc::new(HashingEmbeddingProvider::new(64)),
            SemanticCacheConfig::default().with_stateful_enabled(false),
        );

        for method in [Method::GET, Method::POST] {
            let (status, body) = call(&app, method, "/v1/capabilities", None).await;

            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["stateless_semantic_cache_supported"], true);
            assert_eq!(body["semantic_cache_supported"], true);
            assert_eq!(body["stateful_semantic_cache_supported"], false);
            assert_eq!(body["model_selection_supported"], false);
            assert_eq!(body["immediate_response_supported"], true);
        }
    }

    #[tokio::test]
    async fn test_model_selection_unconfigured() {
        let app = app();

        let (status, _) = call(
            &app,
            Method::POST,
            "/v1/model-selection",
            Some(json!({"text": "hello", "simple_models": ["a"], "strong_models": ["b"]})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_stats_counts_entries() {
        let app = app();

        call(
            &app,
            Method::POST,
            "/v1/semantic-cache/store",
            Some(json!({
                "request_messages": question(),
                "response_messages": [{"role": "assistant", "content": "4"}],
                "model": "gpt-4o-mini"
            })),
        )
        .await;

        let (status, body) = call(&app, Method::GET, "/v1/semantic-cache/stats", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["entries"], 1);
        assert_eq!(body["stores"], 1);
        assert_eq!(body["index_backend"], "flat");
    }

    #[tokio::test]
    async fn test_request_id_is_echoed() {
        let app = app();

        let request = Request::builder()
            .uri("/health")
            .header("x-request-id", "req-7")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.headers()["x-request-id"], "req-7");
    }
}
