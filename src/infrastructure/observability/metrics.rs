//! Prometheus metrics infrastructure

use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, response::IntoResponse, routing::get, Router};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use super::config::MetricsConfig;

const MAX_PATH_LABEL_LEN: usize = 64;

/// Prometheus metrics handle for serving metrics endpoint
#[derive(Clone)]
pub struct PrometheusMetrics {
    handle: Arc<PrometheusHandle>,
}

impl PrometheusMetrics {
    /// Get the metrics as a string for the /metrics endpoint
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// Initialize Prometheus metrics
pub fn init_metrics(config: &MetricsConfig) -> Option<PrometheusMetrics> {
    if !config.enabled {
        tracing::info!("Prometheus metrics disabled");
        return None;
    }

    let builder = PrometheusBuilder::new();

    match builder.install_recorder() {
        Ok(handle) => {
            register_default_metrics();

            tracing::info!("Prometheus metrics initialized at {}", config.path);

            Some(PrometheusMetrics {
                handle: Arc::new(handle),
            })
        }
        Err(e) => {
            tracing::error!("Failed to initialize Prometheus metrics: {}", e);
            None
        }
    }
}

fn register_default_metrics() {
    gauge!("semantic_cache_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);
    gauge!("semantic_cache_pending_operations").set(0.0);
}

/// Create the metrics router
pub fn create_metrics_router(metrics: PrometheusMetrics, path: &str) -> Router {
    Router::new()
        .route(path, get(metrics_handler))
        .with_state(metrics)
}

async fn metrics_handler(State(metrics): State<PrometheusMetrics>) -> impl IntoResponse {
    metrics.render()
}

/// Record an HTTP request metric. `path` should be the matched route
/// template so label cardinality stays bounded.
pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    let labels = [
        ("method", method.to_string()),
        ("path", truncate_path(path)),
        ("status", status.to_string()),
    ];

    counter!("http_requests_total", &labels).increment(1);
    histogram!("http_request_duration_seconds", &labels).record(duration.as_secs_f64());

    if status >= 500 {
        counter!("http_server_errors_total", &labels).increment(1);
    }
}

/// Outcome of a cache lookup, used as a metric label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupOutcome {
    Hit,
    Miss,
    InvalidToken,
    Error,
}

impl LookupOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hit => "hit",
            Self::Miss => "miss",
            Self::InvalidToken => "invalid_token",
            Self::Error => "error",
        }
    }
}

/// Record a search (`search` or `complete_search`)
pub fn record_cache_lookup(operation: &'static str, outcome: LookupOutcome) {
    counter!(
        "semantic_cache_lookups_total",
        "operation" => operation,
        "outcome" => outcome.as_str()
    )
    .increment(1);
}

/// Record a store (`store` or `complete_store`)
pub fn record_cache_store(operation: &'static str, success: bool) {
    let status = if success { "success" } else { "error" };
    counter!(
        "semantic_cache_stores_total",
        "operation" => operation,
        "status" => status
    )
    .increment(1);
}

/// Record how long the embedder took for one conversation
pub fn record_embedding_duration(provider: &'static str, duration: Duration) {
    histogram!("semantic_cache_embedding_duration_seconds", "provider" => provider)
        .record(duration.as_secs_f64());
}

/// Publish the number of parked two-phase operations
pub fn set_pending_operations(count: usize) {
    gauge!("semantic_cache_pending_operations").set(count as f64);
}

fn truncate_path(path: &str) -> String {
    match path.char_indices().nth(MAX_PATH_LABEL_LEN) {
        Some((idx, _)) => path[..idx].to_string(),
        None => path.to_string(),
    }
}
