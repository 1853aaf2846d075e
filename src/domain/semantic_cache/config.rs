//! Semantic cache configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the semantic cache engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticCacheConfig {
    /// Threshold used when a search request omits one.
    /// Compared against the raw inner-product score of the index.
    #[serde(default = "default_similarity_threshold")]
    pub default_similarity_threshold: f32,

    /// Model assumed when a request leaves the model empty
    #[serde(default)]
    pub default_model: Option<String>,

    /// Entry TTL recorded when a store request does not carry one
    #[serde(default = "default_ttl_secs")]
    pub default_ttl_secs: u64,

    /// How long an initiated two-phase operation waits for completion
    #[serde(default = "default_pending_ttl_secs")]
    pub pending_ttl_secs: u64,

    /// Millisecond override of `pending_ttl_secs`
    #[serde(default)]
    pub pending_ttl_ms: Option<u64>,

    /// Upper bound on parked two-phase operations
    #[serde(default = "default_pending_max_capacity")]
    pub pending_max_capacity: u64,

    /// Interval of the background sweep over expired pending operations
    #[serde(default = "default_pending_sweep_interval_secs")]
    pub pending_sweep_interval_secs: u64,

    /// Whether the initiate/complete operations are served
    #[serde(default = "default_true")]
    pub stateful_enabled: bool,
}

fn default_similarity_threshold() -> f32 {
    0.95
}

fn default_ttl_secs() -> u64 {
    3600
}

fn default_pending_ttl_secs() -> u64 {
    300
}

fn default_pending_max_capacity() -> u64 {
    100_000
}

fn default_pending_sweep_interval_secs() -> u64 {
    60
}

fn default_true() -> bool {
    true
}

impl Default for SemanticCacheConfig {
    fn default() -> Self {
        Self {
            default_similarity_threshold: default_similarity_threshold(),
            default_model: None,
            default_ttl_secs: default_ttl_secs(),
            pending_ttl_secs: default_pending_ttl_secs(),
            pending_ttl_ms: None,
            pending_max_capacity: default_pending_max_capacity(),
            pending_sweep_interval_secs: default_pending_sweep_interval_secs(),
            stateful_enabled: default_true(),
        }
    }
}

impl SemanticCacheConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the pending-operation TTL as Duration
    pub fn pending_ttl(&self) -> Duration {
        match self.pending_ttl_ms {
            Some(ms) => Duration::from_millis(ms),
            None => Duration::from_secs(self.pending_ttl_secs),
        }
    }

    /// Get the sweep interval as Duration
    pub fn pending_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.pending_sweep_interval_secs.max(1))
    }

    /// Get the default entry TTL as Duration
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs)
    }

    pub fn with_default_similarity_threshold(mut self, threshold: f32) -> Self {
        self.default_similarity_threshold = threshold;
        self
    }

    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = Some(model.into());
        self
    }

    pub fn with_pending_ttl(mut self, ttl: Duration) -> Self {
        self.pending_ttl_secs = ttl.as_secs();
        self.pending_ttl_ms = Some(u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn with_pending_max_capacity(mut self, capacity: u64) -> Self {
        self.pending_max_capacity = capacity;
        self
    }

    pub fn with_stateful_enabled(mut self, enabled: bool) -> Self {
        self.stateful_enabled = enabled;
        self
    }
}
