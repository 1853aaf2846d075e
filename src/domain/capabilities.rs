use serde::{Deserialize, Serialize};

/// Feature flags advertised to callers so they can pick a cache protocol
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub stateless_semantic_cache_supported: bool,
    pub stateful_semantic_cache_supported: bool,
    pub model_selection_supported: bool,
    pub immediate_response_supported: bool,
}
