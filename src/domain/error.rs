use thiserror::Error;

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Embedding unavailable: {message}")]
    EmbeddingUnavailable { message: String },

    #[error("Index unavailable: {message}")]
    IndexUnavailable { message: String },

    #[error("Unknown or expired request id: {token}")]
    InvalidToken { token: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn embedding_unavailable(message: impl Into<String>) -> Self {
        Self::EmbeddingUnavailable {
            message: message.into(),
        }
    }

    pub fn index_unavailable(message: impl Into<String>) -> Self {
        Self::IndexUnavailable {
            message: message.into(),
        }
    }

    pub fn invalid_token(token: impl Into<String>) -> Self {
        Self::InvalidToken {
            token: token.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether the failure came from a backing dependency rather than the caller
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Self::EmbeddingUnavailable { .. } | Self::IndexUnavailable { .. }
        )
    }
}
