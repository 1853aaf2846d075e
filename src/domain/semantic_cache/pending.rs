//! Pending two-phase operations and the registry that parks them

use std::fmt::Debug;

use async_trait::async_trait;

use crate::domain::chat::Message;
use crate::domain::DomainError;

/// State parked between an initiate call and its matching complete call
#[derive(Debug, Clone, PartialEq)]
pub enum PendingOperation {
    /// Embedding computed, waiting for the search to be completed
    Search {
        embedding: Vec<f32>,
        model: String,
        similarity_threshold: f32,
    },
    /// Request half of an entry, waiting for the response half
    Store {
        embedding: Vec<f32>,
        request_messages: Vec<Message>,
        model: String,
    },
}

impl PendingOperation {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Search { .. } => "search",
            Self::Store { .. } => "store",
        }
    }
}

/// Concurrency-safe correlation table from opaque tokens to pending state.
///
/// `take` is an atomic read-and-delete: a token is delivered at most once,
/// even under concurrent duplicate completions.
#[async_trait]
pub trait PendingOperationRegistry: Send + Sync + Debug {
    /// Park an operation and return its freshly generated token
    async fn put(&self, operation: PendingOperation) -> Result<String, DomainError>;

    /// Remove and return the operation for this token, if still live
    async fn take(&self, token: &str) -> Result<Option<PendingOperation>, DomainError>;

    /// Drop operations older than the registry TTL, returning how many went
    async fn purge_expired(&self) -> Result<usize, DomainError>;

    /// Number of live operations
    async fn len(&self) -> usize;
}
