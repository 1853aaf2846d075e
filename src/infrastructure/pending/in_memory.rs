//! In-memory pending operation registry using moka

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::future::Cache as MokaCache;
use tokio::task::JoinHandle;
use tracing::debug;
use uuid::Uuid;

use crate::domain::semantic_cache::{PendingOperation, PendingOperationRegistry};
use crate::domain::DomainError;
use crate::infrastructure::observability::set_pending_operations;

/// Configuration for the pending registry
#[derive(Debug, Clone)]
pub struct PendingRegistryConfig {
    /// How long an initiated operation may wait for its completion
    pub ttl: Duration,
    /// Maximum number of parked operations
    pub max_capacity: u64,
}

impl Default for PendingRegistryConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(300),
            max_capacity: 100_000,
        }
    }
}

#[derive(Debug, Clone)]
struct PendingRecord {
    operation: PendingOperation,
    created_at: Instant,
}

/// Token table backed by a moka cache.
///
/// moka evicts lazily, so records past their TTL are also filtered on
/// `take`. `remove` hands a value to exactly one caller.
#[derive(Debug)]
pub struct InMemoryPendingRegistry {
    cache: MokaCache<String, PendingRecord>,
    ttl: Duration,
}

impl InMemoryPendingRegistry {
    pub fn new() -> Self {
        Self::with_config(PendingRegistryConfig::default())
    }

    pub fn with_config(config: PendingRegistryConfig) -> Self {
        let cache = MokaCache::builder()
            .max_capacity(config.max_capacity)
            .time_to_live(config.ttl)
            .build();

        Self {
            cache,
            ttl: config.ttl,
        }
    }

    fn is_expired(&self, record: &PendingRecord) -> bool {
        record.created_at.elapsed() > self.ttl
    }

    /// Run `purge_expired` every `interval` until the registry is dropped
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let registry = Arc::downgrade(self);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;

            loop {
                ticker.tick().await;

                let Some(registry) = registry.upgrade() else {
                    break;
                };

                if let Ok(purged) = registry.purge_expired().await {
                    if purged > 0 {
                        debug!(purged, "Purged expired pending operations");
                    }
                }
                set_pending_operations(registry.len().await);
            }
        })
    }
}

impl Default for InMemoryPendingRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PendingOperationRegistry for InMemoryPendingRegistry {
    async fn put(&self, operation: PendingOperation) -> Result<String, DomainError> {
        let token = Uuid::new_v4().to_string();

        self.cache
            .insert(
                token.clone(),
                PendingRecord {
                    operation,
                    created_at: Instant::now(),
                },
            )
            .await;

        Ok(token)
    }

    async fn take(&self, token: &str) -> Result<Option<PendingOperation>, DomainError> {
        match self.cache.remove(token).await {
            Some(record) if !self.is_expired(&record) => Ok(Some(record.operation)),
            Some(_) => {
                debug!(token, "Pending operation expired before completion");
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn purge_expired(&self) -> Result<usize, DomainError> {
        let expired: Vec<Arc<String>> = self
            .cache
            .iter()
            .filter(|(_, record)| self.is_expired(record))
            .map(|(token, _)| token)
            .collect();

        for token in &expired {
            self.cache.invalidate(token.as_str()).await;
        }

        self.cache.run_pending_tasks().await;

        Ok(expired.len())
    }

    async fn len(&self) -> usize {
        self.cache.run_pending_tasks().await;
        self.cache.entry_count() as usize
    }
}
