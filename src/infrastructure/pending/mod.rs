//! Pending two-phase operation registries

mod in_memory;

pub use in_memory::{InMemoryPendingRegistry, PendingRegistryConfig};
