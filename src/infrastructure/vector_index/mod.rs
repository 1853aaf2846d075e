//! Vector index backends

mod factory;
mod flat;
mod milvus;

pub use factory::{VectorIndexBackend, VectorIndexConfig, VectorIndexFactory};
pub use flat::FlatIndex;
pub use milvus::{MilvusConfig, MilvusIndex};
