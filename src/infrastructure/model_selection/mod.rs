//! Model selection client

mod http;

pub use http::{HttpModelSelector, ModelSelectionConfig};
