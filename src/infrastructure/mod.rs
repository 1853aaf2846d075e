//! Infrastructure layer - External service implementations

pub mod embedding;
pub mod http;
pub mod logging;
pub mod model_selection;
pub mod observability;
pub mod pending;
pub mod services;
pub mod vector_index;
