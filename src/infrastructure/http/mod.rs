//! Shared JSON-over-HTTP client used by the remote adapters

mod client;

pub use client::{HttpClient, HttpClientError, HttpClientTrait};

#[cfg(test)]
pub use client::mock::MockHttpClient;
