//! API client module
//!
//! GraphQL client for the analysis backend plus the blob upload target.

pub mod client;
pub mod queries;
pub mod types;

pub use client::ApiClient;
pub use queries::StreamQuery;
pub use types::*;

use crate::error::Result;
use async_trait::async_trait;

/// Read access to stream state (dependency injection for the poller)
#[async_trait]
pub trait StreamSource: Send + Sync {
    /// Fetch one selection of the stream for a file.
    ///
    /// `Ok(None)` means the backend has no stream for the file yet.
    async fn fetch_stream(&self, file_id: &str, query: StreamQuery) -> Result<Option<serde_json::Value>>;
}
