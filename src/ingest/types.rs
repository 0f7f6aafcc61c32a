// src/ingest/types.rs
use async_trait::async_trait;
use thiserror::Error;

use crate::document::Document;

#[derive(Debug, Error)]
pub enum CollectError {
    #[error("{provider} http error: {message}")]
    Http { provider: String, message: String },
    #[error("{provider} returned status {status}")]
    Status { provider: String, status: u16 },
    #[error("{provider} feed parse error: {message}")]
    Parse { provider: String, message: String },
}

/// Gathers raw documents for a ticker.
///
/// Never fails: an empty list is the "nothing found" signal.
#[async_trait]
pub trait DocumentCollector: Send + Sync {
    async fn collect(&self, symbol: &str) -> Vec<Document>;
}

/// A single upstream source queried by [`super::FeedCollector`].
#[async_trait]
pub trait FeedProvider: Send + Sync {
    async fn fetch(&self, symbol: &str) -> Result<Vec<Document>, CollectError>;
    fn name(&self) -> &str;
}
