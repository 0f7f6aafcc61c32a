// src/embed/mod.rs
//! Embedding service abstraction.
//!
//! Implementations must return vectors of one constant dimension for the whole
//! process lifetime, for both document batches and single query strings.

pub mod hashing;
pub mod openai;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

pub use hashing::HashingEmbedder;
pub use openai::OpenAiEmbedder;

use crate::config::EmbeddingSettings;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding request failed: {0}")]
    Request(String),
    #[error("embedding service returned status {0}")]
    Status(u16),
    #[error("embedding service returned {got} vectors for {expected} inputs")]
    CountMismatch { expected: usize, got: usize },
    #[error("embedding provider is not configured: {0}")]
    NotConfigured(String),
}

#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed every text, returning one vector per input in the same order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Single-string convenience over `embed`; same vector space.
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let out = self.embed(&[text.to_string()]).await?;
        let got = out.len();
        match out.into_iter().next() {
            Some(v) if got == 1 => Ok(v),
            _ => Err(EmbeddingError::CountMismatch { expected: 1, got }),
        }
    }

    fn name(&self) -> &'static str;
}

pub type DynEmbedder = Arc<dyn Embedder>;

/// Scale `v` to unit length in place. Zero vectors are left untouched.
pub fn l2_normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

/// Factory: pick the embedder named in config.
///
/// * `AI_TEST_MODE=mock` always yields the offline hashing embedder.
/// * `"openai"` needs a resolved API key, otherwise falls back to hashing with a warning.
pub fn build_embedder(settings: &EmbeddingSettings) -> DynEmbedder {
    if crate::config::test_mode_is_mock() {
        return Arc::new(HashingEmbedder::new(settings.dimension));
    }
    match settings.provider.as_str() {
        "openai" if !settings.api_key.is_empty() => Arc::new(OpenAiEmbedder::new(
            settings.api_key.clone(),
            settings.model.clone(),
            settings.base_url.clone(),
        )),
        "openai" => {
            tracing::warn!("embedding provider 'openai' has no API key; using hashing embedder");
            Arc::new(HashingEmbedder::new(settings.dimension))
        }
        _ => Arc::new(HashingEmbedder::new(settings.dimension)),
    }
}
