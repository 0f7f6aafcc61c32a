// src/embed/hashing.rs
//! Offline embedder: signed feature hashing of lower-cased word tokens.
//!
//! Texts sharing vocabulary land close together, which is enough for ranking a
//! few dozen headlines without a model server.

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use super::{Embedder, EmbeddingError};

pub const DEFAULT_DIMENSION: usize = 384;

#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dimension];
        for token in tokenize(text) {
            let digest = Sha256::digest(token.as_bytes());
            let bucket = u64::from_le_bytes([
                digest[0], digest[1], digest[2], digest[3], digest[4], digest[5], digest[6],
                digest[7],
            ]) % self.dimension as u64;
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            v[bucket as usize] += sign;
        }
        v
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

/// Alphanumeric tokens, lower-case.
fn tokenize(s: &str) -> impl Iterator<Item = String> + '_ {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
}

#[async_trait]
impl Embedder for HashingEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts.iter().map(|t| self.vectorize(t)).collect())
    }

    fn name(&self) -> &'static str {
        "hashing"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_text_same_vector() {
        let e = HashingEmbedder::new(64);
        let a = e.embed_one("Apple earnings beat").await.unwrap();
        let b = e.embed(&["apple EARNINGS beat".to_string()]).await.unwrap();
        assert_eq!(a.len(), 64);
        assert_eq!(a, b[0]);
    }

    #[tokio::test]
    async fn empty_text_is_zero_vector() {
        let e = HashingEmbedder::new(16);
        let v = e.embed_one("  ... ").await.unwrap();
        assert!(v.iter().all(|x| *x == 0.0));
    }
}
