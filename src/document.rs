// src/document.rs
//! Request-scoped document records produced by collectors and consumed by the pipeline.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A short news item about a ticker, as returned by a collector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub title: String,
    pub content: String,
    pub url: String,
    pub source: String,
    /// RFC 3339 / ISO-8601 timestamp.
    pub timestamp: String,
}

impl Document {
    /// Text used for embedding: title and content joined by a single space.
    pub fn embedding_text(&self) -> String {
        format!("{} {}", self.title, self.content)
    }

    /// Lower-cased title + content, used for keyword scoring.
    pub fn lowercase_text(&self) -> String {
        self.embedding_text().to_lowercase()
    }

    /// 12 hex chars of SHA-256 over the url (title when the url is empty).
    /// Logs carry this instead of document text.
    pub fn short_id(&self) -> String {
        let key = if self.url.is_empty() { &self.title } else { &self.url };
        let digest = Sha256::digest(key.as_bytes());
        let mut out = String::with_capacity(12);
        for b in digest.iter().take(6) {
            let _ = write!(&mut out, "{b:02x}");
        }
        out
    }
}

/// A document returned from retrieval, with its similarity score attached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredDocument {
    #[serde(flatten)]
    pub document: Document,
    pub relevance_score: f32,
}

impl std::ops::Deref for ScoredDocument {
    type Target = Document;

    fn deref(&self) -> &Document {
        &self.document
    }
}
