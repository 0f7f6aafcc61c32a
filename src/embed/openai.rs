// src/embed/openai.rs
//! OpenAI embeddings endpoint (`POST {base}/embeddings`), batched.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{Embedder, EmbeddingError};

/// Maximum number of texts per request.
const BATCH_SIZE: usize = 64;

pub struct OpenAiEmbedder {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedDatum>,
}

#[derive(Deserialize)]
struct EmbedDatum {
    index: usize,
    embedding: Vec<f32>,
}

impl OpenAiEmbedder {
    pub fn new(api_key: String, model: String, base_url: String) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(concat!("stock-rag-analyzer/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self {
            http,
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn embed_chunk(&self, chunk: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let req = EmbedRequest {
            model: &self.model,
            input: chunk,
        };
        let resp = self
            .http
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .map_err(|e| EmbeddingError::Request(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(EmbeddingError::Status(resp.status().as_u16()));
        }

        let mut body: EmbedResponse = resp
            .json()
            .await
            .map_err(|e| EmbeddingError::Request(format!("response parse error: {e}")))?;

        if body.data.len() != chunk.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: chunk.len(),
                got: body.data.len(),
            });
        }
        // The API may return items out of order.
        body.data.sort_by_key(|d| d.index);
        Ok(body.data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if self.api_key.is_empty() {
            return Err(EmbeddingError::NotConfigured("missing OpenAI API key".into()));
        }
        let mut all = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(BATCH_SIZE) {
            all.extend(self.embed_chunk(chunk).await?);
        }
        Ok(all)
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_key_is_not_configured() {
        let e = OpenAiEmbedder::new(
            String::new(),
            "text-embedding-3-small".into(),
            "http://127.0.0.1:9".into(),
        );
        let err = e.embed(&["x".to_string()]).await.unwrap_err();
        assert!(matches!(err, EmbeddingError::NotConfigured(_)));
    }

    #[tokio::test]
    async fn empty_batch_makes_no_request() {
        let e = OpenAiEmbedder::new("k".into(), "m".into(), "http://127.0.0.1:9".into());
        let out = e.embed(&[]).await.unwrap();
        assert!(out.is_empty());
    }
}
