// src/index.rs
//! Flat inner-product similarity index and top-k retrieval.
//!
//! Vectors are L2-normalized before insertion, so inner product equals cosine
//! similarity. The index is built once per request and never updated.

use thiserror::Error;

use crate::document::{Document, ScoredDocument};
use crate::embed::{l2_normalize, Embedder, EmbeddingError};

#[derive(Debug, Error)]
pub enum IndexError {
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
    #[error("vector dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
    #[error("embedder returned {got} vectors for {expected} documents")]
    CountMismatch { expected: usize, got: usize },
}

/// Ordinal position → unit vector, plus the documents those positions refer to.
#[derive(Debug, Clone)]
pub struct SimilarityIndex {
    dimension: usize,
    vectors: Vec<Vec<f32>>,
    documents: Vec<Document>,
}

impl SimilarityIndex {
    /// Build from pre-computed vectors. Returns `Ok(None)` for zero documents.
    pub fn from_vectors(
        documents: Vec<Document>,
        mut vectors: Vec<Vec<f32>>,
    ) -> Result<Option<Self>, IndexError> {
        if vectors.len() != documents.len() {
            return Err(IndexError::CountMismatch {
                expected: documents.len(),
                got: vectors.len(),
            });
        }
        let Some(dimension) = vectors.first().map(Vec::len) else {
            return Ok(None);
        };
        for v in vectors.iter_mut() {
            if v.len() != dimension {
                return Err(IndexError::DimensionMismatch {
                    expected: dimension,
                    got: v.len(),
                });
            }
            l2_normalize(v);
        }
        Ok(Some(Self {
            dimension,
            vectors,
            documents,
        }))
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Exact search: `(position, score)` for the `k` best inner products,
    /// descending; ties keep insertion order.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>, IndexError> {
        if query.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                got: query.len(),
            });
        }
        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(i, v)| (i, dot(v, query)))
            .collect();
        // sort_by is stable, so equal scores stay in insertion order
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k.min(self.len()));
        Ok(scored)
    }

    pub fn document(&self, position: usize) -> Option<&Document> {
        self.documents.get(position)
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Embed `title + " " + content` for each document and build the index.
/// Zero documents yield `None` without calling the embedder.
pub async fn build_index(
    embedder: &dyn Embedder,
    documents: Vec<Document>,
) -> Result<Option<SimilarityIndex>, IndexError> {
    if documents.is_empty() {
        return Ok(None);
    }
    let texts: Vec<String> = documents.iter().map(Document::embedding_text).collect();
    let vectors = embedder.embed(&texts).await?;
    SimilarityIndex::from_vectors(documents, vectors)
}

/// Top-`k` documents for `query`, annotated with their similarity score.
/// An absent index is "no relevant documents", not an error.
pub async fn retrieve(
    index: Option<&SimilarityIndex>,
    embedder: &dyn Embedder,
    query: &str,
    k: usize,
) -> Result<Vec<ScoredDocument>, IndexError> {
    let Some(index) = index else {
        return Ok(Vec::new());
    };
    let k = k.min(index.len());
    if k == 0 {
        return Ok(Vec::new());
    }

    let mut q = embedder.embed_one(query).await?;
    l2_normalize(&mut q);

    let hits = index.search(&q, k)?;
    Ok(hits
        .into_iter()
        .filter_map(|(pos, score)| {
            index.document(pos).map(|d| ScoredDocument {
                document: d.clone(),
                relevance_score: score,
            })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::HashingEmbedder;

    fn doc(title: &str) -> Document {
        Document {
            title: title.into(),
            content: String::new(),
            url: format!("https://example.test/{}", title.len()),
            source: "Test".into(),
            timestamp: String::new(),
        }
    }

    #[test]
    fn vectors_are_normalized_on_insert() {
        let idx = SimilarityIndex::from_vectors(vec![doc("a")], vec![vec![2.0, 0.0]])
            .unwrap()
            .unwrap();
        let hits = idx.search(&[1.0, 0.0], 1).unwrap();
        assert!((hits[0].1 - 1.0).abs() < 1e-6);
    }

    #[test]
    fn mismatched_dimensions_are_rejected() {
        let err = SimilarityIndex::from_vectors(
            vec![doc("a"), doc("b")],
            vec![vec![1.0, 0.0], vec![1.0]],
        )
        .unwrap_err();
        assert!(matches!(err, IndexError::DimensionMismatch { .. }));
    }

    #[test]
    fn ties_keep_insertion_order() {
        let idx = SimilarityIndex::from_vectors(
            vec![doc("a"), doc("bb"), doc("ccc")],
            vec![vec![0.0, 1.0], vec![1.0, 0.0], vec![1.0, 0.0]],
        )
        .unwrap()
        .unwrap();
        let hits = idx.search(&[1.0, 0.0], 3).unwrap();
        assert_eq!(hits.iter().map(|h| h.0).collect::<Vec<_>>(), vec![1, 2, 0]);
    }

    #[tokio::test]
    async fn empty_input_builds_no_index() {
        let e = HashingEmbedder::new(32);
        assert!(build_index(&e, Vec::new()).await.unwrap().is_none());
        let out = retrieve(None, &e, "anything", 5).await.unwrap();
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn k_is_clamped_to_index_size() {
        let e = HashingEmbedder::new(384);
        let idx = build_index(&e, vec![doc("apple earnings"), doc("oil prices")])
            .await
            .unwrap();
        let out = retrieve(idx.as_ref(), &e, "apple", 10).await.unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].title, "apple earnings");
    }
}
