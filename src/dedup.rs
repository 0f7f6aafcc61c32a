// src/dedup.rs
//! Near-duplicate removal by title-token Jaccard similarity.
//!
//! A document is dropped when its normalized title collides with *any*
//! previously accepted title (`jaccard > threshold`). First occurrence wins.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::document::Document;

pub const DEFAULT_JACCARD_THRESHOLD: f64 = 0.7;

static RE_NON_ALNUM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9\s]").expect("title normalization regex"));

/// Lower-case and strip everything outside `[a-z0-9]` and whitespace.
pub fn normalize_title(title: &str) -> String {
    RE_NON_ALNUM
        .replace_all(&title.to_lowercase(), "")
        .into_owned()
}

/// Whitespace-separated word set of a normalized title.
pub fn title_tokens(title: &str) -> HashSet<String> {
    normalize_title(title)
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// `|a ∩ b| / |a ∪ b|`; an empty set never matches anything (returns 0).
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let inter = a.intersection(b).count();
    let union = a.len() + b.len() - inter;
    inter as f64 / union as f64
}

/// Order-preserving dedupe with the default 0.7 threshold.
pub fn dedupe(documents: Vec<Document>) -> Vec<Document> {
    dedupe_with_threshold(documents, DEFAULT_JACCARD_THRESHOLD)
}

pub fn dedupe_with_threshold(documents: Vec<Document>, threshold: f64) -> Vec<Document> {
    let mut accepted: Vec<HashSet<String>> = Vec::with_capacity(documents.len());
    let mut keep = Vec::with_capacity(documents.len());

    for doc in documents {
        let tokens = title_tokens(&doc.title);
        let is_duplicate = accepted.iter().any(|seen| jaccard(&tokens, seen) > threshold);
        if is_duplicate {
            tracing::debug!(source = %doc.source, id = %doc.short_id(), "dropping near-duplicate title");
            continue;
        }
        accepted.push(tokens);
        keep.push(doc);
    }

    keep
}
