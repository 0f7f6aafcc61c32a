// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod analysis;
pub mod api;
pub mod categorize;
pub mod config;
pub mod dedup;
pub mod document;
pub mod embed;
pub mod generate;
pub mod index;
pub mod ingest;
pub mod metrics;
pub mod pipeline;

// ---- Re-exports for stable public API ----
pub use crate::analysis::{AnalysisError, AnalysisReport, AnalysisResult, CategorySection};
pub use crate::api::router;
pub use crate::categorize::Category;
pub use crate::config::AnalyzerConfig;
pub use crate::document::{Document, ScoredDocument};
pub use crate::pipeline::StockAnalyzer;

use axum::Router;

/// Full in-process app: config from disk/env, analyzer, `/metrics` when the
/// Prometheus recorder could be installed.
pub async fn app() -> anyhow::Result<Router> {
    let cfg = AnalyzerConfig::load_default()?;
    let analyzer = StockAnalyzer::from_config(cfg);
    let mut router = api::router(api::AppState::new(analyzer));
    if let Some(m) = crate::metrics::Metrics::global() {
        router = router.merge(m.router());
    }
    Ok(router)
}
