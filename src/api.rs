// src/api.rs
//! HTTP surface: `/health` and `/analyze`.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::analysis::{AnalysisError, AnalysisResult};
use crate::pipeline::StockAnalyzer;

#[derive(Clone)]
pub struct AppState {
    analyzer: Arc<StockAnalyzer>,
}

impl AppState {
    pub fn new(analyzer: StockAnalyzer) -> Self {
        Self {
            analyzer: Arc::new(analyzer),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/analyze", post(analyze))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(serde::Deserialize)]
struct AnalyzeReq {
    #[serde(default)]
    symbol: String,
}

/// Always 200 with a well-formed result; malformed bodies become `success:false`.
async fn analyze(
    State(state): State<AppState>,
    body: Result<Json<AnalyzeReq>, JsonRejection>,
) -> Json<AnalysisResult> {
    let symbol = match body {
        Ok(Json(req)) => req.symbol,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "rejected /analyze body");
            return Json(AnalysisResult::Failure(AnalysisError::EmptySymbol));
        }
    };
    Json(state.analyzer.analyze(&symbol).await)
}
