// src/pipeline.rs
//! # Analysis orchestrator
//! collect → dedupe → index → retrieve → categorize → generate → assemble.
//!
//! Stages run strictly one after another; category generation is awaited in
//! declaration order, one call at a time. Only "no documents after dedup" is
//! fatal. Index/embedding failures degrade to "no relevant documents" and a
//! failed generation only affects its own category.

use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::analysis::{AnalysisError, AnalysisReport, AnalysisResult, CategorySection};
use crate::categorize::{categorize, Category};
use crate::config::AnalyzerConfig;
use crate::dedup::dedupe_with_threshold;
use crate::document::ScoredDocument;
use crate::embed::{build_embedder, DynEmbedder};
use crate::generate::{build_generator, DynGenerator, GenerationRequest};
use crate::index::{build_index, retrieve};
use crate::ingest::{DynCollector, FeedCollector};

pub const SYSTEM_INSTRUCTION_PREFIX: &str = "You are a professional financial analyst providing objective analysis based on recent news from reputable financial sources.";
pub const WORD_BUDGET: &str = "150-200 words";

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("analysis_requests_total", "Analysis requests started.");
        describe_counter!(
            "analysis_failures_total",
            "Analysis requests that ended without documents."
        );
        describe_counter!("dedup_removed_total", "Documents dropped as near-duplicates.");
        describe_counter!(
            "retrieval_empty_total",
            "Requests where index build or retrieval degraded to no documents."
        );
        describe_counter!(
            "generation_errors_total",
            "Per-category generation failures."
        );
        describe_histogram!("analysis_duration_ms", "End-to-end analysis time in milliseconds.");
    });
}

/// Trimmed, upper-cased ticker; `None` if blank.
pub fn normalize_symbol(raw: &str) -> Option<String> {
    let s = raw.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_uppercase())
    }
}

/// `Source/Headline/Content` blocks, one per document, in rank order.
pub fn build_context(documents: &[ScoredDocument]) -> String {
    let mut context = String::new();
    for d in documents {
        context.push_str(&format!(
            "Source: {}\nHeadline: {}\nContent: {}\n\n",
            d.source, d.title, d.content
        ));
    }
    context
}

pub fn build_generation_request(
    category: Category,
    symbol: &str,
    documents: &[ScoredDocument],
    max_tokens: u32,
    temperature: f32,
) -> GenerationRequest {
    let user_prompt = format!(
        "{task}\n\nRecent Information:\n{context}\nWrite a focused analysis ({WORD_BUDGET}) that synthesizes the information for this specific category. Include specific data points, quotes, and insights from the sources. Reference the sources naturally within the text.\n\nAnalysis:",
        task = category.prompt(symbol),
        context = build_context(documents),
    );
    GenerationRequest {
        system_instruction: format!(
            "{SYSTEM_INSTRUCTION_PREFIX} Focus on the specific category: {}.",
            category.title()
        ),
        user_prompt,
        max_tokens,
        temperature,
    }
}

/// Process-lifetime analyzer; collaborators are shared, read-only singletons.
#[derive(Clone)]
pub struct StockAnalyzer {
    collector: DynCollector,
    embedder: DynEmbedder,
    generator: DynGenerator,
    config: Arc<AnalyzerConfig>,
}

impl StockAnalyzer {
    pub fn new(
        collector: DynCollector,
        embedder: DynEmbedder,
        generator: DynGenerator,
        config: AnalyzerConfig,
    ) -> Self {
        Self {
            collector,
            embedder,
            generator,
            config: Arc::new(config),
        }
    }

    /// RSS collector + configured embedder and generator.
    pub fn from_config(config: AnalyzerConfig) -> Self {
        let collector: DynCollector = Arc::new(FeedCollector::from_settings(&config.collector));
        let embedder = build_embedder(&config.embedding);
        let generator = build_generator(&config.generation);
        info!(
            embedder = embedder.name(),
            generator = generator.provider_name(),
            feeds = config.collector.feeds.len(),
            "analyzer configured"
        );
        Self::new(collector, embedder, generator, config)
    }

    /// Run the whole pipeline. Always returns a well-formed result.
    pub async fn analyze(&self, symbol: &str) -> AnalysisResult {
        ensure_metrics_described();
        counter!("analysis_requests_total").increment(1);
        let t0 = Instant::now();

        let result = self.run(symbol).await;
        if let Err(e) = &result {
            counter!("analysis_failures_total").increment(1);
            warn!(symbol, error = %e, "analysis failed");
        }

        histogram!("analysis_duration_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        result.into()
    }

    async fn run(&self, raw_symbol: &str) -> Result<AnalysisReport, AnalysisError> {
        let symbol = normalize_symbol(raw_symbol).ok_or(AnalysisError::EmptySymbol)?;

        // collecting
        let raw = self.collector.collect(&symbol).await;
        let raw_count = raw.len();

        // deduping
        let documents = dedupe_with_threshold(raw, self.config.dedup.jaccard_threshold);
        let total_articles = documents.len();
        counter!("dedup_removed_total").increment((raw_count - total_articles) as u64);
        info!(symbol = %symbol, raw = raw_count, total = total_articles, "documents collected");

        if documents.is_empty() {
            return Err(AnalysisError::NoDocumentsFound { symbol });
        }

        // indexing (over the full deduplicated set)
        let index = match build_index(self.embedder.as_ref(), documents).await {
            Ok(idx) => idx,
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "index build failed; continuing without documents");
                counter!("retrieval_empty_total").increment(1);
                None
            }
        };

        // retrieving
        let query = self.config.retrieval.query_for(&symbol);
        let k = total_articles.min(self.config.retrieval.top_k);
        let retrieved = match retrieve(index.as_ref(), self.embedder.as_ref(), &query, k).await {
            Ok(docs) => docs,
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "retrieval failed; continuing without documents");
                counter!("retrieval_empty_total").increment(1);
                Vec::new()
            }
        };
        let relevant_articles = retrieved.len();
        debug!(symbol = %symbol, k, retrieved = relevant_articles, "retrieval done");

        // categorizing
        let categorized = categorize(retrieved);

        // generating, one category at a time
        let settings = &self.config.generation;
        let mut sections = Vec::new();
        for (category, docs) in categorized.non_empty() {
            let request = build_generation_request(
                category,
                &symbol,
                docs,
                settings.max_tokens,
                settings.temperature,
            );
            let outcome = self.generator.generate(&request).await;
            match &outcome {
                Ok(_) => {
                    let ids: Vec<String> = docs.iter().map(|d| d.short_id()).collect();
                    debug!(symbol = %symbol, category = category.key(), ids = ?ids, "category generated");
                }
                Err(e) => {
                    counter!("generation_errors_total").increment(1);
                    warn!(symbol = %symbol, category = category.key(), error = %e, "generation failed");
                }
            }
            sections.push(CategorySection { category, outcome });
        }

        // assembling
        let sources = categorized.distinct_sources().join(", ");
        info!(
            symbol = %symbol,
            total = total_articles,
            relevant = relevant_articles,
            sections = sections.len(),
            "analysis assembled"
        );

        Ok(AnalysisReport {
            symbol,
            sections,
            sources,
            total_articles,
            relevant_articles,
        })
    }
}
