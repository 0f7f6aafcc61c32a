// src/config/mod.rs
//! Analyzer configuration, loaded from TOML with env overrides.
//!
//! Lookup order:
//! 1) $ANALYZER_CONFIG_PATH (must exist)
//! 2) config/analyzer.toml
//! 3) built-in defaults

pub mod ai;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub use ai::{EmbeddingSettings, GenerationSettings};

pub const DEFAULT_CONFIG_PATH: &str = "config/analyzer.toml";
pub const ENV_CONFIG_PATH: &str = "ANALYZER_CONFIG_PATH";
pub const ENV_TEST_MODE: &str = "AI_TEST_MODE";

pub const DEFAULT_TOP_K: usize = 12;
pub const DEFAULT_QUERY_TEMPLATE: &str =
    "{symbol} stock financial analysis market performance earnings revenue";

/// `AI_TEST_MODE=mock` forces offline embedder + mock generator.
pub fn test_mode_is_mock() -> bool {
    std::env::var(ENV_TEST_MODE)
        .map(|v| v.eq_ignore_ascii_case("mock"))
        .unwrap_or(false)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    #[serde(default)]
    pub dedup: DedupSettings,
    #[serde(default)]
    pub retrieval: RetrievalSettings,
    #[serde(default)]
    pub embedding: EmbeddingSettings,
    #[serde(default)]
    pub generation: GenerationSettings,
    #[serde(default)]
    pub collector: CollectorSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupSettings {
    #[serde(default = "default_jaccard")]
    pub jaccard_threshold: f64,
}

fn default_jaccard() -> f64 {
    crate::dedup::DEFAULT_JACCARD_THRESHOLD
}

impl Default for DedupSettings {
    fn default() -> Self {
        Self {
            jaccard_threshold: default_jaccard(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalSettings {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// `{symbol}` is replaced by the upper-cased ticker.
    #[serde(default = "default_query_template")]
    pub query_template: String,
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}
fn default_query_template() -> String {
    DEFAULT_QUERY_TEMPLATE.to_string()
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            query_template: default_query_template(),
        }
    }
}

impl RetrievalSettings {
    pub fn query_for(&self, symbol: &str) -> String {
        self.query_template.replace("{symbol}", symbol)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedSettings {
    /// Value written into `Document::source`.
    pub name: String,
    /// URL template; `{symbol}` is replaced by the ticker.
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorSettings {
    #[serde(default = "default_politeness_delay_ms")]
    pub politeness_delay_ms: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_max_items")]
    pub max_items_per_source: usize,
    #[serde(default = "default_min_title_chars")]
    pub min_title_chars: usize,
    #[serde(default = "default_max_content_chars")]
    pub max_content_chars: usize,
    #[serde(default = "default_feeds")]
    pub feeds: Vec<FeedSettings>,
}

fn default_politeness_delay_ms() -> u64 {
    1_000
}
fn default_request_timeout_secs() -> u64 {
    15
}
fn default_max_items() -> usize {
    10
}
fn default_min_title_chars() -> usize {
    20
}
fn default_max_content_chars() -> usize {
    500
}
fn default_feeds() -> Vec<FeedSettings> {
    vec![
        FeedSettings {
            name: "Yahoo Finance".into(),
            url: "https://feeds.finance.yahoo.com/rss/2.0/headline?s={symbol}&region=US&lang=en-US"
                .into(),
        },
        FeedSettings {
            name: "Nasdaq".into(),
            url: "https://www.nasdaq.com/feed/rssoutbound?symbol={symbol}".into(),
        },
    ]
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self {
            politeness_delay_ms: default_politeness_delay_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            max_items_per_source: default_max_items(),
            min_title_chars: default_min_title_chars(),
            max_content_chars: default_max_content_chars(),
            feeds: default_feeds(),
        }
    }
}

impl AnalyzerConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let mut cfg: AnalyzerConfig = toml::from_str(s).context("parsing analyzer config")?;
        cfg.sanitize();
        Ok(cfg)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading analyzer config from {}", path.display()))?;
        Self::from_toml_str(&data)
    }

    /// Env var, then the default path, then built-in defaults.
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            return Self::load_from_file(&pb);
        }
        let default_path = PathBuf::from(DEFAULT_CONFIG_PATH);
        if default_path.exists() {
            return Self::load_from_file(&default_path);
        }
        let mut cfg = Self::default();
        cfg.sanitize();
        Ok(cfg)
    }

    fn sanitize(&mut self) {
        if !(0.0..=1.0).contains(&self.dedup.jaccard_threshold) {
            self.dedup.jaccard_threshold = default_jaccard();
        }
        if self.retrieval.top_k == 0 {
            self.retrieval.top_k = default_top_k();
        }
        if !self.retrieval.query_template.contains("{symbol}") {
            tracing::warn!("retrieval.query_template has no {{symbol}} placeholder");
        }
        self.embedding.normalize();
        self.generation.normalize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn empty_toml_gives_defaults() {
        let cfg = AnalyzerConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.dedup.jaccard_threshold, 0.7);
        assert_eq!(cfg.retrieval.top_k, 12);
        assert_eq!(cfg.generation.max_tokens, 250);
        assert_eq!(cfg.collector.feeds.len(), 2);
        assert_eq!(
            cfg.retrieval.query_for("AAPL"),
            "AAPL stock financial analysis market performance earnings revenue"
        );
    }

    #[test]
    fn sections_override_and_sanitize() {
        let toml = r#"
            [dedup]
            jaccard_threshold = 3.0

            [retrieval]
            top_k = 0

            [generation]
            provider = "MOCK"
            temperature = 0.2

            [[collector.feeds]]
            name = "Local"
            url = "http://localhost/{symbol}.xml"
        "#;
        let cfg = AnalyzerConfig::from_toml_str(toml).unwrap();
        assert_eq!(cfg.dedup.jaccard_threshold, 0.7);
        assert_eq!(cfg.retrieval.top_k, 12);
        assert_eq!(cfg.generation.provider, "mock");
        assert_eq!(cfg.generation.temperature, 0.2);
        assert_eq!(cfg.collector.feeds.len(), 1);
        assert_eq!(cfg.collector.politeness_delay_ms, 1_000);
    }

    #[serial_test::serial]
    #[test]
    fn env_path_takes_precedence() {
        let tmp = tempfile::tempdir().unwrap();
        let p = tmp.path().join("analyzer.toml");
        fs::write(&p, "[retrieval]\ntop_k = 5\n").unwrap();

        env::set_var(ENV_CONFIG_PATH, p.display().to_string());
        let cfg = AnalyzerConfig::load_default().unwrap();
        assert_eq!(cfg.retrieval.top_k, 5);

        env::set_var(ENV_CONFIG_PATH, tmp.path().join("missing.toml").display().to_string());
        assert!(AnalyzerConfig::load_default().is_err());
        env::remove_var(ENV_CONFIG_PATH);
    }
}
