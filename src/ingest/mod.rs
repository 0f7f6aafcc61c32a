// src/ingest/mod.rs
pub mod providers;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use metrics::{counter, describe_counter, describe_histogram};
use once_cell::sync::OnceCell;

use crate::config::CollectorSettings;
use crate::document::Document;
use crate::ingest::providers::rss::{ItemLimits, RssFeedProvider};
use crate::ingest::types::{DocumentCollector, FeedProvider};

pub type DynCollector = Arc<dyn DocumentCollector>;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "collector_documents_total",
            "Documents returned by feed providers."
        );
        describe_counter!(
            "collector_provider_errors_total",
            "Provider fetch/parse errors."
        );
        describe_histogram!("collector_parse_ms", "Feed parse time in milliseconds.");
    });
}

/// Normalize text: decode entities, strip tags, collapse whitespace, trim.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| {
        regex::Regex::new(r"(?is)</?[^>]+>").expect("tag regex")
    });
    out = re_tags.replace_all(&out, " ").to_string();

    // 3) Normalize “ ” ‘ ’ « » to ASCII quotes
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").expect("ws regex"));
    re_ws.replace_all(&out, " ").trim().to_string()
}

/// Keep at most `max` chars.
pub fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        s.chars().take(max).collect()
    } else {
        s.to_string()
    }
}

/// Queries providers one after another with a fixed politeness delay between
/// them. Provider failures are logged and skipped.
pub struct FeedCollector {
    providers: Vec<Box<dyn FeedProvider>>,
    politeness_delay: Duration,
}

impl FeedCollector {
    pub fn new(providers: Vec<Box<dyn FeedProvider>>, politeness_delay: Duration) -> Self {
        Self {
            providers,
            politeness_delay,
        }
    }

    /// RSS providers for every configured feed.
    pub fn from_settings(settings: &CollectorSettings) -> Self {
        let limits = ItemLimits::from(settings);
        let timeout = Duration::from_secs(settings.request_timeout_secs.max(1));
        let providers = settings
            .feeds
            .iter()
            .map(|f| {
                Box::new(RssFeedProvider::from_url_template(
                    &f.name, &f.url, limits, timeout,
                )) as Box<dyn FeedProvider>
            })
            .collect();
        Self::new(
            providers,
            Duration::from_millis(settings.politeness_delay_ms),
        )
    }

    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }
}

#[async_trait]
impl DocumentCollector for FeedCollector {
    async fn collect(&self, symbol: &str) -> Vec<Document> {
        ensure_metrics_described();

        let mut raw = Vec::new();
        for (i, p) in self.providers.iter().enumerate() {
            if i > 0 && !self.politeness_delay.is_zero() {
                tokio::time::sleep(self.politeness_delay).await;
            }
            match p.fetch(symbol).await {
                Ok(mut v) => {
                    tracing::info!(provider = p.name(), symbol, count = v.len(), "feed fetched");
                    counter!("collector_documents_total").increment(v.len() as u64);
                    raw.append(&mut v);
                }
                Err(e) => {
                    tracing::warn!(error = %e, provider = p.name(), symbol, "provider error");
                    counter!("collector_provider_errors_total").increment(1);
                }
            }
        }
        raw
    }
}

/// Fixed document list, regardless of symbol.
#[derive(Debug, Clone, Default)]
pub struct StaticCollector {
    documents: Vec<Document>,
}

impl StaticCollector {
    pub fn new(documents: Vec<Document>) -> Self {
        Self { documents }
    }
}

#[async_trait]
impl DocumentCollector for StaticCollector {
    async fn collect(&self, _symbol: &str) -> Vec<Document> {
        self.documents.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::CollectError;

    #[test]
    fn normalize_text_decodes_and_collapses() {
        let s = "  <b>Hello,&nbsp;&nbsp;</b> &ldquo;world&rdquo;  ";
        assert_eq!(normalize_text(s), r#"Hello, "world""#);
    }

    #[test]
    fn truncate_counts_chars_not_bytes() {
        assert_eq!(truncate_chars("ééé", 2), "éé");
        assert_eq!(truncate_chars("ab", 5), "ab");
    }

    struct Fails;

    #[async_trait]
    impl FeedProvider for Fails {
        async fn fetch(&self, _symbol: &str) -> Result<Vec<Document>, CollectError> {
            Err(CollectError::Status {
                provider: "Fails".into(),
                status: 503,
            })
        }
        fn name(&self) -> &str {
            "Fails"
        }
    }

    struct One;

    #[async_trait]
    impl FeedProvider for One {
        async fn fetch(&self, symbol: &str) -> Result<Vec<Document>, CollectError> {
            Ok(vec![Document {
                title: format!("{symbol} headline"),
                content: String::new(),
                url: "https://example.test/1".into(),
                source: "One".into(),
                timestamp: "2024-01-01T00:00:00Z".into(),
            }])
        }
        fn name(&self) -> &str {
            "One"
        }
    }

    #[tokio::test]
    async fn provider_errors_are_skipped() {
        let c = FeedCollector::new(vec![Box::new(Fails), Box::new(One)], Duration::ZERO);
        let docs = c.collect("MSFT").await;
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].title, "MSFT headline");
    }

    #[test]
    fn from_settings_builds_one_provider_per_feed() {
        let c = FeedCollector::from_settings(&CollectorSettings::default());
        assert_eq!(c.provider_count(), 2);
    }
}
