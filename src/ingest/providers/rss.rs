// src/ingest/providers/rss.rs
use std::time::{Duration, Instant};

use async_trait::async_trait;
use metrics::histogram;
use quick_xml::de::from_str;
use serde::Deserialize;
use time::{
    format_description::well_known::{Rfc2822, Rfc3339},
    OffsetDateTime, UtcOffset,
};

use crate::config::CollectorSettings;
use crate::document::Document;
use crate::ingest::types::{CollectError, FeedProvider};
use crate::ingest::{normalize_text, truncate_chars};

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
}

/// Per-item filters applied while parsing a feed.
#[derive(Debug, Clone, Copy)]
pub struct ItemLimits {
    pub max_items: usize,
    pub min_title_chars: usize,
    pub max_content_chars: usize,
}

impl Default for ItemLimits {
    fn default() -> Self {
        Self::from(&CollectorSettings::default())
    }
}

impl From<&CollectorSettings> for ItemLimits {
    fn from(s: &CollectorSettings) -> Self {
        Self {
            max_items: s.max_items_per_source,
            min_title_chars: s.min_title_chars,
            max_content_chars: s.max_content_chars,
        }
    }
}

/// RFC 2822 `pubDate` → RFC 3339 UTC; `None` if unparseable.
fn rfc2822_to_rfc3339(ts: &str) -> Option<String> {
    OffsetDateTime::parse(ts.trim(), &Rfc2822)
        .ok()
        .and_then(|dt| dt.to_offset(UtcOffset::UTC).format(&Rfc3339).ok())
}

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Parse an RSS 2.0 document into documents attributed to `source`.
pub fn parse_feed(xml: &str, source: &str, limits: ItemLimits) -> Result<Vec<Document>, CollectError> {
    let t0 = Instant::now();
    let rss: Rss = from_str(xml).map_err(|e| CollectError::Parse {
        provider: source.to_string(),
        message: e.to_string(),
    })?;

    let mut out = Vec::with_capacity(rss.channel.item.len().min(limits.max_items));
    for it in rss.channel.item {
        if out.len() >= limits.max_items {
            break;
        }
        let title = normalize_text(it.title.as_deref().unwrap_or_default());
        if title.chars().count() < limits.min_title_chars {
            continue;
        }
        let content = truncate_chars(
            &normalize_text(it.description.as_deref().unwrap_or_default()),
            limits.max_content_chars,
        );
        let timestamp = it
            .pub_date
            .as_deref()
            .and_then(rfc2822_to_rfc3339)
            .unwrap_or_else(now_rfc3339);

        out.push(Document {
            title,
            content,
            url: it.link.map(|l| l.trim().to_string()).unwrap_or_default(),
            source: source.to_string(),
            timestamp,
        });
    }

    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    histogram!("collector_parse_ms").record(ms);
    Ok(out)
}

/// RSS feed provider: either a per-symbol URL template or a fixed XML body.
pub struct RssFeedProvider {
    name: String,
    limits: ItemLimits,
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http {
        url_template: String,
        client: reqwest::Client,
    },
}

impl RssFeedProvider {
    /// `{symbol}` in `url_template` is replaced by the ticker on every fetch.
    pub fn from_url_template(
        name: &str,
        url_template: &str,
        limits: ItemLimits,
        timeout: Duration,
    ) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("stock-rag-analyzer/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4))
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            name: name.to_string(),
            limits,
            mode: Mode::Http {
                url_template: url_template.to_string(),
                client,
            },
        }
    }

    /// Serve a fixed XML body (tests, demos).
    pub fn from_fixture(name: &str, xml: &str, limits: ItemLimits) -> Self {
        Self {
            name: name.to_string(),
            limits,
            mode: Mode::Fixture(xml.to_string()),
        }
    }

    pub fn url_for(&self, symbol: &str) -> Option<String> {
        match &self.mode {
            Mode::Http { url_template, .. } => Some(url_template.replace("{symbol}", symbol)),
            Mode::Fixture(_) => None,
        }
    }
}

#[async_trait]
impl FeedProvider for RssFeedProvider {
    async fn fetch(&self, symbol: &str) -> Result<Vec<Document>, CollectError> {
        match &self.mode {
            Mode::Fixture(xml) => parse_feed(xml, &self.name, self.limits),
            Mode::Http { client, .. } => {
                let url = self.url_for(symbol).unwrap_or_default();
                let resp = client.get(&url).send().await.map_err(|e| CollectError::Http {
                    provider: self.name.clone(),
                    message: e.to_string(),
                })?;
                if !resp.status().is_success() {
                    return Err(CollectError::Status {
                        provider: self.name.clone(),
                        status: resp.status().as_u16(),
                    });
                }
                let body = resp.text().await.map_err(|e| CollectError::Http {
                    provider: self.name.clone(),
                    message: e.to_string(),
                })?;
                parse_feed(&body, &self.name, self.limits)
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
