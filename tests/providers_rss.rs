// tests/providers_rss.rs
use std::fs;
use std::sync::Arc;
use std::time::Duration;

use stock_rag_analyzer::embed::HashingEmbedder;
use stock_rag_analyzer::generate::MockGenerator;
use stock_rag_analyzer::ingest::providers::rss::{ItemLimits, RssFeedProvider};
use stock_rag_analyzer::ingest::types::{DocumentCollector, FeedProvider};
use stock_rag_analyzer::ingest::FeedCollector;
use stock_rag_analyzer::{AnalyzerConfig, Category, StockAnalyzer};

fn fixture_collector() -> FeedCollector {
    let yahoo = fs::read_to_string("tests/fixtures/yahoo_rss.xml").expect("yahoo fixture");
    let nasdaq = fs::read_to_string("tests/fixtures/nasdaq_rss.xml").expect("nasdaq fixture");
    FeedCollector::new(
        vec![
            Box::new(RssFeedProvider::from_fixture("Yahoo Finance", &yahoo, ItemLimits::default())),
            Box::new(RssFeedProvider::from_fixture("Nasdaq", &nasdaq, ItemLimits::default())),
        ],
        Duration::from_millis(5),
    )
}

#[tokio::test]
async fn parses_yahoo_fixture() {
    let xml = fs::read_to_string("tests/fixtures/yahoo_rss.xml").expect("fixture");
    let p = RssFeedProvider::from_fixture("Yahoo Finance", &xml, ItemLimits::default());
    let docs = p.fetch("ACME").await.expect("ok");

    // the 4-char "Acme" headline is below the minimum title length
    assert_eq!(docs.len(), 2);
    assert!(docs.iter().all(|d| d.source == "Yahoo Finance"));
    assert!(docs.iter().all(|d| d.url.starts_with("https://finance.yahoo.com/")));
    assert_eq!(docs[0].timestamp, "2024-02-05T21:05:00Z");
    assert_eq!(docs[1].content, "Two brokers raised their forecast after the results.");
}

#[tokio::test]
async fn collector_concatenates_providers_in_order() {
    let docs = fixture_collector().collect("ACME").await;
    assert_eq!(docs.len(), 4);
    assert_eq!(docs[0].source, "Yahoo Finance");
    assert_eq!(docs[3].source, "Nasdaq");
}

#[tokio::test]
async fn fixture_feeds_flow_through_the_pipeline() {
    let generator = Arc::new(MockGenerator::default());
    let a = StockAnalyzer::new(
        Arc::new(fixture_collector()),
        Arc::new(HashingEmbedder::default()),
        generator.clone(),
        AnalyzerConfig::default(),
    );
    let result = a.analyze("ACME").await;
    let report = result.report().expect("success");

    // the syndicated Nasdaq copy of the earnings story is a duplicate
    assert_eq!(report.total_articles, 3);
    assert_eq!(report.relevant_articles, 3);

    let cats: Vec<Category> = report.sections.iter().map(|s| s.category).collect();
    assert_eq!(
        cats,
        vec![
            Category::ExpertAnalysis,
            Category::FinancialPerformance,
            Category::RiskAssessment
        ]
    );
    assert_eq!(report.sources, "Yahoo Finance, Nasdaq");
    assert_eq!(generator.calls().len(), 3);
}
