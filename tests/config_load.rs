// tests/config_load.rs
use std::{env, fs};

use stock_rag_analyzer::config::{AnalyzerConfig, ENV_CONFIG_PATH, ENV_TEST_MODE};
use stock_rag_analyzer::embed::build_embedder;
use stock_rag_analyzer::generate::build_generator;

#[test]
fn repo_config_file_parses() {
    let cfg = AnalyzerConfig::load_from_file("config/analyzer.toml").expect("config/analyzer.toml");
    assert_eq!(cfg.dedup.jaccard_threshold, 0.7);
    assert_eq!(cfg.retrieval.top_k, 12);
    assert!(cfg.retrieval.query_template.contains("{symbol}"));
    assert!(!cfg.collector.feeds.is_empty());
}

#[serial_test::serial]
#[test]
fn mock_mode_selects_offline_collaborators() {
    env::set_var(ENV_TEST_MODE, "mock");
    let cfg = AnalyzerConfig::default();
    assert_eq!(build_embedder(&cfg.embedding).name(), "hashing");
    assert_eq!(build_generator(&cfg.generation).provider_name(), "mock");
    env::remove_var(ENV_TEST_MODE);
}

#[serial_test::serial]
#[test]
fn openai_without_key_degrades() {
    env::remove_var(ENV_TEST_MODE);
    let toml = r#"
        [embedding]
        provider = "openai"
        api_key = ""

        [generation]
        provider = "openai"
        api_key = ""
    "#;
    let tmp = tempfile::tempdir().unwrap();
    let p = tmp.path().join("analyzer.toml");
    fs::write(&p, toml).unwrap();
    env::set_var(ENV_CONFIG_PATH, p.display().to_string());

    let cfg = AnalyzerConfig::load_default().unwrap();
    env::remove_var(ENV_CONFIG_PATH);

    assert_eq!(build_embedder(&cfg.embedding).name(), "hashing");
    assert_eq!(build_generator(&cfg.generation).provider_name(), "disabled");
}
