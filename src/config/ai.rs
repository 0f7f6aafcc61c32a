// src/config/ai.rs
use serde::{Deserialize, Serialize};
use std::env;

fn default_embedding_provider() -> String {
    "openai".to_string()
}
fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}
fn default_dimension() -> usize {
    crate::embed::hashing::DEFAULT_DIMENSION
}
fn default_generation_provider() -> String {
    "openai".to_string()
}
fn default_generation_model() -> String {
    "gpt-3.5-turbo".to_string()
}
fn default_max_tokens() -> u32 {
    250
}
fn default_temperature() -> f32 {
    0.6
}
fn default_api_key() -> String {
    "ENV".to_string()
}
fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    /// "openai" | "hashing" (case-insensitive); "openai" without a key uses hashing
    #[serde(default = "default_embedding_provider")]
    pub provider: String,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    /// Vector size for the hashing embedder; remote models define their own.
    #[serde(default = "default_dimension")]
    pub dimension: usize,
    /// "ENV" means: read from OPENAI_API_KEY
    #[serde(default = "default_api_key")]
    pub api_key: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            model: default_embedding_model(),
            dimension: default_dimension(),
            api_key: default_api_key(),
            base_url: default_base_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationSettings {
    /// "openai" | "mock" | "disabled" (case-insensitive)
    #[serde(default = "default_generation_provider")]
    pub provider: String,
    #[serde(default = "default_generation_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// "ENV" means: read from OPENAI_API_KEY
    #[serde(default = "default_api_key")]
    pub api_key: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            provider: default_generation_provider(),
            model: default_generation_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            api_key: default_api_key(),
            base_url: default_base_url(),
        }
    }
}

/// Resolve `"ENV"` to `OPENAI_API_KEY`; a missing variable resolves to "" so the
/// factories can degrade instead of refusing to boot.
fn resolve_api_key(raw: &str) -> String {
    if raw.trim().eq_ignore_ascii_case("env") {
        env::var("OPENAI_API_KEY").unwrap_or_default()
    } else {
        raw.trim().to_string()
    }
}

impl EmbeddingSettings {
    pub(crate) fn normalize(&mut self) {
        self.provider = self.provider.trim().to_lowercase();
        self.api_key = resolve_api_key(&self.api_key);
        if self.dimension == 0 {
            self.dimension = default_dimension();
        }
    }
}

impl GenerationSettings {
    pub(crate) fn normalize(&mut self) {
        self.provider = self.provider.trim().to_lowercase();
        self.api_key = resolve_api_key(&self.api_key);
        if !(0.0..=2.0).contains(&self.temperature) {
            self.temperature = default_temperature();
        }
        if self.max_tokens == 0 {
            self.max_tokens = default_max_tokens();
        }
    }
}
