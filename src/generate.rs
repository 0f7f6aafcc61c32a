//! Text generation adapter: provider abstraction over a chat-completion API.
//! The orchestrator treats every provider as an opaque `(system, user) -> text` call.

use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::GenerationSettings;
use crate::ingest::truncate_chars;

// ------------------------------------------------------------
// Public surface
// ------------------------------------------------------------

/// One generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub system_instruction: String,
    pub user_prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerationError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("provider returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("provider returned an empty completion")]
    Empty,
    #[error("text generation is disabled")]
    Disabled,
    #[error("{0}")]
    Provider(String),
}

pub type GenerationFuture<'a> =
    Pin<Box<dyn Future<Output = Result<String, GenerationError>> + Send + 'a>>;

/// Trait object shared by the analyzer for the process lifetime.
pub trait TextGenerator: Send + Sync {
    fn generate<'a>(&'a self, request: &'a GenerationRequest) -> GenerationFuture<'a>;
    /// Provider name for diagnostics.
    fn provider_name(&self) -> &'static str;
}

pub type DynGenerator = Arc<dyn TextGenerator>;

/// Factory: build a generator according to config and environment variables.
///
/// * If `AI_TEST_MODE=mock`, returns a deterministic mock generator.
/// * Else `"openai"` with a key builds the real provider.
/// * Anything else (or a missing key) yields a disabled generator.
pub fn build_generator(settings: &GenerationSettings) -> DynGenerator {
    if crate::config::test_mode_is_mock() {
        return Arc::new(MockGenerator::default());
    }

    match settings.provider.as_str() {
        "openai" if !settings.api_key.is_empty() => Arc::new(OpenAiGenerator::new(
            settings.api_key.clone(),
            settings.model.clone(),
            settings.base_url.clone(),
        )),
        "openai" => {
            tracing::warn!("generation provider 'openai' has no API key; generation disabled");
            Arc::new(DisabledGenerator)
        }
        "mock" => Arc::new(MockGenerator::default()),
        _ => Arc::new(DisabledGenerator),
    }
}

// ------------------------------------------------------------
// Providers
// ------------------------------------------------------------

/// OpenAI provider (Chat Completions API).
pub struct OpenAiGenerator {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiGenerator {
    pub fn new(api_key: String, model: String, base_url: String) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(concat!("stock-rag-analyzer/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_default();
        Self {
            http,
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn generate_impl(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }
        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
            temperature: f32,
            max_tokens: u32,
        }
        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: ChoiceMsg,
        }
        #[derive(Deserialize)]
        struct ChoiceMsg {
            #[serde(default)]
            content: Option<String>,
        }

        let req = Req {
            model: &self.model,
            messages: vec![
                Msg {
                    role: "system",
                    content: &request.system_instruction,
                },
                Msg {
                    role: "user",
                    content: &request.user_prompt,
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let resp = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body: truncate_chars(&body, 200),
            });
        }

        let body: Resp = resp
            .json()
            .await
            .map_err(|e| GenerationError::Transport(format!("response parse error: {e}")))?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Err(GenerationError::Empty);
        }
        Ok(trimmed.to_string())
    }
}

impl TextGenerator for OpenAiGenerator {
    fn generate<'a>(&'a self, request: &'a GenerationRequest) -> GenerationFuture<'a> {
        Box::pin(self.generate_impl(request))
    }
    fn provider_name(&self) -> &'static str {
        "openai"
    }
}

/// Always fails; used when generation is disabled.
pub struct DisabledGenerator;

impl TextGenerator for DisabledGenerator {
    fn generate<'a>(&'a self, _request: &'a GenerationRequest) -> GenerationFuture<'a> {
        Box::pin(async { Err(GenerationError::Disabled) })
    }
    fn provider_name(&self) -> &'static str {
        "disabled"
    }
}

/// Deterministic generator for tests and local runs.
///
/// Echoes the focus named in the system instruction. Requests whose system
/// instruction contains one of `fail_on` fail with a provider error.
#[derive(Default)]
pub struct MockGenerator {
    fail_on: HashSet<String>,
    calls: Mutex<Vec<GenerationRequest>>,
}

impl MockGenerator {
    pub fn failing_on<I, S>(needles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fail_on: needles.into_iter().map(Into::into).collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Requests seen so far, in call order.
    pub fn calls(&self) -> Vec<GenerationRequest> {
        self.calls
            .lock()
            .map(|g| g.clone())
            .unwrap_or_default()
    }
}

impl TextGenerator for MockGenerator {
    fn generate<'a>(&'a self, request: &'a GenerationRequest) -> GenerationFuture<'a> {
        if let Ok(mut g) = self.calls.lock() {
            g.push(request.clone());
        }
        let failing = self
            .fail_on
            .iter()
            .any(|n| request.system_instruction.contains(n.as_str()));
        let focus = request
            .system_instruction
            .rsplit("category: ")
            .next()
            .unwrap_or_default()
            .trim_end_matches('.')
            .to_string();
        Box::pin(async move {
            if failing {
                Err(GenerationError::Provider("mock quota exceeded".into()))
            } else {
                Ok(format!("Mock analysis for {focus}."))
            }
        })
    }
    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(system: &str) -> GenerationRequest {
        GenerationRequest {
            system_instruction: system.into(),
            user_prompt: "prompt".into(),
            max_tokens: 250,
            temperature: 0.6,
        }
    }

    #[tokio::test]
    async fn disabled_generator_fails() {
        let g = DisabledGenerator;
        assert_eq!(
            g.generate(&req("x")).await,
            Err(GenerationError::Disabled)
        );
    }

    #[tokio::test]
    async fn mock_echoes_focus_and_records_calls() {
        let g = MockGenerator::default();
        let out = g
            .generate(&req("Focus on the specific category: Market Sentiment."))
            .await
            .unwrap();
        assert_eq!(out, "Mock analysis for Market Sentiment.");
        assert_eq!(g.calls().len(), 1);
    }

    #[tokio::test]
    async fn mock_fails_on_configured_needle() {
        let g = MockGenerator::failing_on(["Risk Assessment"]);
        let err = g
            .generate(&req("Focus on the specific category: Risk Assessment."))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("mock quota exceeded"));
    }

    #[tokio::test]
    async fn openai_transport_error_is_reported() {
        // Port 9 (discard) on loopback is not listening in CI sandboxes.
        let g = OpenAiGenerator::new("k".into(), "m".into(), "http://127.0.0.1:9".into());
        let err = g.generate(&req("x")).await.unwrap_err();
        assert!(matches!(err, GenerationError::Transport(_)));
    }
}
