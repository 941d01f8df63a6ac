use crate::config::Settings;
use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;

pub mod anthropic;
pub mod error;
pub mod gemini;
pub mod json;
pub mod prompt;

const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Gemini,
    Anthropic,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Gemini => "gemini",
            Provider::Anthropic => "anthropic",
        }
    }
}

/// Narrow text-generation contract: one prompt in, raw model text out.
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    fn provider(&self) -> Provider;

    async fn generate(&self, prompt: &str) -> anyhow::Result<String>;
}

/// Picks the configured model client, Gemini first. `None` when no credential is set, which
/// disables the model tier rather than failing.
pub fn client_from_settings(settings: &Settings) -> Option<Arc<dyn LlmClient>> {
    if settings.gemini_api_key.is_some() {
        match gemini::GeminiClient::from_settings(settings) {
            Ok(client) => return Some(Arc::new(client)),
            Err(err) => tracing::warn!(error = %err, "gemini client unavailable"),
        }
    }

    if settings.anthropic_api_key.is_some() {
        match anthropic::AnthropicClient::from_settings(settings) {
            Ok(client) => return Some(Arc::new(client)),
            Err(err) => tracing::warn!(error = %err, "anthropic client unavailable"),
        }
    }

    None
}

/// Shared by both providers. A slow model must not stall the heuristic fallback for long, so
/// the timeout is short by default (`LLM_TIMEOUT_SECS`).
pub(crate) fn http_client() -> anyhow::Result<reqwest::Client> {
    let timeout_secs = std::env::var("LLM_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(DEFAULT_TIMEOUT_SECS);

    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .context("failed to build model http client")
}

pub(crate) fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}
