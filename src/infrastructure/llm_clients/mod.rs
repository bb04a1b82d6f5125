pub mod gemini;
pub mod openai;

use crate::domain::error::Result;
use crate::domain::llm_config::{LlmConfig, LlmProvider};
use async_trait::async_trait;
use gemini::GeminiClient;
use openai::OpenAiCompatClient;

/// Capability interface over interchangeable generative-text backends.
/// Backends differ only in endpoint URL and auth-header shape; selection
/// is configuration-driven.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Probes the backend with a minimal request. A failed probe means the
    /// caller should fall back to rule-based generation.
    async fn is_available(&self, config: &LlmConfig) -> bool;

    async fn complete(&self, config: &LlmConfig, system: &str, user: &str) -> Result<String>;
}

pub struct RouterClient {
    openai: OpenAiCompatClient,
    gemini: GeminiClient,
}

impl RouterClient {
    pub fn new() -> Self {
        Self {
            openai: OpenAiCompatClient::new(),
            gemini: GeminiClient::new(),
        }
    }
}

impl Default for RouterClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmClient for RouterClient {
    async fn is_available(&self, config: &LlmConfig) -> bool {
        match config.provider {
            LlmProvider::Gemini => self.gemini.is_available(config).await,
            // OpenAI, DeepSeek, and AIMLAPI all speak the chat/completions
            // wire shape and differ only in base URL.
            _ => self.openai.is_available(config).await,
        }
    }

    async fn complete(&self, config: &LlmConfig, system: &str, user: &str) -> Result<String> {
        match config.provider {
            LlmProvider::Gemini => self.gemini.complete(config, system, user).await,
            _ => self.openai.complete(config, system, user).await,
        }
    }
}
