use super::gemini::{classify_status_error, classify_transport_error};
use super::LlmClient;
use crate::domain::error::{AppError, Result};
use crate::domain::llm_config::LlmConfig;
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;
use tracing::warn;

/// Client for any backend speaking the OpenAI `chat/completions` wire shape
/// (OpenAI, DeepSeek, AIMLAPI). Only base URL and API key differ.
pub struct OpenAiCompatClient {
    client: reqwest::Client,
}

impl OpenAiCompatClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    fn api_key(config: &LlmConfig) -> Result<String> {
        config.api_key.clone().ok_or_else(|| {
            AppError::LLMError(format!("Missing API key for {:?} provider", config.provider))
        })
    }

    fn completions_url(config: &LlmConfig) -> String {
        let base_url = config.base_url.trim_end_matches('/');
        format!("{}/chat/completions", base_url)
    }

    async fn chat(&self, config: &LlmConfig, body: &serde_json::Value) -> Result<String> {
        let api_key = Self::api_key(config)?;
        let url = Self::completions_url(config);

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .timeout(Duration::from_secs(config.timeout_secs))
            .json(body)
            .send()
            .await
            .map_err(classify_transport_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(classify_status_error(status, &text));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AppError::LLMError(format!("Failed to parse JSON: {}", e)))?;

        json["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| AppError::LLMError("Invalid response format".to_string()))
    }
}

impl Default for OpenAiCompatClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmClient for OpenAiCompatClient {
    async fn is_available(&self, config: &LlmConfig) -> bool {
        if config.api_key.is_none() {
            return false;
        }

        let probe = json!({
            "model": config.model,
            "messages": [{"role": "user", "content": "test"}],
            "max_tokens": 5,
        });

        match self.chat(config, &probe).await {
            Ok(_) => true,
            Err(err) => {
                warn!(provider = ?config.provider, error = %err, "Provider not available");
                false
            }
        }
    }

    async fn complete(&self, config: &LlmConfig, system: &str, user: &str) -> Result<String> {
        let body = json!({
            "model": config.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user}
            ],
            "max_tokens": config.max_tokens,
            "temperature": config.temperature,
        });

        self.chat(config, &body).await
    }
}
