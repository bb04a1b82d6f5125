use super::LlmClient;
use crate::domain::error::{AppError, Result};
use crate::domain::llm_config::LlmConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f64,
    #[serde(rename = "topP", skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
    #[serde(rename = "maxOutputTokens", skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct GeminiResponse {
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: GeminiCandidateContent,
}

#[derive(Deserialize)]
struct GeminiCandidateContent {
    parts: Vec<GeminiCandidatePart>,
}

#[derive(Deserialize)]
struct GeminiCandidatePart {
    text: String,
}

pub struct GeminiClient {
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    fn api_key(config: &LlmConfig) -> Result<String> {
        config
            .api_key
            .clone()
            .ok_or_else(|| AppError::LLMError("Missing API key for Gemini provider".to_string()))
    }

    fn generate_url(config: &LlmConfig) -> Result<String> {
        let api_key = Self::api_key(config)?;
        let base_url = config.base_url.trim_end_matches('/');
        Ok(format!(
            "{}/models/{}:generateContent?key={}",
            base_url, config.model, api_key
        ))
    }

    async fn generate(&self, config: &LlmConfig, body: &GeminiRequest) -> Result<String> {
        let url = Self::generate_url(config)?;

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
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

        let json: GeminiResponse = response
            .json()
            .await
            .map_err(|e| AppError::LLMError(format!("Failed to parse JSON: {}", e)))?;

        json.candidates
            .first()
            .and_then(|candidate| candidate.content.parts.first())
            .map(|part| part.text.clone())
            .ok_or_else(|| AppError::LLMError("Invalid response format".to_string()))
    }
}

impl Default for GeminiClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn is_available(&self, config: &LlmConfig) -> bool {
        if config.api_key.is_none() {
            return false;
        }

        let probe = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: "Hello".to_string(),
                }],
            }],
            generation_config: Some(GenerationConfig {
                temperature: 0.0,
                top_p: None,
                max_output_tokens: Some(5),
            }),
        };

        match self.generate(config, &probe).await {
            Ok(_) => true,
            Err(err) => {
                warn!(error = %err, "Gemini API not available");
                false
            }
        }
    }

    async fn complete(&self, config: &LlmConfig, system: &str, user: &str) -> Result<String> {
        let mut parts = Vec::new();
        if !system.trim().is_empty() {
            parts.push(GeminiPart {
                text: system.to_string(),
            });
        }
        if !user.trim().is_empty() {
            parts.push(GeminiPart {
                text: user.to_string(),
            });
        }

        let body = GeminiRequest {
            contents: vec![GeminiContent { parts }],
            generation_config: Some(GenerationConfig {
                temperature: config.temperature.unwrap_or(1.0) as f64,
                top_p: Some(0.95),
                max_output_tokens: config.max_tokens,
            }),
        };

        self.generate(config, &body).await
    }
}

pub(crate) fn classify_transport_error(err: reqwest::Error) -> AppError {
    if err.is_timeout() {
        AppError::LLMError(format!("Provider request timed out: {}", err))
    } else if err.is_connect() {
        AppError::LLMError(format!("Provider connection failed: {}", err))
    } else {
        AppError::LLMError(format!("Request failed: {}", err))
    }
}

pub(crate) fn classify_status_error(status: reqwest::StatusCode, body: &str) -> AppError {
    match status.as_u16() {
        401 | 403 => AppError::LLMError(format!("Authentication failed ({}): {}", status, body)),
        429 => AppError::LLMError(format!("Rate limit or quota exceeded ({}): {}", status, body)),
        _ => AppError::LLMError(format!("API error ({}): {}", status, body)),
    }
}
