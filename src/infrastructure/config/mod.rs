use crate::domain::error::{AppError, Result};
use crate::domain::llm_config::{LlmConfig, LlmProvider};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

/// Process-wide settings, loaded once and immutable afterwards. Injected
/// into constructors; there is no global mutable singleton.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Which generative backend to use: "gemini", "openai", "deepseek", "aimlapi".
    pub ai_provider: String,

    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: String,

    pub deepseek_api_key: Option<String>,
    pub deepseek_model: String,
    pub deepseek_base_url: String,

    pub aimlapi_api_key: Option<String>,
    pub aimlapi_model: String,
    pub aimlapi_base_url: String,

    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,

    pub ai_max_tokens: u32,
    pub ai_temperature: f32,
    pub ai_timeout_secs: u64,

    pub max_concurrent_tests: usize,
    pub test_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ai_provider: "gemini".to_string(),
            openai_api_key: None,
            openai_model: "gpt-3.5-turbo".to_string(),
            openai_base_url: "https://api.openai.com/v1".to_string(),
            deepseek_api_key: None,
            deepseek_model: "deepseek-chat".to_string(),
            deepseek_base_url: "https://api.deepseek.com".to_string(),
            aimlapi_api_key: None,
            aimlapi_model: "gpt-3.5-turbo".to_string(),
            aimlapi_base_url: "https://api.aimlapi.com/v1".to_string(),
            gemini_api_key: None,
            gemini_model: "gemini-2.0-flash".to_string(),
            gemini_base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            ai_max_tokens: 1000,
            ai_temperature: 0.7,
            ai_timeout_secs: 30,
            max_concurrent_tests: 10,
            test_timeout_secs: 30,
        }
    }
}

impl Settings {
    /// Loads settings from defaults, an optional `apiforge.toml`, and
    /// `APIFORGE_`-prefixed environment variables, in increasing precedence.
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file("apiforge.toml"))
            .merge(Env::prefixed("APIFORGE_"))
            .extract()
            .map_err(|e| AppError::ValidationError(format!("Failed to load settings: {}", e)))
    }

    /// Resolves the provider-specific connection parameters for the
    /// configured backend.
    pub fn llm_config(&self) -> LlmConfig {
        let (provider, base_url, model, api_key) = match self.ai_provider.as_str() {
            "openai" => (
                LlmProvider::OpenAi,
                self.openai_base_url.clone(),
                self.openai_model.clone(),
                self.openai_api_key.clone(),
            ),
            "deepseek" => (
                LlmProvider::DeepSeek,
                self.deepseek_base_url.clone(),
                self.deepseek_model.clone(),
                self.deepseek_api_key.clone(),
            ),
            "aimlapi" => (
                LlmProvider::AimlApi,
                self.aimlapi_base_url.clone(),
                self.aimlapi_model.clone(),
                self.aimlapi_api_key.clone(),
            ),
            _ => (
                LlmProvider::Gemini,
                self.gemini_base_url.clone(),
                self.gemini_model.clone(),
                self.gemini_api_key.clone(),
            ),
        };

        LlmConfig {
            provider,
            base_url,
            model,
            api_key,
            max_tokens: Some(self.ai_max_tokens),
            temperature: Some(self.ai_temperature),
            timeout_secs: self.ai_timeout_secs,
        }
    }
}
