//! Google Gemini provider.
//!
//! Key resolution priority:
//! 1. Explicit API key from config
//! 2. `GEMINI_API_KEY` environment variable
//! 3. `GOOGLE_API_KEY` environment variable

use super::gemini_types::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, Part,
};
use super::http_client::{build_provider_client, build_provider_client_with_timeout};
use super::sanitize_api_error;
use super::traits::{MessageRole, Provider, ProviderMessage};
use crate::error::ProviderError;
use async_trait::async_trait;
use reqwest::Client;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const MAX_OUTPUT_TOKENS: u32 = 8192;

pub struct GeminiProvider {
    api_key: Option<String>,
    base_url: String,
    client: Client,
}

impl GeminiProvider {
    pub fn new(api_key: Option<&str>) -> Self {
        let resolved_key = api_key
            .map(String::from)
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
            .or_else(|| std::env::var("GOOGLE_API_KEY").ok())
            .filter(|key| !key.trim().is_empty());

        Self {
            api_key: resolved_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            client: build_provider_client(),
        }
    }

    /// Point the provider at a different endpoint (tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Use a shorter upstream timeout (tests).
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.client = build_provider_client_with_timeout(timeout_secs);
        self
    }

    pub fn has_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn api_key(&self) -> Result<&str, ProviderError> {
        self.api_key.as_deref().ok_or(ProviderError::MissingKey)
    }

    fn model_name(model: &str) -> String {
        if model.starts_with("models/") {
            model.to_string()
        } else {
            format!("models/{model}")
        }
    }

    fn build_request(history: &[ProviderMessage], temperature: f64) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: history
                .iter()
                .map(|message| Content {
                    role: match message.role {
                        MessageRole::User => "user".to_string(),
                        MessageRole::Model => "model".to_string(),
                    },
                    parts: vec![Part {
                        text: message.text.clone(),
                    }],
                })
                .collect(),
            generation_config: GenerationConfig {
                temperature,
                max_output_tokens: MAX_OUTPUT_TOKENS,
            },
        }
    }

    fn extract_text(result: &GenerateContentResponse) -> Result<String, ProviderError> {
        let text = result
            .candidates
            .as_ref()
            .and_then(|c| c.first())
            .map(|candidate| {
                let mut out = String::new();
                for part in &candidate.content.parts {
                    if let Some(t) = &part.text {
                        if !out.is_empty() {
                            out.push('\n');
                        }
                        out.push_str(t);
                    }
                }
                out
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(ProviderError::EmptyResponse);
        }

        Ok(text)
    }

    async fn call_api(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, ProviderError> {
        let api_key = self.api_key()?;
        let model_name = Self::model_name(model);
        let url = format!(
            "{}/{model_name}:generateContent?key={api_key}",
            self.base_url
        );

        let response = self.client.post(url).json(request).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status,
                message: sanitize_api_error(&error_text),
            });
        }

        let result: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Http(e.to_string()))?;

        if let Some(err) = result.error.as_ref() {
            return Err(ProviderError::Api {
                status: err.code.unwrap_or(500),
                message: sanitize_api_error(&err.message),
            });
        }

        Ok(result)
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    async fn generate(
        &self,
        history: &[ProviderMessage],
        model: &str,
        temperature: f64,
    ) -> Result<String, ProviderError> {
        let request = Self::build_request(history, temperature);
        let result = self.call_api(model, &request).await?;
        Self::extract_text(&result)
    }

    fn name(&self) -> &str {
        "gemini"
    }
}
