//! Gemini API key provider (Generative Language API).

use anyhow::Result;
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::{Value, json};

use super::sse::GeminiSseParser;
use crate::input::CodeInput;
use crate::prompts::AnalysisRequest;
use crate::providers::shared::{
    USER_AGENT, classify_reqwest_error, resolve_api_key, resolve_base_url,
};
use crate::providers::{CompletionTransport, ProviderError, ProviderResult, ProviderStream};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini API configuration.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub max_output_tokens: Option<u32>,
}

impl GeminiConfig {
    /// Creates a new config from the config file values and environment.
    ///
    /// Authentication resolution order:
    /// 1. `config_api_key` (from `[providers.gemini]`)
    /// 2. `GEMINI_API_KEY` environment variable
    ///
    /// `GEMINI_BASE_URL` overrides `config_base_url` when set.
    ///
    /// # Errors
    /// Returns an error if no API key is available or the base URL is invalid.
    pub fn from_env(
        model: String,
        max_output_tokens: Option<u32>,
        config_base_url: Option<&str>,
        config_api_key: Option<&str>,
    ) -> Result<Self> {
        let api_key = resolve_api_key(config_api_key, "GEMINI_API_KEY", "gemini")?;
        let base_url = resolve_base_url(
            config_base_url,
            "GEMINI_BASE_URL",
            DEFAULT_BASE_URL,
            "Gemini",
        )?;

        Ok(Self {
            api_key,
            base_url,
            model,
            max_output_tokens,
        })
    }

    fn stream_url(&self) -> String {
        format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.base_url, self.model
        )
    }
}

/// Gemini streaming client.
pub struct GeminiClient {
    config: GeminiConfig,
    http: reqwest::Client,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Opens a streaming generation request.
    ///
    /// # Errors
    /// Returns a [`ProviderError`] if the request cannot be sent or the
    /// server answers with a non-success status.
    pub async fn send_stream(&self, request: &AnalysisRequest) -> ProviderResult<ProviderStream> {
        let body = build_request(request, self.config.max_output_tokens);
        let url = self.config.stream_url();
        tracing::debug!(model = %self.config.model, "opening gemini stream");

        let response = self
            .http
            .post(&url)
            .headers(build_headers(&self.config.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| classify_reqwest_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(ProviderError::http_status(status.as_u16(), &error_body));
        }

        Ok(Box::pin(GeminiSseParser::new(response.bytes_stream())))
    }
}

impl CompletionTransport for GeminiClient {
    async fn open_stream(&self, request: &AnalysisRequest) -> ProviderResult<ProviderStream> {
        self.send_stream(request).await
    }
}

/// Builds the `streamGenerateContent` request body.
pub fn build_request(request: &AnalysisRequest, max_output_tokens: Option<u32>) -> Value {
    let mut parts = vec![json!({ "text": request.text() })];
    if let CodeInput::Image(image) = &request.input {
        parts.push(json!({
            "inlineData": {
                "mimeType": image.mime_type,
                "data": image.data,
            }
        }));
    }

    let mut body = json!({
        "contents": [{
            "role": "user",
            "parts": parts,
        }],
    });
    if let Some(max) = max_output_tokens {
        body["generationConfig"] = json!({ "maxOutputTokens": max });
    }
    body
}

fn build_headers(api_key: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        "x-goog-api-key",
        HeaderValue::from_str(api_key).unwrap_or_else(|_| HeaderValue::from_static("")),
    );
    headers.insert("accept", HeaderValue::from_static("text/event-stream"));
    headers.insert("content-type", HeaderValue::from_static("application/json"));
    headers.insert("user-agent", HeaderValue::from_static(USER_AGENT));
    headers
}
