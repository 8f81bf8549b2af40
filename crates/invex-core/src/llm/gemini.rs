//! Google Gemini `generateContent` client.

use std::fmt;
use std::time::Duration;

use reqwest::StatusCode;
use serde_json::{Value, json};
use tracing::{debug, trace};

use super::{ChatModel, Result};
use crate::error::LlmError;
use crate::models::config::LlmConfig;

/// Client for a single Gemini model.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    temperature: f32,
    json_mode: bool,
}

impl fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiClient")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("temperature", &self.temperature)
            .field("json_mode", &self.json_mode)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    /// Create a client with an explicit API key.
    pub fn new(api_key: impl Into<String>, config: &LlmConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|err| LlmError::Network(err.to_string()))?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            temperature: config.temperature,
            json_mode: config.json_mode,
        })
    }

    /// Create a client reading the key from `config.api_key_env`.
    pub fn from_env(config: &LlmConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| LlmError::MissingApiKey(config.api_key_env.clone()))?;
        Self::new(api_key, config)
    }

    /// Override the model identifier.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Full URL of the generate endpoint.
    pub fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    /// JSON body for a single-turn request.
    pub fn request_body(&self, prompt: &str) -> Value {
        let mut generation_config = json!({ "temperature": self.temperature });
        if self.json_mode {
            generation_config["responseMimeType"] = json!("application/json");
        }

        json!({
            "contents": [
                {
                    "role": "user",
                    "parts": [{ "text": prompt }]
                }
            ],
            "generationConfig": generation_config
        })
    }
}

impl ChatModel for GeminiClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn invoke(&self, prompt: &str) -> Result<String> {
        debug!("Calling {} ({} prompt chars)", self.model, prompt.len());

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    LlmError::Timeout
                } else {
                    LlmError::Network(err.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, body));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|err| LlmError::InvalidResponse(err.to_string()))?;

        if let Some(usage) = body.get("usageMetadata") {
            let prompt_tokens = usage.get("promptTokenCount").and_then(Value::as_u64);
            let output_tokens = usage.get("candidatesTokenCount").and_then(Value::as_u64);
            debug!(
                "Token usage: prompt={} output={}",
                prompt_tokens.unwrap_or(0),
                output_tokens.unwrap_or(0)
            );
        }

        let text = parse_generate_response(&body)?;
        trace!("Model reply: {}", text);
        Ok(text)
    }
}

fn status_error(status: StatusCode, body: String) -> LlmError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LlmError::Auth,
        StatusCode::BAD_REQUEST if body.contains("API_KEY_INVALID") => LlmError::Auth,
        StatusCode::TOO_MANY_REQUESTS => LlmError::RateLimited,
        _ => LlmError::Status {
            status: status.as_u16(),
            body,
        },
    }
}

/// Extract the generated text from a `generateContent` response body.
///
/// Text parts of the first candidate are concatenated.
pub fn parse_generate_response(body: &Value) -> Result<String> {
    let candidate = body
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|items| items.first());

    let Some(candidate) = candidate else {
        let reason = body
            .get("promptFeedback")
            .and_then(|f| f.get("blockReason"))
            .and_then(Value::as_str);
        return Err(LlmError::InvalidResponse(match reason {
            Some(reason) => format!("prompt blocked: {reason}"),
            None => "missing text candidate".to_string(),
        }));
    };

    let text: String = candidate
        .get("content")
        .and_then(|content| content.get("parts"))
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default();

    if text.is_empty() {
        let finish = candidate
            .get("finishReason")
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        return Err(LlmError::InvalidResponse(format!(
            "candidate has no text (finish reason: {finish})"
        )));
    }

    Ok(text)
}
