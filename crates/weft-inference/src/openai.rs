//! OpenAI-compatible chat-completions backend.
//!
//! The scoring service is any endpoint speaking the `/chat/completions`
//! shape: a local Ollama in OpenAI-compat mode, a hosted router, or the
//! real thing. The bearer key is optional for local servers.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use weft_core::{defaults, Error, GenerationBackend, Result};

/// Default chat-completions endpoint (local Ollama, OpenAI-compat mode).
pub const DEFAULT_AI_URL: &str = "http://localhost:11434/v1/chat/completions";

/// Default generation model.
pub const DEFAULT_AI_MODEL: &str = "llama3.2";

/// Placeholder key sent to local servers that ignore authentication.
const LOCAL_API_KEY: &str = "ollama";

/// OpenAI-compatible inference backend.
pub struct OpenAiBackend {
    client: Client,
    url: String,
    model: String,
    api_key: String,
    timeout_secs: u64,
}

impl OpenAiBackend {
    /// Create a backend with default settings.
    pub fn new() -> Self {
        Self::with_config(
            DEFAULT_AI_URL.to_string(),
            DEFAULT_AI_MODEL.to_string(),
            None,
            defaults::AI_TIMEOUT_SECS,
        )
    }

    /// Create a backend with custom configuration.
    pub fn with_config(
        url: String,
        model: String,
        api_key: Option<String>,
        timeout_secs: u64,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        info!("Initializing AI backend: url={}, model={}", url, model);

        Self {
            client,
            url,
            model,
            api_key: api_key.unwrap_or_else(|| LOCAL_API_KEY.to_string()),
            timeout_secs,
        }
    }

    /// Create from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `WEFT_AI_URL` | local Ollama chat-completions endpoint |
    /// | `WEFT_AI_MODEL` | `llama3.2` |
    /// | `WEFT_AI_KEY` | none (local placeholder) |
    /// | `WEFT_AI_TIMEOUT_SECS` | 180 |
    pub fn from_env() -> Self {
        let url = std::env::var("WEFT_AI_URL").unwrap_or_else(|_| DEFAULT_AI_URL.to_string());
        let model = std::env::var("WEFT_AI_MODEL").unwrap_or_else(|_| DEFAULT_AI_MODEL.to_string());
        let api_key = std::env::var("WEFT_AI_KEY").ok().filter(|k| !k.is_empty());
        let timeout_secs = std::env::var("WEFT_AI_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::AI_TIMEOUT_SECS);

        Self::with_config(url, model, api_key, timeout_secs)
    }

    async fn chat(&self, prompt: &str, max_tokens: u32, timeout_secs: u64) -> Result<String> {
        let start = Instant::now();

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            max_tokens,
            temperature: defaults::AI_TEMPERATURE,
        };

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .timeout(Duration::from_secs(timeout_secs))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Request(format!("AI request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Inference(format!(
                "AI service returned {}: {}",
                status, body
            )));
        }

        let result: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::Inference(format!("Failed to parse AI response: {}", e)))?;

        let message = result
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| Error::Inference("AI response contained no choices".to_string()))?;

        // Some thinking models put the usable text in reasoning_content.
        let content = message
            .content
            .filter(|c| !c.is_empty())
            .or(message.reasoning_content)
            .unwrap_or_default();

        let elapsed = start.elapsed().as_millis() as u64;
        debug!(
            response_len = content.len(),
            duration_ms = elapsed,
            "Generation complete"
        );
        if elapsed > 30000 {
            warn!(
                duration_ms = elapsed,
                prompt_len = prompt.len(),
                slow = true,
                "Slow generation operation"
            );
        }

        Ok(content)
    }
}

impl Default for OpenAiBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationBackend for OpenAiBackend {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.chat(prompt, defaults::AI_MAX_TOKENS, self.timeout_secs)
            .await
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn health_check(&self) -> Result<bool> {
        match self
            .chat("Hi", 1, defaults::AI_AVAILABILITY_TIMEOUT_SECS)
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => {
                warn!(error = %e, "AI availability check failed");
                Ok(false)
            }
        }
    }
}

/// Chat API message.
#[derive(Serialize, Deserialize, Clone)]
struct ChatMessage {
    role: String,
    content: String,
}

/// Request payload for the chat-completions endpoint.
#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f64,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    reasoning_content: Option<String>,
}
