//! Chat completions client for OpenAI-compatible endpoints

use std::time::Instant;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{Level, debug, error, warn};

use crate::ai::error::AiError;
use crate::ai::prompt::{SYSTEM_PROMPT, strip_code_fences};
use crate::ai::sse::SseChunks;
use crate::ai::{ChunkStream, GenerativeText};
use crate::config::AiConfig;

/// Client for any OpenAI-compatible chat completions endpoint
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    config: AiConfig,
    client: Client,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiClient {
    pub fn new(config: AiConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    pub fn config(&self) -> &AiConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.endpoint.trim_end_matches('/'), path)
    }

    fn ensure_enabled(&self) -> Result<(), AiError> {
        if self.config.is_enabled() {
            Ok(())
        } else {
            Err(AiError::NotEnabled)
        }
    }

    /// POST a chat completion and fail on any non-success status
    async fn send(&self, prompt: &str, stream: bool) -> Result<reqwest::Response, AiError> {
        self.ensure_enabled()?;

        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            stream,
        };

        let url = self.url("chat/completions");
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .inspect_err(|e| error!(url = %url, "Failed to reach AI service: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(url = %url, status = status.as_u16(), "AI service returned an error status");
            return Err(AiError::Status {
                code: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Check `GET {endpoint}/models` with the configured key
    pub async fn test_connection(&self) -> bool {
        let url = self.url("models");
        match self
            .client
            .get(&url)
            .bearer_auth(&self.config.api_key)
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                warn!(url = %url, "AI connection test failed: {}", e);
                false
            }
        }
    }
}

#[async_trait]
impl GenerativeText for OpenAiClient {
    fn is_enabled(&self) -> bool {
        self.config.is_enabled()
    }

    fn reconfigure(&mut self, config: AiConfig) {
        debug!(?config, "AI client reconfigured");
        self.config = config;
    }

    async fn complete(&self, prompt: &str) -> Result<String, AiError> {
        let started = Instant::now();
        let response = self.send(prompt, false).await?;

        let text = response.text().await?;
        let parsed: ChatResponse =
            serde_json::from_str(&text).map_err(|e| AiError::Decode(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| strip_code_fences(&content))
            .filter(|content| !content.is_empty())
            .ok_or(AiError::EmptyResponse)?;

        crate::log_ai_exchange!(Level::INFO, self.config.model.as_str(), false, content.len());
        crate::log_timing!(Level::DEBUG, "ai.complete", started.elapsed());
        Ok(content)
    }

    async fn stream(&self, prompt: &str) -> Result<ChunkStream, AiError> {
        let response = self.send(prompt, true).await?;
        Ok(Box::pin(SseChunks::new(Box::pin(response.bytes_stream()))))
    }
}
