//! OpenAI-style chat-completions client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{GenerationRequest, TextGenerator};
use crate::types::GenerationResult;
use crate::{Result, SkaldError};

/// Default base URL for the chat-completions API.
const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// Default per-request deadline.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(45);

/// Client for an OpenAI-compatible `/v1/chat/completions` endpoint.
///
/// The request deadline is enforced by the HTTP client itself; expiry
/// surfaces as [`SkaldError::Timeout`]. There is no cooperative
/// cancellation — once issued, a call runs to completion or timeout.
#[derive(Clone)]
pub struct ChatCompletionsClient {
    api_key: String,
    http: Client,
    base_url: String,
}

impl ChatCompletionsClient {
    /// Create a new client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Create a client with a custom base URL (for testing with wiremock,
    /// or for OpenAI-compatible gateways).
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self::with_timeout(api_key, base_url, DEFAULT_TIMEOUT)
    }

    /// Create a client with a custom base URL and request deadline.
    pub fn with_timeout(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .expect("failed to build HTTP client");

        Self {
            api_key: api_key.into(),
            http,
            base_url: base_url.into(),
        }
    }

    /// Check response status and map to the appropriate error.
    fn handle_response_errors(&self, response: &reqwest::Response) -> Result<()> {
        let status = response.status();

        if status.is_success() {
            return Ok(());
        }

        match status.as_u16() {
            401 => Err(SkaldError::AuthenticationFailed),
            402 => Err(SkaldError::InsufficientQuota),
            408 => Err(SkaldError::Timeout),
            429 => {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .map(Duration::from_secs);
                Err(SkaldError::RateLimited { retry_after })
            }
            code => Err(SkaldError::Api {
                status: code,
                message: format!("chat completions API error: {status}"),
            }),
        }
    }
}

#[async_trait]
impl TextGenerator for ChatCompletionsClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult> {
        let url = format!("{}/v1/chat/completions", self.base_url);

        let body = ChatRequest {
            model: &request.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user_prompt,
                },
            ],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            response_format: request
                .structured_output
                .then_some(ResponseFormat { kind: "json_object" }),
        };

        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SkaldError::Timeout
                } else {
                    SkaldError::Http(e.to_string())
                }
            })?;

        self.handle_response_errors(&response)?;

        let completion: ChatResponse = response
            .json()
            .await
            .map_err(|e| SkaldError::Http(e.to_string()))?;

        let text = completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .filter(|c| !c.is_empty())
            .ok_or(SkaldError::EmptyResponse)?;

        let tokens_used = completion
            .usage
            .map(|u| {
                if u.total_tokens > 0 {
                    u.total_tokens
                } else {
                    u.prompt_tokens + u.completion_tokens
                }
            })
            .unwrap_or(0);

        // Structured output is best-effort: an unparseable reply degrades
        // to plain text, never to an error.
        let structured = request
            .structured_output
            .then(|| serde_json::from_str(&text).ok())
            .flatten();

        Ok(GenerationResult {
            text,
            structured,
            tokens_used,
        })
    }

    async fn probe(&self) -> bool {
        let url = format!("{}/v1/models", self.base_url);
        match self
            .http
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: String,
}

#[derive(Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
    #[serde(default)]
    total_tokens: u64,
}
