//! HTTP chat-model adapter for the Anthropic messages API.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use tracing::Instrument;
use uuid::Uuid;

use crate::domain::models::{LlmConfig, RetryConfig};
use crate::domain::ports::{ChatError, ChatMessage, ChatModel};
use crate::infrastructure::llm::retry::RetryPolicy;

const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct MessageRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

/// [`ChatModel`] implementation over the Anthropic messages endpoint.
///
/// One pooled HTTP client per adapter, a request timeout, and retry with
/// exponential backoff for transient failures (rate limits, 5xx, network).
pub struct AnthropicModel {
    http: HttpClient,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    retry: RetryPolicy,
}

impl AnthropicModel {
    pub fn new(api_key: String, llm: &LlmConfig, retry: &RetryConfig) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(llm.timeout_secs))
            .pool_max_idle_per_host(10)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            http,
            api_key,
            base_url: llm.base_url.trim_end_matches('/').to_string(),
            model: llm.model.clone(),
            max_tokens: llm.max_tokens,
            retry: RetryPolicy::from(retry),
        })
    }

    async fn send_request(&self, prompt: &str) -> Result<String, ChatError> {
        let request = MessageRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .http
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    ChatError::Timeout
                } else {
                    ChatError::Network(err.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read error body".to_string());

            return Err(match status.as_u16() {
                429 => ChatError::RateLimited(body),
                401 | 403 => ChatError::Auth(body),
                code => ChatError::Api {
                    status: code,
                    message: body,
                },
            });
        }

        let message: MessageResponse = response
            .json()
            .await
            .map_err(|err| ChatError::InvalidResponse(err.to_string()))?;

        if let Some(usage) = &message.usage {
            tracing::debug!(
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                "generation finished"
            );
        }

        message
            .content
            .into_iter()
            .find(|block| block.block_type == "text")
            .and_then(|block| block.text)
            .ok_or_else(|| ChatError::InvalidResponse("no text content block".to_string()))
    }
}

#[async_trait]
impl ChatModel for AnthropicModel {
    async fn generate(&self, prompt: &str) -> Result<ChatMessage, ChatError> {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!("llm_generate", %request_id, model = %self.model);

        async {
            self.retry
                .execute(|| self.send_request(prompt))
                .await
                .map(ChatMessage::new)
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> (LlmConfig, RetryConfig) {
        (LlmConfig::default(), RetryConfig::default())
    }

    #[test]
    fn test_client_creation() {
        let (llm, retry) = test_config();
        assert!(AnthropicModel::new("test-key".to_string(), &llm, &retry).is_ok());
    }

    #[test]
    fn test_base_url_is_normalized() {
        let (mut llm, retry) = test_config();
        llm.base_url = "https://api.anthropic.com/".to_string();

        let model = AnthropicModel::new("test-key".to_string(), &llm, &retry).unwrap();
        assert_eq!(model.base_url, "https://api.anthropic.com");
    }

    #[test]
    fn test_response_parsing() {
        let json = r#"{
            "id": "msg_1",
            "content": [{"type": "text", "text": "```python\npass\n```"}],
            "usage": {"input_tokens": 12, "output_tokens": 7}
        }"#;

        let response: MessageResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.content.len(), 1);
        assert_eq!(
            response.content[0].text.as_deref(),
            Some("```python\npass\n```")
        );
        assert_eq!(response.usage.unwrap().output_tokens, 7);
    }
}
