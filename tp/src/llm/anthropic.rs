//! Anthropic Claude API adapter
//!
//! Implements the ProviderModel trait against Anthropic's Messages API with
//! support for both blocking and streaming responses.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use reqwest_eventsource::{Event, EventSource};
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::config::LlmConfig;
use crate::domain::ChatMessage;

use super::model::ProviderModel;
use super::AgentError;

/// Maximum number of retries for transient errors
const MAX_RETRIES: u32 = 3;

/// Initial backoff delay for retries
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Check if an HTTP status code is retryable
fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 429 | 500 | 502 | 503 | 504 | 529)
}

/// Anthropic Claude API adapter
pub struct AnthropicModel {
    model: String,
    api_key: String,
    base_url: String,
    http: Client,
    max_tokens: u32,
}

impl AnthropicModel {
    /// Create a new adapter from configuration
    ///
    /// Reads the API key from the environment variable named in config.
    pub fn from_config(config: &LlmConfig) -> Result<Self, AgentError> {
        debug!(provider = %config.provider, "from_config: called");
        let api_key = config
            .get_api_key()
            .map_err(|e| AgentError::Config(e.to_string()))?;

        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(AgentError::Network)?;

        Ok(Self {
            model: config.model(),
            api_key,
            base_url: config.base_url(),
            http,
            max_tokens: config.max_tokens,
        })
    }

    /// Build the request body for the Messages API
    fn build_request_body(&self, system_prompt: &str, messages: &[ChatMessage]) -> serde_json::Value {
        debug!(%self.model, message_count = messages.len(), "build_request_body: called");
        serde_json::json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "system": system_prompt,
            "messages": messages
                .iter()
                .map(|m| serde_json::json!({"role": m.role, "content": m.content}))
                .collect::<Vec<_>>(),
        })
    }

    /// First text block of the API response
    fn parse_response(&self, api_response: AnthropicResponse) -> Result<String, AgentError> {
        api_response
            .content
            .into_iter()
            .find_map(|block| match block {
                AnthropicContentBlock::Text { text } => Some(text),
            })
            .ok_or_else(|| AgentError::InvalidResponse("Response contained no text block".to_string()))
    }

    async fn send_with_retries(&self, body: &serde_json::Value) -> Result<String, AgentError> {
        let url = format!("{}/v1/messages", self.base_url);

        let mut last_error = None;
        for attempt in 0..=MAX_RETRIES {
            if attempt > 0 {
                let backoff = INITIAL_BACKOFF_MS * 2u64.pow(attempt - 1);
                warn!(attempt, backoff_ms = backoff, "retrying after transient error");
                tokio::time::sleep(Duration::from_millis(backoff)).await;
            }

            let response = match self
                .http
                .post(url.clone())
                .header("x-api-key", self.api_key.clone())
                .header("anthropic-version", "2023-06-01")
                .header("content-type", "application/json")
                .json(body)
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    debug!(attempt, error = %e, "network error");
                    last_error = Some(AgentError::Network(e));
                    continue;
                }
            };

            let status = response.status().as_u16();

            if status == 429 {
                debug!("rate limited (429)");
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(60);

                return Err(AgentError::RateLimited {
                    retry_after: Duration::from_secs(retry_after),
                });
            }

            if is_retryable_status(status) && attempt < MAX_RETRIES {
                let text = response.text().await.unwrap_or_default();
                debug!(attempt, status, "retryable error");
                last_error = Some(AgentError::Api { status, message: text });
                continue;
            }

            if !response.status().is_success() {
                let text = response.text().await.unwrap_or_default();
                return Err(AgentError::Api { status, message: text });
            }

            let api_response: AnthropicResponse = response.json().await?;
            return self.parse_response(api_response);
        }

        Err(last_error.unwrap_or_else(|| AgentError::InvalidResponse("Max retries exceeded".to_string())))
    }
}

#[async_trait]
impl ProviderModel for AnthropicModel {
    fn name(&self) -> &'static str {
        "Claude"
    }

    fn model_id(&self) -> &str {
        &self.model
    }

    async fn complete(&self, system_prompt: &str, prompt: &str) -> Result<String, AgentError> {
        debug!(%self.model, "complete: called");
        let body = self.build_request_body(system_prompt, &[ChatMessage::user(prompt)]);
        self.send_with_retries(&body).await
    }

    async fn stream(
        &self,
        system_prompt: &str,
        messages: &[ChatMessage],
        chunk_tx: mpsc::Sender<String>,
    ) -> Result<String, AgentError> {
        debug!(%self.model, "stream: called");
        let url = format!("{}/v1/messages", self.base_url);
        let mut body = self.build_request_body(system_prompt, messages);
        body["stream"] = serde_json::json!(true);

        let http_request = self
            .http
            .post(url)
            .header("x-api-key", self.api_key.clone())
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&body);

        let mut es =
            EventSource::new(http_request).map_err(|e| AgentError::InvalidResponse(e.to_string()))?;

        let mut full_content = String::new();

        while let Some(event) = es.next().await {
            match event {
                Ok(Event::Message(msg)) => {
                    let data: serde_json::Value = serde_json::from_str(&msg.data)?;

                    match data["type"].as_str() {
                        Some("content_block_delta") => {
                            if let Some(text) = data["delta"]["text"].as_str() {
                                full_content.push_str(text);
                                let _ = chunk_tx.send(text.to_string()).await;
                            }
                        }
                        Some("message_stop") => break,
                        _ => {}
                    }
                }
                Ok(Event::Open) => {
                    debug!("stream: connection open");
                }
                Err(reqwest_eventsource::Error::StreamEnded) => break,
                Err(e) => {
                    debug!(error = %e, "stream: event error");
                    return Err(AgentError::InvalidResponse(e.to_string()));
                }
            }
        }

        Ok(full_content)
    }
}

// Anthropic API response types

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum AnthropicContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_model() -> AnthropicModel {
        AnthropicModel {
            model: "claude-sonnet-4-20250514".to_string(),
            api_key: "test-key".to_string(),
            base_url: "https://api.anthropic.com".to_string(),
            http: Client::new(),
            max_tokens: 8192,
        }
    }

    #[test]
    fn test_build_request_body() {
        let model = test_model();
        let body = model.build_request_body("You are helpful", &[ChatMessage::user("Hello")]);

        assert_eq!(body["model"], "claude-sonnet-4-20250514");
        assert_eq!(body["max_tokens"], 8192);
        assert_eq!(body["system"], "You are helpful");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "Hello");
    }

    #[test]
    fn test_parse_response_takes_text_block() {
        let model = test_model();
        let api_response: AnthropicResponse = serde_json::from_str(
            r#"{"content": [{"type": "text", "text": "{\"title\": \"Lisbon\"}"}]}"#,
        )
        .unwrap();

        let text = model.parse_response(api_response).unwrap();
        assert!(text.contains("Lisbon"));
    }

    #[test]
    fn test_parse_response_empty_is_error() {
        let model = test_model();
        let api_response = AnthropicResponse { content: vec![] };
        assert!(model.parse_response(api_response).is_err());
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable_status(429));
        assert!(is_retryable_status(529));
        assert!(is_retryable_status(503));
        assert!(!is_retryable_status(401));
        assert!(!is_retryable_status(404));
    }
}
