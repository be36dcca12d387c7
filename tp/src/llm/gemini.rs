//! Google Gemini API adapter
//!
//! Implements the ProviderModel trait against the generateContent REST
//! surface. Streaming uses the SSE variant (`alt=sse`).

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use reqwest_eventsource::{Event, EventSource};
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::config::LlmConfig;
use crate::domain::{ChatMessage, Role};

use super::model::ProviderModel;
use super::AgentError;

/// Maximum number of retries for transient errors
const MAX_RETRIES: u32 = 3;

/// Initial backoff delay for retries
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Check if an HTTP status code is retryable
fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 429 | 500 | 502 | 503 | 504)
}

/// Google Gemini API adapter
pub struct GeminiModel {
    model: String,
    api_key: String,
    base_url: String,
    http: Client,
    max_tokens: u32,
}

impl GeminiModel {
    /// Create a new adapter from configuration
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

    fn endpoint(&self, method: &str) -> String {
        format!(
            "{}/v1beta/models/{}:{}?key={}",
            self.base_url, self.model, method, self.api_key
        )
    }

    /// Build the request body; Gemini calls the assistant role "model"
    fn build_request_body(&self, system_prompt: &str, messages: &[ChatMessage]) -> serde_json::Value {
        debug!(%self.model, message_count = messages.len(), "build_request_body: called");
        let contents: Vec<serde_json::Value> = messages
            .iter()
            .map(|msg| {
                let role = match msg.role {
                    Role::User => "user",
                    Role::Assistant => "model",
                };
                serde_json::json!({
                    "role": role,
                    "parts": [{"text": msg.content}],
                })
            })
            .collect();

        serde_json::json!({
            "system_instruction": {"parts": [{"text": system_prompt}]},
            "contents": contents,
            "generationConfig": {"maxOutputTokens": self.max_tokens},
        })
    }

    /// Concatenated text parts of the first candidate
    fn parse_response(&self, api_response: GeminiResponse) -> Result<String, AgentError> {
        let text = api_response
            .candidates
            .into_iter()
            .next()
            .map(|c| {
                c.content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(AgentError::InvalidResponse(
                "Response contained no candidate text".to_string(),
            ));
        }
        Ok(text)
    }
}

#[async_trait]
impl ProviderModel for GeminiModel {
    fn name(&self) -> &'static str {
        "Gemini"
    }

    fn model_id(&self) -> &str {
        &self.model
    }

    async fn complete(&self, system_prompt: &str, prompt: &str) -> Result<String, AgentError> {
        debug!(%self.model, "complete: called");
        let url = self.endpoint("generateContent");
        let body = self.build_request_body(system_prompt, &[ChatMessage::user(prompt)]);

        let mut last_error = None;
        for attempt in 0..=MAX_RETRIES {
            if attempt > 0 {
                let backoff = INITIAL_BACKOFF_MS * 2u64.pow(attempt - 1);
                warn!(attempt, backoff_ms = backoff, "complete: retrying after transient error");
                tokio::time::sleep(Duration::from_millis(backoff)).await;
            }

            let response = match self
                .http
                .post(url.clone())
                .header("content-type", "application/json")
                .json(&body)
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    debug!(attempt, error = %e, "complete: network error");
                    last_error = Some(AgentError::Network(e));
                    continue;
                }
            };

            let status = response.status().as_u16();

            if status == 429 {
                debug!("complete: rate limited (429)");
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
                debug!(attempt, status, "complete: retryable error");
                last_error = Some(AgentError::Api { status, message: text });
                continue;
            }

            if !response.status().is_success() {
                let text = response.text().await.unwrap_or_default();
                return Err(AgentError::Api { status, message: text });
            }

            let api_response: GeminiResponse = response.json().await?;
            return self.parse_response(api_response);
        }

        Err(last_error.unwrap_or_else(|| AgentError::InvalidResponse("Max retries exceeded".to_string())))
    }

    async fn stream(
        &self,
        system_prompt: &str,
        messages: &[ChatMessage],
        chunk_tx: mpsc::Sender<String>,
    ) -> Result<String, AgentError> {
        debug!(%self.model, "stream: called");
        let url = format!("{}&alt=sse", self.endpoint("streamGenerateContent"));
        let body = self.build_request_body(system_prompt, messages);

        let http_request = self
            .http
            .post(url)
            .header("content-type", "application/json")
            .json(&body);

        let mut es =
            EventSource::new(http_request).map_err(|e| AgentError::InvalidResponse(e.to_string()))?;

        let mut full_content = String::new();

        while let Some(event) = es.next().await {
            match event {
                Ok(Event::Message(msg)) => {
                    let Ok(chunk) = serde_json::from_str::<GeminiResponse>(&msg.data) else {
                        continue;
                    };
                    for candidate in chunk.candidates {
                        for part in candidate.content.parts {
                            if let Some(text) = part.text {
                                full_content.push_str(&text);
                                let _ = chunk_tx.send(text).await;
                            }
                        }
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

// Gemini API response types

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_model() -> GeminiModel {
        GeminiModel {
            model: "gemini-2.0-flash".to_string(),
            api_key: "test-key".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            http: Client::new(),
            max_tokens: 8192,
        }
    }

    #[test]
    fn test_endpoint_includes_model_and_key() {
        let model = test_model();
        let url = model.endpoint("generateContent");
        assert!(url.contains("models/gemini-2.0-flash:generateContent"));
        assert!(url.contains("key=test-key"));
    }

    #[test]
    fn test_assistant_role_becomes_model() {
        let model = test_model();
        let history = vec![
            ChatMessage::user("hi"),
            ChatMessage::assistant("hello"),
        ];

        let body = model.build_request_body("sys", &history);
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][1]["role"], "model");
        assert_eq!(body["system_instruction"]["parts"][0]["text"], "sys");
    }

    #[test]
    fn test_parse_response_joins_parts() {
        let model = test_model();
        let api_response: GeminiResponse = serde_json::from_str(
            r#"{"candidates": [{"content": {"parts": [{"text": "Lis"}, {"text": "bon"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(model.parse_response(api_response).unwrap(), "Lisbon");
    }

    #[test]
    fn test_parse_empty_response_is_error() {
        let model = test_model();
        let api_response: GeminiResponse = serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        assert!(model.parse_response(api_response).is_err());
    }
}
