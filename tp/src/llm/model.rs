//! ProviderModel trait definition

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::ChatMessage;

use super::AgentError;

/// Wire-level LLM access for one provider
///
/// This is the only surface the provider adapters implement; everything
/// above it (prompt building, extraction, repair, schema validation) is
/// shared. Each call is independent - conversation state travels in the
/// message list, never in the adapter.
#[async_trait]
pub trait ProviderModel: Send + Sync {
    /// Display name of the provider ("Claude", "OpenAI", "Gemini")
    fn name(&self) -> &'static str;

    /// Model identifier in use
    fn model_id(&self) -> &str;

    /// Send one blocking completion request and return the response text
    async fn complete(&self, system_prompt: &str, prompt: &str) -> Result<String, AgentError>;

    /// Streaming chat completion
    ///
    /// Sends text chunks to the provided channel as they arrive and returns
    /// the accumulated full response. The sequence is finite and ends when
    /// the provider closes the stream; a dropped receiver just means chunks
    /// stop being delivered.
    async fn stream(
        &self,
        system_prompt: &str,
        messages: &[ChatMessage],
        chunk_tx: mpsc::Sender<String>,
    ) -> Result<String, AgentError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::Mutex;

    /// Scripted provider model for unit tests
    ///
    /// Returns queued responses in order; an exhausted script is an
    /// InvalidResponse error.
    pub struct MockModel {
        script: Mutex<Vec<Result<String, AgentError>>>,
        calls: Mutex<Vec<String>>,
    }

    impl MockModel {
        pub fn new(responses: Vec<Result<String, AgentError>>) -> Self {
            Self {
                script: Mutex::new(responses),
                calls: Mutex::new(Vec::new()),
            }
        }

        /// Shorthand for a script of plain successful responses
        pub fn with_responses<S: AsRef<str>>(responses: &[S]) -> Self {
            Self::new(responses.iter().map(|r| Ok(r.as_ref().to_string())).collect())
        }

        /// An error value usable in scripts as a simulated provider failure
        pub fn transport_error() -> AgentError {
            AgentError::Api {
                status: 503,
                message: "upstream overloaded".to_string(),
            }
        }

        /// Prompts seen so far, in call order
        pub fn prompts(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        fn next(&self, prompt: &str) -> Result<String, AgentError> {
            self.calls.lock().unwrap().push(prompt.to_string());
            let mut script = self.script.lock().unwrap();
            if script.is_empty() {
                return Err(AgentError::InvalidResponse(
                    "No more scripted responses".to_string(),
                ));
            }
            script.remove(0)
        }
    }

    #[async_trait]
    impl ProviderModel for MockModel {
        fn name(&self) -> &'static str {
            "Mock"
        }

        fn model_id(&self) -> &str {
            "mock-model-1"
        }

        async fn complete(&self, _system_prompt: &str, prompt: &str) -> Result<String, AgentError> {
            self.next(prompt)
        }

        async fn stream(
            &self,
            _system_prompt: &str,
            messages: &[ChatMessage],
            chunk_tx: mpsc::Sender<String>,
        ) -> Result<String, AgentError> {
            let prompt = messages.last().map(|m| m.content.as_str()).unwrap_or("");
            let response = self.next(prompt)?;

            // Deliver in two chunks so stream consumers see multiple sends
            let mid = response
                .char_indices()
                .map(|(i, _)| i)
                .nth(response.chars().count() / 2)
                .unwrap_or(0);
            let (head, tail) = response.split_at(mid);
            let _ = chunk_tx.send(head.to_string()).await;
            let _ = chunk_tx.send(tail.to_string()).await;

            Ok(response)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_mock_returns_scripted_responses() {
            let model = MockModel::with_responses(&["first", "second"]);

            assert_eq!(model.complete("sys", "a").await.unwrap(), "first");
            assert_eq!(model.complete("sys", "b").await.unwrap(), "second");
            assert_eq!(model.call_count(), 2);
            assert_eq!(model.prompts(), vec!["a".to_string(), "b".to_string()]);
        }

        #[tokio::test]
        async fn test_mock_errors_when_exhausted() {
            let model = MockModel::new(vec![]);
            assert!(model.complete("sys", "a").await.is_err());
        }

        #[tokio::test]
        async fn test_mock_streams_chunks() {
            let model = MockModel::with_responses(&["hello world"]);
            let (tx, mut rx) = mpsc::channel(8);

            let full = model
                .stream("sys", &[ChatMessage::user("hi")], tx)
                .await
                .unwrap();

            assert_eq!(full, "hello world");
            let mut collected = String::new();
            while let Some(chunk) = rx.recv().await {
                collected.push_str(&chunk);
            }
            assert_eq!(collected, "hello world");
        }
    }
}
