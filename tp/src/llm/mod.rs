//! Agent capability contract and provider adapters
//!
//! The `TravelAgent` type exposes four operations (streaming chat,
//! full-itinerary, metadata-only, day-block generation) over any
//! wire-level `ProviderModel`; this module holds the trait, the three
//! provider adapters, and the extraction/repair layer that turns raw model
//! text into typed records.

use std::sync::Arc;

use tracing::debug;

mod agent;
mod anthropic;
mod error;
mod extract;
mod gemini;
pub mod model;
mod openai;
pub mod prompts;

pub use agent::{PromptContext, TravelAgent};
pub use anthropic::AnthropicModel;
pub use error::AgentError;
pub use extract::{extract_json, parse_model_json, pretty_or_verbatim, repair_json};
pub use gemini::GeminiModel;
pub use model::ProviderModel;
pub use openai::OpenAiModel;

use crate::config::LlmConfig;

/// Create a provider model based on the provider specified in config
///
/// Supports "anthropic", "openai" and "gemini" providers.
pub fn create_model(config: &LlmConfig) -> Result<Arc<dyn ProviderModel>, AgentError> {
    debug!(provider = %config.provider, model = %config.model(), "create_model: called");
    match config.provider.as_str() {
        "anthropic" => Ok(Arc::new(AnthropicModel::from_config(config)?)),
        "openai" => Ok(Arc::new(OpenAiModel::from_config(config)?)),
        "gemini" => Ok(Arc::new(GeminiModel::from_config(config)?)),
        other => Err(AgentError::Config(format!(
            "Unknown LLM provider: '{}'. Supported: anthropic, openai, gemini",
            other
        ))),
    }
}
