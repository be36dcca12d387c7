//! TravelAgent - the provider-agnostic capability surface
//!
//! Implements the four planning operations (streaming chat, full-itinerary,
//! metadata-only, day-block) once over any wire-level `ProviderModel`.
//! There is no mutable prompt state: the system prompt is rendered fresh
//! for every call from the destination context and language passed in.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::debug::DebugSink;
use crate::domain::{ChatMessage, DayPlan, Itinerary, ItineraryMetadata, TripDestinations};

use super::prompts::{
    build_day_block_prompt, build_itinerary_prompt, build_metadata_prompt, build_system_prompt,
};
use super::{AgentError, ProviderModel, parse_model_json};

/// Per-call prompt context: what the system prompt is rendered from
#[derive(Debug, Clone, Default)]
pub struct PromptContext {
    pub destinations: Option<TripDestinations>,
    pub language: String,
}

impl PromptContext {
    /// English, no destination context
    pub fn new() -> Self {
        Self {
            destinations: None,
            language: "English".to_string(),
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_destinations(mut self, destinations: TripDestinations) -> Self {
        self.destinations = Some(destinations);
        self
    }

    fn language(&self) -> &str {
        if self.language.is_empty() {
            "English"
        } else {
            &self.language
        }
    }

    fn system_prompt(&self) -> String {
        build_system_prompt(self.destinations.as_ref(), self.language())
    }
}

/// Provider-agnostic travel planning agent
pub struct TravelAgent {
    model: Arc<dyn ProviderModel>,
    debug_sink: Arc<dyn DebugSink>,
}

impl TravelAgent {
    pub fn new(model: Arc<dyn ProviderModel>, debug_sink: Arc<dyn DebugSink>) -> Self {
        Self { model, debug_sink }
    }

    /// Display name of the underlying provider
    pub fn name(&self) -> &'static str {
        self.model.name()
    }

    /// Model identifier of the underlying provider
    pub fn model_id(&self) -> &str {
        self.model.model_id()
    }

    /// Streaming chat: chunks go to `chunk_tx` as they arrive, the full
    /// accumulated response is returned
    pub async fn stream_chat(
        &self,
        message: &str,
        history: &[ChatMessage],
        ctx: &PromptContext,
        chunk_tx: mpsc::Sender<String>,
    ) -> Result<String, AgentError> {
        debug!(provider = self.name(), history_len = history.len(), "stream_chat: called");
        let system = ctx.system_prompt();

        let mut messages = history.to_vec();
        messages.push(ChatMessage::user(message));

        self.model.stream(&system, &messages, chunk_tx).await
    }

    /// One-shot generation of a complete itinerary
    pub async fn generate_full_itinerary(
        &self,
        requirements: &str,
        current_itinerary: Option<&Itinerary>,
        ctx: &PromptContext,
    ) -> Result<Itinerary, AgentError> {
        debug!(provider = self.name(), "generate_full_itinerary: called");
        let system = ctx.system_prompt();
        let prompt = build_itinerary_prompt(requirements, current_itinerary, ctx.language());

        let raw = self.model.complete(&system, &prompt).await?;
        self.debug_sink.save("itinerary", self.name(), &raw);

        self.decode(&raw)
    }

    /// Generate the day-independent trip shell; the model infers total_days
    pub async fn generate_metadata(
        &self,
        requirements: &str,
        ctx: &PromptContext,
    ) -> Result<ItineraryMetadata, AgentError> {
        debug!(provider = self.name(), "generate_metadata: called");
        let system = ctx.system_prompt();
        let prompt = build_metadata_prompt(requirements, ctx.language());

        let raw = self.model.complete(&system, &prompt).await?;
        self.debug_sink.save("metadata", self.name(), &raw);

        let metadata: ItineraryMetadata = self.decode(&raw)?;
        info!(
            provider = self.name(),
            total_days = metadata.total_days,
            "Generated trip metadata"
        );
        Ok(metadata)
    }

    /// Generate one contiguous block of days
    ///
    /// Accepts the response either as `{"days": [...]}` or as a bare array.
    #[allow(clippy::too_many_arguments)]
    pub async fn generate_day_block(
        &self,
        requirements: &str,
        metadata: &ItineraryMetadata,
        start_day: u32,
        end_day: u32,
        total_days: u32,
        previous_days: &[DayPlan],
        ctx: &PromptContext,
    ) -> Result<Vec<DayPlan>, AgentError> {
        debug!(
            provider = self.name(),
            start_day, end_day, "generate_day_block: called"
        );
        let system = ctx.system_prompt();
        let prompt = build_day_block_prompt(
            requirements,
            metadata,
            start_day,
            end_day,
            total_days,
            previous_days,
            ctx.language(),
        );

        let raw = self.model.complete(&system, &prompt).await?;
        self.debug_sink
            .save(&format!("days_{}_{}", start_day, end_day), self.name(), &raw);

        let value = parse_model_json(&raw)?;
        let days_value = match value {
            serde_json::Value::Object(mut obj) => obj
                .remove("days")
                .unwrap_or(serde_json::Value::Array(Vec::new())),
            array @ serde_json::Value::Array(_) => array,
            other => other,
        };

        serde_json::from_value(days_value).map_err(|e| AgentError::MalformedResponse {
            message: e.to_string(),
            raw: raw.clone(),
        })
    }

    /// Parse raw model text through extraction+repair into a typed record
    fn decode<T: DeserializeOwned>(&self, raw: &str) -> Result<T, AgentError> {
        let value = parse_model_json(raw)?;
        serde_json::from_value(value).map_err(|e| AgentError::MalformedResponse {
            message: e.to_string(),
            raw: raw.to_string(),
        })
    }
}
