//! tripplanner - conversational trip planning with iterative generation
//!
//! A chat with an LLM provider progressively becomes a structured,
//! validated itinerary. The heart of the crate is the iterative generation
//! orchestrator: metadata first, then day blocks, with progress snapshots
//! after every step and clean resume after a partial failure.
//!
//! # Core Concepts
//!
//! - **Blocks, not one big call**: long trips are generated a few days per
//!   request, so one failure never discards committed days
//! - **Tolerant parsing**: model output is extracted from prose, repaired
//!   when nearly valid, and coerced field-by-field rather than rejected
//! - **Stateless prompts**: the system prompt is a pure function of
//!   destination context and language, rendered fresh per call
//!
//! # Modules
//!
//! - [`llm`] - provider-agnostic agent, three provider adapters, JSON
//!   extraction and repair
//! - [`generation`] - the iterative generation state machine
//! - [`domain`] - itinerary, progress and session types
//! - [`detect`] - destination detection from conversation
//! - [`services`] - photo fetching and blog scraping collaborators
//! - [`render`] - printable itinerary documents
//! - [`config`] - configuration types and loading
//! - [`cli`] - command-line interface

pub mod cli;
pub mod config;
pub mod debug;
pub mod detect;
pub mod domain;
pub mod generation;
pub mod llm;
pub mod render;
pub mod services;

// Re-export commonly used types
pub use config::{Config, GenerationConfig, LlmConfig};
pub use debug::{DebugSink, FileDebugSink, NullDebugSink};
pub use detect::DestinationDetector;
pub use domain::{
    Activity, ActivityType, ChatMessage, DayPlan, Destination, GenerationProgress,
    GenerationState, GenerationStatus, Itinerary, ItineraryMetadata, PlannerSession, Role,
    TravelTip, TripDestinations,
};
pub use generation::{
    GenerationOptions, GenerationUpdate, blocks, generate_iteratively, resume_generation,
};
pub use llm::{
    AgentError, AnthropicModel, GeminiModel, OpenAiModel, PromptContext, ProviderModel,
    TravelAgent, create_model,
};
pub use render::{ItineraryRenderer, RenderStyle};
pub use services::{BlogContent, BlogScraper, PhotoService};
