//! Chat and session types
//!
//! A `PlannerSession` is the persisted unit: the itinerary plus everything
//! needed to pick the conversation back up. Every field defaults so that
//! documents saved by older versions keep loading.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{GenerationState, Itinerary, TripDestinations};

/// Chat message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Assistant,
}

impl Role {
    /// Wire-format name of the role
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One message in the planning conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Blog content captured for persistence
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SavedBlogContent {
    pub url: String,
    pub title: String,
    pub summary: String,
    pub tips: Vec<String>,
    pub highlights: Vec<String>,
    pub images: Vec<String>,
    pub raw_text: String,
}

fn default_provider() -> String {
    "anthropic".to_string()
}

fn default_language() -> String {
    "English".to_string()
}

/// Full planner session: itinerary, conversation and planning context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerSession {
    pub itinerary: Itinerary,
    pub chat_history: Vec<ChatMessage>,
    pub provider: String,
    pub language: String,

    /// Blog URL -> extracted content
    pub blog_content: BTreeMap<String, SavedBlogContent>,

    /// Destinations detected from the conversation so far
    pub destinations: TripDestinations,

    /// Saved orchestrator state, present when a run may need resuming
    pub generation_state: Option<GenerationState>,
}

impl Default for PlannerSession {
    fn default() -> Self {
        Self {
            itinerary: Itinerary::default(),
            chat_history: Vec::new(),
            provider: default_provider(),
            language: default_language(),
            blog_content: BTreeMap::new(),
            destinations: TripDestinations::default(),
            generation_state: None,
        }
    }
}
