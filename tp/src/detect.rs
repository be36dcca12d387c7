//! Destination detection from conversation
//!
//! Two tiers: a cheap regex pre-filter over a single message, and an
//! LLM-backed structured extraction over recent history. The pre-filter
//! gates the LLM call so a round-trip is only paid when a message actually
//! looks like it names a destination.

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::debug;

use crate::domain::{ChatMessage, Destination, TripDestinations};
use crate::llm::{PromptContext, TravelAgent};

/// Phrase patterns requiring capitalized destination names
static DESTINATION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?:trip|travel(?:l?ing)?|go(?:ing)?|visit(?:ing)?|vacation|holiday|journey) to ([A-Z][a-zA-Z]+(?:\s+[A-Z][a-zA-Z]+)*)",
        r"(?:trip|travel(?:l?ing)?|go(?:ing)?|visit(?:ing)?|vacation|holiday|journey) in ([A-Z][a-zA-Z]+(?:\s+[A-Z][a-zA-Z]+)*)",
        r"(?:plan(?:ning)?|book(?:ing)?) (?:a )?(?:trip|travel|vacation|holiday) to ([A-Z][a-zA-Z]+(?:\s+[A-Z][a-zA-Z]+)*)",
        r"(?:want|like|love) to (?:go|visit|travel|see) ([A-Z][a-zA-Z]+(?:\s+[A-Z][a-zA-Z]+)*)",
        r"(?:are |we are |we're )?visiting ([A-Z][a-zA-Z]+(?:\s+[A-Z][a-zA-Z]+)*)",
    ]
    .iter()
    .map(|p| {
        RegexBuilder::new(p)
            .case_insensitive(true)
            .build()
            .unwrap()
    })
    .collect()
});

/// Looser patterns; their matches go through the stopword filter
static SIMPLE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"trip to (\w+(?:\s+\w+)?)",
        r"visit(?:ing)? (\w+(?:\s+\w+)?)",
        r"travel(?:ing)? to (\w+(?:\s+\w+)?)",
        r"going to (\w+(?:\s+\w+)?)",
        r"vacation in (\w+(?:\s+\w+)?)",
        r"holiday in (\w+(?:\s+\w+)?)",
    ]
    .iter()
    .map(|p| {
        RegexBuilder::new(p)
            .case_insensitive(true)
            .build()
            .unwrap()
    })
    .collect()
});

/// Words the loose patterns catch that are never destinations
const STOPWORDS: &[&str] = &[
    "the", "a", "an", "my", "our", "your", "their", "be", "go", "see", "do", "have", "there",
    "here", "somewhere", "anywhere",
];

const DESTINATION_EXTRACTION_PROMPT: &str = r#"Analyze this conversation and extract the travel destination(s) being discussed.

Return a JSON object with this structure:
{
    "primary_destination": {
        "name": "Main destination name (city or country)",
        "country": "Country name",
        "region": "Geographic region (e.g., Asia, Europe, Americas)",
        "key_attractions": ["attraction1", "attraction2"],
        "local_cuisine": "Brief description of local food",
        "best_time_to_visit": "Best season/months"
    },
    "secondary_destinations": [
        {"name": "...", "country": "...", "region": "..."}
    ],
    "confidence": 0.0
}

If no destination is mentioned or clear, return:
{"primary_destination": null, "secondary_destinations": [], "confidence": 0.0}

Conversation:
"#;

/// How much history the extraction pass reads
const HISTORY_WINDOW: usize = 10;

fn default_confidence() -> f64 {
    1.0
}

#[derive(Debug, Deserialize)]
struct DetectionResponse {
    primary_destination: Option<RawDestination>,
    #[serde(default)]
    secondary_destinations: Vec<RawDestination>,
    #[serde(default = "default_confidence")]
    confidence: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawDestination {
    name: String,
    country: Option<String>,
    region: Option<String>,
    key_attractions: Vec<String>,
    local_cuisine: Option<String>,
    best_time_to_visit: Option<String>,
}

/// Detects travel destinations in user messages
#[derive(Debug, Default)]
pub struct DestinationDetector;

impl DestinationDetector {
    pub fn new() -> Self {
        Self
    }

    /// Quick rule-based pre-filter for a single message
    ///
    /// Returns candidate destination names, deduplicated case-insensitively
    /// in order of first appearance. An empty result means the expensive
    /// extraction pass can be skipped.
    pub fn extract_from_text(&self, text: &str) -> Vec<String> {
        let mut candidates = Vec::new();

        for pattern in DESTINATION_PATTERNS.iter() {
            for capture in pattern.captures_iter(text) {
                if let Some(m) = capture.get(1) {
                    candidates.push(m.as_str().to_string());
                }
            }
        }

        for pattern in SIMPLE_PATTERNS.iter() {
            for capture in pattern.captures_iter(text) {
                if let Some(m) = capture.get(1) {
                    let value = m.as_str();
                    if !STOPWORDS.contains(&value.to_lowercase().as_str()) {
                        candidates.push(value.to_string());
                    }
                }
            }
        }

        // Deduplicate while preserving order
        let mut seen = Vec::new();
        let mut unique = Vec::new();
        for candidate in candidates {
            let lower = candidate.to_lowercase();
            if !seen.contains(&lower) {
                seen.push(lower);
                unique.push(candidate);
            }
        }

        unique
    }

    /// LLM-backed structured extraction over recent chat history
    ///
    /// Sends the last few messages with an extraction prompt through the
    /// agent's chat operation. Any parse failure yields an empty result -
    /// detection is advisory and must never break the conversation.
    pub async fn extract_from_conversation(
        &self,
        chat_history: &[ChatMessage],
        agent: &TravelAgent,
    ) -> TripDestinations {
        if chat_history.is_empty() {
            return TripDestinations::default();
        }

        let start = chat_history.len().saturating_sub(HISTORY_WINDOW);
        let conversation: Vec<String> = chat_history[start..]
            .iter()
            .map(|msg| format!("{}: {}", msg.role.as_str(), msg.content))
            .collect();

        let prompt = format!("{}{}", DESTINATION_EXTRACTION_PROMPT, conversation.join("\n"));

        // Chunks are irrelevant here; only the full response matters
        let (tx, rx) = mpsc::channel(1);
        drop(rx);

        let response = match agent
            .stream_chat(&prompt, &[], &PromptContext::new(), tx)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                debug!(error = %e, "Destination extraction call failed");
                return TripDestinations::default();
            }
        };

        self.parse_response(&response)
    }

    /// Extract-only parsing: no repair retry, failure is an empty result
    fn parse_response(&self, response: &str) -> TripDestinations {
        let candidate = crate::llm::extract_json(response);
        let Ok(parsed) = serde_json::from_str::<DetectionResponse>(&candidate) else {
            debug!("Destination extraction response did not parse");
            return TripDestinations::default();
        };

        let mut result = TripDestinations::default();

        if let Some(pd) = parsed.primary_destination {
            result.primary = Some(Destination {
                name: pd.name,
                country: pd.country,
                region: pd.region,
                confidence: parsed.confidence,
                key_attractions: pd.key_attractions,
                local_cuisine: pd.local_cuisine,
                best_time_to_visit: pd.best_time_to_visit,
            });
        }

        for sd in parsed.secondary_destinations {
            result.secondary.push(Destination {
                name: sd.name,
                country: sd.country,
                region: sd.region,
                key_attractions: sd.key_attractions,
                ..Default::default()
            });
        }

        result
    }
}
