//! Integration tests for tripplanner
//!
//! These drive the public API end to end: a scripted provider model feeds
//! the agent, the orchestrator runs real extraction/repair and the domain
//! model, and state round-trips through a real plan store.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use planstore::PlanStore;
use tempfile::TempDir;
use tripplanner::debug::NullDebugSink;
use tripplanner::domain::{
    GenerationState, GenerationStatus, Itinerary, PlannerSession,
};
use tripplanner::generation::{
    GenerationOptions, generate_iteratively, resume_generation,
};
use tripplanner::llm::{AgentError, ProviderModel, TravelAgent};
use tripplanner::{ChatMessage, FileDebugSink};

/// Provider model that replays a fixed script of responses
struct ScriptedModel {
    script: Mutex<Vec<Result<String, String>>>,
}

impl ScriptedModel {
    fn new(script: Vec<Result<String, String>>) -> Self {
        Self {
            script: Mutex::new(script),
        }
    }

    fn next(&self) -> Result<String, AgentError> {
        let mut script = self.script.lock().unwrap();
        if script.is_empty() {
            return Err(AgentError::InvalidResponse("script exhausted".to_string()));
        }
        script.remove(0).map_err(|message| AgentError::Api {
            status: 503,
            message,
        })
    }
}

#[async_trait]
impl ProviderModel for ScriptedModel {
    fn name(&self) -> &'static str {
        "Scripted"
    }

    fn model_id(&self) -> &str {
        "scripted-1"
    }

    async fn complete(&self, _system_prompt: &str, _prompt: &str) -> Result<String, AgentError> {
        self.next()
    }

    async fn stream(
        &self,
        _system_prompt: &str,
        _messages: &[ChatMessage],
        chunk_tx: mpsc::Sender<String>,
    ) -> Result<String, AgentError> {
        let response = self.next()?;
        let _ = chunk_tx.send(response.clone()).await;
        Ok(response)
    }
}

fn agent_with_script(script: Vec<Result<String, String>>) -> TravelAgent {
    TravelAgent::new(
        Arc::new(ScriptedModel::new(script)),
        Arc::new(NullDebugSink),
    )
}

fn metadata_json(title: &str, total_days: u32) -> String {
    format!(
        r#"{{"title": "{}", "description": "A trip", "total_days": {}, "travelers": 2}}"#,
        title, total_days
    )
}

fn day_block_json(start: u32, end: u32) -> String {
    let days: Vec<String> = (start..=end)
        .map(|n| {
            format!(
                r#"{{"day_number": {}, "title": "Day {}", "location": "Lisbon",
                     "activities": [{{"name": "Walk {}", "description": "Wander.",
                                      "location": "Lisbon", "activity_type": "tour"}}]}}"#,
                n, n, n
            )
        })
        .collect();
    format!(r#"{{"days": [{}]}}"#, days.join(", "))
}

// =============================================================================
// Full generation scenarios
// =============================================================================

#[tokio::test]
async fn test_lisbon_five_day_scenario() {
    // "5-day trip to Lisbon", block_size=2: blocks (1,2), (3,4), (5,5)
    let agent = agent_with_script(vec![
        Ok(metadata_json("Lisbon in Five Days", 5)),
        Ok(day_block_json(1, 2)),
        Ok(day_block_json(3, 4)),
        Ok(day_block_json(5, 5)),
    ]);

    let options = GenerationOptions {
        block_size: 2,
        ..Default::default()
    };
    let (tx, _rx) = mpsc::channel(16);

    let outcome = generate_iteratively(&agent, "5-day trip to Lisbon", &options, tx).await;

    assert_eq!(outcome.progress.status, GenerationStatus::Complete);
    assert_eq!(outcome.itinerary.total_days(), 5);
    assert_eq!(outcome.itinerary.title, "Lisbon in Five Days");

    // Aliased category "tour" was normalized, day numbers unique and sorted
    let numbers: Vec<u32> = outcome.itinerary.days.iter().map(|d| d.day_number).collect();
    assert_eq!(numbers, vec![1, 2, 3, 4, 5]);
    for day in &outcome.itinerary.days {
        assert_eq!(
            day.activities[0].activity_type,
            tripplanner::ActivityType::Sightseeing
        );
    }
}

#[tokio::test]
async fn test_messy_model_output_still_completes() {
    // Prose wrapping, fenced blocks, a missing key quote and trailing commas
    let messy_metadata = format!(
        "Here's the plan!\n```json\n{}\n```\nLet me know if you'd like changes.",
        r#"{"title": "Repaired Trip", "total_days": 2, "travelers": 2,}"#
    );
    let messy_block = r#"{
        days": [
            {"day_number": 1, "title": "Day 1", "location": "Lisbon"},
            {"day_number": 2, "title": "Day 2", "location": "Sintra"},
        ]
    }"#;

    let agent = agent_with_script(vec![
        Ok(messy_metadata),
        Ok(messy_block.to_string()),
    ]);

    let (tx, _rx) = mpsc::channel(16);
    let outcome = generate_iteratively(
        &agent,
        "weekend trip",
        &GenerationOptions::default(),
        tx,
    )
    .await;

    assert_eq!(outcome.progress.status, GenerationStatus::Complete);
    assert_eq!(outcome.itinerary.total_days(), 2);
    assert_eq!(outcome.itinerary.title, "Repaired Trip");
}

// =============================================================================
// Partial failure + resume through the store
// =============================================================================

#[tokio::test]
async fn test_partial_failure_persists_and_resumes() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let store = PlanStore::open(temp.path()).expect("Failed to open store");

    // First run: metadata and block 1 succeed, block 2 dies
    let agent = agent_with_script(vec![
        Ok(metadata_json("Interrupted Week", 6)),
        Ok(day_block_json(1, 3)),
        Err("upstream overloaded".to_string()),
    ]);

    let (tx, _rx) = mpsc::channel(16);
    let outcome = generate_iteratively(
        &agent,
        "six days in Portugal",
        &GenerationOptions::default(),
        tx,
    )
    .await;

    assert_eq!(outcome.progress.status, GenerationStatus::Partial);
    assert_eq!(outcome.progress.completed_days, 3);

    // Persist the partial run the way the CLI does
    let session = PlannerSession {
        itinerary: outcome.itinerary.clone(),
        generation_state: Some(GenerationState {
            requirements: "six days in Portugal".to_string(),
            language: "English".to_string(),
            block_size: 3,
            metadata: outcome.metadata.clone(),
            progress: outcome.progress.clone(),
        }),
        ..Default::default()
    };
    store.save_session("interrupted", &session).unwrap();

    // Reload and resume: picks up at day 4
    let loaded: PlannerSession = store.load_session("interrupted").unwrap();
    let state = loaded.generation_state.clone().unwrap();
    assert!(state.can_resume());

    let resume_agent = agent_with_script(vec![Ok(day_block_json(4, 6))]);
    let (tx, _rx) = mpsc::channel(16);
    let outcome = resume_generation(
        &resume_agent,
        &state.requirements,
        state.metadata.unwrap(),
        loaded.itinerary,
        &GenerationOptions {
            block_size: state.block_size,
            ..Default::default()
        },
        tx,
    )
    .await;

    assert_eq!(outcome.progress.status, GenerationStatus::Complete);
    assert_eq!(outcome.itinerary.total_days(), 6);
    let numbers: Vec<u32> = outcome.itinerary.days.iter().map(|d| d.day_number).collect();
    assert_eq!(numbers, vec![1, 2, 3, 4, 5, 6]);
}

#[tokio::test]
async fn test_error_state_is_not_resumable() {
    let agent = agent_with_script(vec![Err("bad gateway".to_string())]);

    let (tx, _rx) = mpsc::channel(16);
    let outcome =
        generate_iteratively(&agent, "a trip", &GenerationOptions::default(), tx).await;

    assert_eq!(outcome.progress.status, GenerationStatus::Error);

    let state = GenerationState {
        requirements: "a trip".to_string(),
        metadata: outcome.metadata,
        progress: outcome.progress,
        ..Default::default()
    };
    assert!(!state.can_resume());
}

// =============================================================================
// Persisted session format
// =============================================================================

#[test]
fn test_session_document_round_trip() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let store = PlanStore::open(temp.path()).expect("Failed to open store");

    let mut session = PlannerSession::default();
    session.chat_history.push(ChatMessage::user("5 days in Lisbon"));
    session.chat_history.push(ChatMessage::assistant("Lovely in June."));
    session.itinerary.title = "Lisbon".to_string();
    session.itinerary.blog_urls.push("https://example.com/lisbon".to_string());

    store.save_session("trip", &session).unwrap();
    let loaded: PlannerSession = store.load_session("trip").unwrap();
    assert_eq!(loaded, session);
}

#[test]
fn test_older_session_document_gets_defaults() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let store = PlanStore::open(temp.path()).expect("Failed to open store");

    // Hand-written older document: no destinations, language, blog_content
    // or generation_state fields
    let older = serde_json::json!({
        "itinerary": {"title": "Vintage Trip", "days": []},
        "chat_history": [{"role": "user", "content": "hello"}],
        "provider": "openai"
    });
    store.save_session("old", &older).unwrap();

    let loaded: PlannerSession = store.load_session("old").unwrap();
    assert_eq!(loaded.itinerary.title, "Vintage Trip");
    assert_eq!(loaded.provider, "openai");
    assert_eq!(loaded.language, "English");
    assert!(loaded.blog_content.is_empty());
    assert!(loaded.generation_state.is_none());
}

#[test]
fn test_plan_document_round_trip() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let store = PlanStore::open(temp.path()).expect("Failed to open store");

    let itinerary = Itinerary {
        title: "Store Me".to_string(),
        ..Default::default()
    };
    store.save_plan("store-me", &itinerary).unwrap();

    let loaded: Itinerary = store.load_plan("store-me").unwrap();
    assert_eq!(loaded, itinerary);
}

// =============================================================================
// Debug artifacts
// =============================================================================

#[tokio::test]
async fn test_generation_writes_debug_artifacts() {
    let temp = TempDir::new().expect("Failed to create temp dir");

    let agent = TravelAgent::new(
        Arc::new(ScriptedModel::new(vec![
            Ok(metadata_json("Debug Trip", 1)),
            Ok(day_block_json(1, 1)),
        ])),
        Arc::new(FileDebugSink::new(temp.path())),
    );

    let (tx, _rx) = mpsc::channel(16);
    let outcome =
        generate_iteratively(&agent, "one day", &GenerationOptions::default(), tx).await;
    assert_eq!(outcome.progress.status, GenerationStatus::Complete);

    let names: Vec<String> = std::fs::read_dir(temp.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();

    assert!(names.iter().any(|n| n.starts_with("metadata_scripted_")));
    assert!(names.iter().any(|n| n.starts_with("days_1_1_scripted_")));
}
