//! Prompt construction
//!
//! The system prompt is a Handlebars template filled per call with a
//! destination-expertise block and an optional language-enforcement clause.
//! There is no prompt state on the agents: every request renders fresh from
//! the current destination context and language.

use std::sync::LazyLock;

use handlebars::Handlebars;
use serde::Serialize;

use crate::domain::{DayPlan, Itinerary, ItineraryMetadata, TripDestinations};

/// Destination-agnostic system prompt template
pub const SYSTEM_PROMPT_TEMPLATE: &str = "\
You are an expert travel planner specializing in family trips.
You help families plan memorable, safe, and enriching travel experiences.

{{{destination_expertise}}}

When helping plan a trip:
1. Ask about travel dates, number of travelers (adults/children ages)
2. Understand interests (wildlife, beaches, adventure, culture)
3. Consider budget constraints
4. Suggest day-by-day itineraries with specific activities
5. Provide practical tips (what to pack, vaccinations, etc.)
6. Include restaurant and accommodation recommendations

Always be helpful, specific, and consider family-friendly options.
Format your responses clearly with headers and bullet points when listing activities or tips.

When asked to create or update the itinerary, structure your response to include:
- Day number and location
- Morning, afternoon, and evening activities
- Estimated costs where relevant
- Tips specific to each activity or location
{{{language_instruction}}}";

/// Expertise block used when no destination has been detected yet
pub const DEFAULT_EXPERTISE: &str = "\
Your expertise includes:
- Global destination knowledge
- Family-friendly activities and accommodations
- Local cuisine and dining recommendations
- Weather patterns and best times to visit
- Budget planning and cost estimates
- Safety tips and health precautions";

#[derive(Serialize)]
struct SystemPromptContext {
    destination_expertise: String,
    language_instruction: String,
}

static HBS: LazyLock<Handlebars<'static>> = LazyLock::new(Handlebars::new);

/// Build the expertise block for the detected destinations
pub fn build_destination_expertise(destinations: Option<&TripDestinations>) -> String {
    let Some(destinations) = destinations else {
        return DEFAULT_EXPERTISE.to_string();
    };
    let Some(dest) = &destinations.primary else {
        return DEFAULT_EXPERTISE.to_string();
    };

    let mut lines = vec![format!("Your expertise includes planning trips to {}:", dest.name)];

    if !dest.key_attractions.is_empty() {
        let attractions: Vec<&str> = dest
            .key_attractions
            .iter()
            .take(5)
            .map(String::as_str)
            .collect();
        lines.push(format!("- Key attractions: {}", attractions.join(", ")));
    }
    if let Some(cuisine) = &dest.local_cuisine {
        lines.push(format!("- Local cuisine: {}", cuisine));
    }
    if let Some(best_time) = &dest.best_time_to_visit {
        lines.push(format!("- Best time to visit: {}", best_time));
    }

    lines.push("- Family-friendly activities and accommodations".to_string());
    lines.push("- Local customs and cultural considerations".to_string());
    lines.push("- Budget planning and cost estimates".to_string());
    lines.push("- Safety tips and health precautions".to_string());

    if !destinations.secondary.is_empty() {
        let names: Vec<&str> = destinations
            .secondary
            .iter()
            .take(3)
            .map(|d| d.name.as_str())
            .collect();
        lines.push(format!("- Also familiar with: {}", names.join(", ")));
    }

    lines.join("\n")
}

/// Build the language-enforcement clause; empty for English
pub fn build_language_instruction(language: &str) -> String {
    if language.eq_ignore_ascii_case("english") {
        return String::new();
    }
    format!(
        "\nIMPORTANT: Generate ALL content in {}. This includes activity names, descriptions, \
         tips, day summaries, and packing list items. Keep proper names (places, restaurants) \
         in their original form.",
        language
    )
}

/// Render the full system prompt for the current destination context and language
///
/// Pure function of its inputs. The template is a compile-time constant, so
/// a render failure falls back to the bare template rather than erroring.
pub fn build_system_prompt(destinations: Option<&TripDestinations>, language: &str) -> String {
    let context = SystemPromptContext {
        destination_expertise: build_destination_expertise(destinations),
        language_instruction: build_language_instruction(language),
    };

    HBS.render_template(SYSTEM_PROMPT_TEMPLATE, &context)
        .unwrap_or_else(|_| SYSTEM_PROMPT_TEMPLATE.to_string())
}

/// Fixed output-schema instruction for full-itinerary generation
pub const ITINERARY_SCHEMA_PROMPT: &str = r#"Based on the conversation and requirements, generate a complete travel itinerary in JSON format.

The JSON should follow this exact structure:
{
    "title": "Trip title",
    "description": "Brief description",
    "start_date": "YYYY-MM-DD or null",
    "end_date": "YYYY-MM-DD or null",
    "travelers": 4,
    "days": [
        {
            "day_number": 1,
            "date": "YYYY-MM-DD or null",
            "title": "Day title",
            "location": "City/Area name",
            "summary": "Brief summary of the day",
            "activities": [
                {
                    "name": "Activity name",
                    "description": "What you'll do",
                    "location": "Specific location",
                    "activity_type": "sightseeing|adventure|dining|transport|accommodation|relaxation|wildlife|cultural|shopping",
                    "start_time": "HH:MM or null",
                    "end_time": "HH:MM or null",
                    "cost_estimate": "$XX or null",
                    "booking_required": true,
                    "booking_link": "URL or null",
                    "tips": [{"title": "Tip title", "content": "Tip content", "category": "general"}]
                }
            ],
            "tips": [{"title": "Day tip", "content": "Content", "category": "general"}],
            "weather_note": "Expected weather or null",
            "image_queries": ["search query for a photo of this day"]
        }
    ],
    "general_tips": [{"title": "General tip", "content": "Content", "category": "packing|health|safety|money|culture"}],
    "packing_list": ["Item 1", "Item 2"],
    "budget_estimate": "Total estimate or null",
    "emergency_contacts": {"Police": "999", "Ambulance": "999"}
}

Return ONLY the JSON, no other text. Make it comprehensive based on all discussed plans."#;

/// Fixed output-schema instruction for metadata-only generation
pub const METADATA_SCHEMA_PROMPT: &str = r#"Based on the conversation and requirements, generate ONLY the trip-level metadata in JSON format. Do NOT generate day-by-day plans yet.

Determine the total number of days from the conversation. If the travelers never said an exact length, infer a sensible one from the cues they gave (destinations mentioned, pace, dates).

The JSON should follow this exact structure:
{
    "title": "Trip title",
    "description": "Brief description",
    "total_days": 7,
    "start_date": "YYYY-MM-DD or null",
    "end_date": "YYYY-MM-DD or null",
    "travelers": 4,
    "general_tips": [{"title": "General tip", "content": "Content", "category": "packing|health|safety|money|culture"}],
    "packing_list": ["Item 1", "Item 2"],
    "budget_estimate": "Total estimate or null",
    "emergency_contacts": {"Police": "999", "Ambulance": "999"}
}

Return ONLY the JSON, no other text."#;

/// Prompt for one generation op: requirements plus optional language note
fn language_note(language: &str) -> String {
    if language.eq_ignore_ascii_case("english") {
        return String::new();
    }
    format!("\n\nIMPORTANT: Generate all text content in {}.\n", language)
}

/// Build the user prompt for full-itinerary generation
pub fn build_itinerary_prompt(
    requirements: &str,
    current_itinerary: Option<&Itinerary>,
    language: &str,
) -> String {
    let mut context = String::new();
    if let Some(itinerary) = current_itinerary {
        let json = serde_json::to_string_pretty(itinerary).unwrap_or_default();
        context = format!("\n\nCurrent itinerary to update/expand:\n{}", json);
    }

    format!(
        "{}{}{}\n\n{}",
        requirements,
        context,
        language_note(language),
        ITINERARY_SCHEMA_PROMPT
    )
}

/// Build the user prompt for metadata-only generation
pub fn build_metadata_prompt(requirements: &str, language: &str) -> String {
    format!(
        "{}{}\n\n{}",
        requirements,
        language_note(language),
        METADATA_SCHEMA_PROMPT
    )
}

/// Textual continuity digest of already-generated days
///
/// Location + title + up to three activity names per day, so the model can
/// avoid repeating itself in the next block.
pub fn summarize_previous_days(days: &[DayPlan]) -> String {
    if days.is_empty() {
        return String::new();
    }

    let mut lines = vec!["Days already planned (do not repeat these activities or locations):".to_string()];
    for day in days {
        let names: Vec<&str> = day
            .activities
            .iter()
            .take(3)
            .map(|a| a.name.as_str())
            .collect();
        let mut summary = format!("- Day {} ({}): {}", day.day_number, day.location, day.title);
        if !names.is_empty() {
            summary.push_str(&format!(" - {}", names.join(", ")));
            if day.activities.len() > 3 {
                summary.push_str(&format!(" (+{} more)", day.activities.len() - 3));
            }
        }
        lines.push(summary);
    }

    lines.join("\n")
}

/// Build the user prompt for one day-block generation
pub fn build_day_block_prompt(
    requirements: &str,
    metadata: &ItineraryMetadata,
    start_day: u32,
    end_day: u32,
    total_days: u32,
    previous_days: &[DayPlan],
    language: &str,
) -> String {
    let continuity = summarize_previous_days(previous_days);
    let continuity_block = if continuity.is_empty() {
        String::new()
    } else {
        format!("\n\n{}", continuity)
    };

    format!(
        r#"{requirements}

Trip: {title} - {description}
You are generating days {start_day} through {end_day} of a {total_days}-day trip.{continuity_block}{language_note}

Generate ONLY days {start_day} to {end_day} in JSON format:
{{
    "days": [
        {{
            "day_number": {start_day},
            "date": "YYYY-MM-DD or null",
            "title": "Day title",
            "location": "City/Area name",
            "summary": "Brief summary of the day",
            "activities": [
                {{
                    "name": "Activity name",
                    "description": "What you'll do",
                    "location": "Specific location",
                    "activity_type": "sightseeing|adventure|dining|transport|accommodation|relaxation|wildlife|cultural|shopping",
                    "start_time": "HH:MM or null",
                    "end_time": "HH:MM or null",
                    "cost_estimate": "$XX or null",
                    "booking_required": false,
                    "booking_link": "URL or null",
                    "tips": [{{"title": "Tip title", "content": "Tip content", "category": "general"}}]
                }}
            ],
            "tips": [{{"title": "Day tip", "content": "Content", "category": "general"}}],
            "weather_note": "Expected weather or null",
            "image_queries": ["search query for a photo of this day"]
        }}
    ]
}}

Return ONLY the JSON, no other text. Use consecutive day_number values from {start_day} to {end_day}."#,
        requirements = requirements,
        title = metadata.title,
        description = metadata.description,
        start_day = start_day,
        end_day = end_day,
        total_days = total_days,
        continuity_block = continuity_block,
        language_note = language_note(language),
    )
}
