//! Itinerary domain types
//!
//! The typed shape of a generated trip: metadata, day plans, activities and
//! tips. Parsing is deliberately tolerant - model output routinely contains
//! loosely formatted dates, times and category labels, and a single bad
//! field must never reject an otherwise usable itinerary.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Parse a loosely formatted date string
///
/// Accepts `YYYY-MM-DD` or an ISO-8601 datetime; empty strings and the
/// literal "null" are treated as absent. Anything else is absent too.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() || raw == "null" {
        return None;
    }
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.date());
    }
    None
}

/// Parse a loosely formatted time-of-day string
///
/// Accepts 24-hour `HH:MM[:SS]` and 12-hour `H:MM AM/PM` (with or without
/// the space). Unparseable input is absent, never an error.
pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    if raw.is_empty() || raw == "null" {
        return None;
    }
    for fmt in ["%H:%M", "%H:%M:%S"] {
        if let Ok(t) = NaiveTime::parse_from_str(raw, fmt) {
            return Some(t);
        }
    }
    // Meridiem matching is case-sensitive in chrono
    let upper = raw.to_uppercase();
    for fmt in ["%I:%M %p", "%I:%M%p"] {
        if let Ok(t) = NaiveTime::parse_from_str(&upper, fmt) {
            return Some(t);
        }
    }
    None
}

fn de_lenient_date<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(d)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => parse_date(&s),
        _ => None,
    })
}

fn de_lenient_time<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveTime>, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(d)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => parse_time(&s),
        _ => None,
    })
}

/// Closed set of activity categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    #[default]
    Sightseeing,
    Adventure,
    Dining,
    Transport,
    Accommodation,
    Relaxation,
    Wildlife,
    Cultural,
    Shopping,
    Nature,
    Beach,
    Food,
    Other,
}

/// Common model-generated variations mapped onto the closed category set
const ACTIVITY_TYPE_ALIASES: &[(&str, ActivityType)] = &[
    ("culture", ActivityType::Cultural),
    ("food", ActivityType::Dining),
    ("restaurant", ActivityType::Dining),
    ("eating", ActivityType::Dining),
    ("travel", ActivityType::Transport),
    ("flight", ActivityType::Transport),
    ("bus", ActivityType::Transport),
    ("train", ActivityType::Transport),
    ("taxi", ActivityType::Transport),
    ("hotel", ActivityType::Accommodation),
    ("stay", ActivityType::Accommodation),
    ("lodge", ActivityType::Accommodation),
    ("hostel", ActivityType::Accommodation),
    ("rest", ActivityType::Relaxation),
    ("spa", ActivityType::Relaxation),
    ("beach", ActivityType::Relaxation),
    ("hike", ActivityType::Adventure),
    ("hiking", ActivityType::Adventure),
    ("trek", ActivityType::Adventure),
    ("trekking", ActivityType::Adventure),
    ("snorkeling", ActivityType::Adventure),
    ("diving", ActivityType::Adventure),
    ("water", ActivityType::Adventure),
    ("tour", ActivityType::Sightseeing),
    ("visit", ActivityType::Sightseeing),
    ("explore", ActivityType::Sightseeing),
    ("museum", ActivityType::Cultural),
    ("temple", ActivityType::Cultural),
    ("market", ActivityType::Shopping),
    ("animals", ActivityType::Wildlife),
    ("safari", ActivityType::Wildlife),
    ("jungle", ActivityType::Wildlife),
    ("rainforest", ActivityType::Wildlife),
    ("nature", ActivityType::Wildlife),
];

impl ActivityType {
    /// Normalize any input string onto the closed category set
    ///
    /// Lower-cases and trims, consults the alias table, then tries a direct
    /// name match. Unrecognized input falls back to `Sightseeing`; this is
    /// total and never fails.
    pub fn normalize(raw: &str) -> Self {
        let lower = raw.trim().to_lowercase();

        // Aliases take precedence: "beach" means relaxation, not the
        // literal beach category, matching how models use the word
        for (alias, ty) in ACTIVITY_TYPE_ALIASES {
            if *alias == lower {
                return *ty;
            }
        }

        Self::from_name(&lower).unwrap_or_default()
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "sightseeing" => Some(Self::Sightseeing),
            "adventure" => Some(Self::Adventure),
            "dining" => Some(Self::Dining),
            "transport" => Some(Self::Transport),
            "accommodation" => Some(Self::Accommodation),
            "relaxation" => Some(Self::Relaxation),
            "wildlife" => Some(Self::Wildlife),
            "cultural" => Some(Self::Cultural),
            "shopping" => Some(Self::Shopping),
            "nature" => Some(Self::Nature),
            "beach" => Some(Self::Beach),
            "food" => Some(Self::Food),
            "other" => Some(Self::Other),
            _ => None,
        }
    }

    /// Lowercase category name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sightseeing => "sightseeing",
            Self::Adventure => "adventure",
            Self::Dining => "dining",
            Self::Transport => "transport",
            Self::Accommodation => "accommodation",
            Self::Relaxation => "relaxation",
            Self::Wildlife => "wildlife",
            Self::Cultural => "cultural",
            Self::Shopping => "shopping",
            Self::Nature => "nature",
            Self::Beach => "beach",
            Self::Food => "food",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for ActivityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

fn de_activity_type<'de, D: Deserializer<'de>>(d: D) -> Result<ActivityType, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(d)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => ActivityType::normalize(&s),
        _ => ActivityType::default(),
    })
}

fn default_tip_category() -> String {
    "general".to_string()
}

/// A practical travel tip with a free-text category label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelTip {
    pub title: String,
    pub content: String,
    #[serde(default = "default_tip_category")]
    pub category: String,
}

/// One bookable or visitable unit within a day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,

    /// Always a member of the closed category set; raw model labels are
    /// normalized on the way in
    #[serde(default, deserialize_with = "de_activity_type")]
    pub activity_type: ActivityType,

    #[serde(default, deserialize_with = "de_lenient_time")]
    pub start_time: Option<NaiveTime>,
    #[serde(default, deserialize_with = "de_lenient_time")]
    pub end_time: Option<NaiveTime>,

    /// Free-form estimate like "$25 per person"
    #[serde(default)]
    pub cost_estimate: Option<String>,
    #[serde(default)]
    pub booking_required: bool,
    #[serde(default)]
    pub booking_link: Option<String>,

    #[serde(default)]
    pub tips: Vec<TravelTip>,

    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub image_path: Option<String>,
}

/// One day of the trip, with its activities in authored order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayPlan {
    /// Position within the itinerary; unique and defines ordering
    pub day_number: u32,
    #[serde(default, deserialize_with = "de_lenient_date")]
    pub date: Option<NaiveDate>,
    pub title: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub summary: String,

    #[serde(default)]
    pub activities: Vec<Activity>,
    #[serde(default)]
    pub tips: Vec<TravelTip>,
    #[serde(default)]
    pub weather_note: Option<String>,

    /// Search queries for illustrating this day, suggested by the model
    #[serde(default)]
    pub image_queries: Vec<String>,
    /// Locally cached images resolved from the queries
    #[serde(default)]
    pub image_paths: Vec<String>,
}

/// Day-independent shell of a trip, generated before any day content
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItineraryMetadata {
    pub title: String,
    pub description: String,

    /// Trip length inferred by the model from conversational cues
    pub total_days: u32,

    #[serde(deserialize_with = "de_lenient_date")]
    pub start_date: Option<NaiveDate>,
    #[serde(deserialize_with = "de_lenient_date")]
    pub end_date: Option<NaiveDate>,

    pub travelers: u32,
    pub general_tips: Vec<TravelTip>,
    pub packing_list: Vec<String>,
    pub budget_estimate: Option<String>,
    pub emergency_contacts: BTreeMap<String, String>,
}

fn default_itinerary_title() -> String {
    "My Travel Adventure".to_string()
}

fn default_travelers() -> u32 {
    4
}

/// A complete (or in-progress) trip itinerary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Itinerary {
    pub title: String,
    pub description: String,
    #[serde(deserialize_with = "de_lenient_date")]
    pub start_date: Option<NaiveDate>,
    #[serde(deserialize_with = "de_lenient_date")]
    pub end_date: Option<NaiveDate>,
    pub travelers: u32,

    /// Sorted ascending by day_number whenever materialized for display
    pub days: Vec<DayPlan>,

    pub general_tips: Vec<TravelTip>,
    pub packing_list: Vec<String>,
    pub budget_estimate: Option<String>,
    pub emergency_contacts: BTreeMap<String, String>,

    /// Travel blogs referenced while planning
    pub blog_urls: Vec<String>,
}

impl Default for Itinerary {
    fn default() -> Self {
        Self {
            title: default_itinerary_title(),
            description: String::new(),
            start_date: None,
            end_date: None,
            travelers: default_travelers(),
            days: Vec::new(),
            general_tips: Vec::new(),
            packing_list: Vec::new(),
            budget_estimate: None,
            emergency_contacts: BTreeMap::new(),
            blog_urls: Vec::new(),
        }
    }
}

impl Itinerary {
    /// Build an empty itinerary from generated metadata (days empty)
    pub fn from_metadata(metadata: &ItineraryMetadata) -> Self {
        Self {
            title: metadata.title.clone(),
            description: metadata.description.clone(),
            start_date: metadata.start_date,
            end_date: metadata.end_date,
            travelers: metadata.travelers.max(1),
            days: Vec::new(),
            general_tips: metadata.general_tips.clone(),
            packing_list: metadata.packing_list.clone(),
            budget_estimate: metadata.budget_estimate.clone(),
            emergency_contacts: metadata.emergency_contacts.clone(),
            blog_urls: Vec::new(),
        }
    }

    /// Insert a day, keeping `days` sorted by day_number
    pub fn add_day(&mut self, day: DayPlan) {
        self.days.push(day);
        self.days.sort_by_key(|d| d.day_number);
    }

    /// Look up a day by its number
    pub fn get_day(&self, day_number: u32) -> Option<&DayPlan> {
        self.days.iter().find(|d| d.day_number == day_number)
    }

    /// Trip length, derived from the days actually present
    pub fn total_days(&self) -> usize {
        self.days.len()
    }
}
