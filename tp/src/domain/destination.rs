//! Destination types produced by the destination detector

use serde::{Deserialize, Serialize};

/// A travel destination detected from conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Destination {
    /// e.g. "Japan", "Tokyo", "Southeast Asia"
    pub name: String,
    pub country: Option<String>,
    /// e.g. "Asia"
    pub region: Option<String>,
    /// 0.0-1.0 confidence score
    pub confidence: f64,

    // Destination-specific context for prompt building
    pub key_attractions: Vec<String>,
    pub local_cuisine: Option<String>,
    pub best_time_to_visit: Option<String>,
}

impl Default for Destination {
    fn default() -> Self {
        Self {
            name: String::new(),
            country: None,
            region: None,
            confidence: 1.0,
            key_attractions: Vec::new(),
            local_cuisine: None,
            best_time_to_visit: None,
        }
    }
}

impl Destination {
    /// Image search queries for illustrating this destination
    pub fn to_image_queries(&self) -> Vec<String> {
        let mut queries = vec![
            format!("{} travel", self.name),
            format!("{} landscape", self.name),
            format!("{} landmarks", self.name),
        ];
        if let Some(country) = &self.country
            && country != &self.name
        {
            queries.push(format!("{} scenery", country));
        }
        queries
    }
}

/// Primary and secondary destinations of a trip
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TripDestinations {
    pub primary: Option<Destination>,
    pub secondary: Vec<Destination>,
}

impl TripDestinations {
    /// All destinations as a flat list, primary first
    pub fn all_destinations(&self) -> Vec<&Destination> {
        self.primary.iter().chain(self.secondary.iter()).collect()
    }

    /// Human-readable name for the trip destination(s)
    pub fn display_name(&self) -> String {
        let Some(primary) = &self.primary else {
            return "Your Trip".to_string();
        };
        if self.secondary.is_empty() {
            return primary.name.clone();
        }
        let mut names = vec![primary.name.as_str()];
        names.extend(self.secondary.iter().take(2).map(|d| d.name.as_str()));
        names.join(" & ")
    }
}
