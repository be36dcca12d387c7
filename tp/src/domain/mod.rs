//! Domain types for the trip planner

mod destination;
mod itinerary;
mod progress;
mod session;

pub use destination::{Destination, TripDestinations};
pub use itinerary::{
    Activity, ActivityType, DayPlan, Itinerary, ItineraryMetadata, TravelTip, parse_date,
    parse_time,
};
pub use progress::{GenerationProgress, GenerationState, GenerationStatus};
pub use session::{ChatMessage, PlannerSession, Role, SavedBlogContent};
