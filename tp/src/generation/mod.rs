//! Iterative itinerary generation
//!
//! Generates itineraries in blocks to provide progress feedback and handle
//! longer trips more effectively. Supports resuming from partial completion.

mod engine;

pub use engine::{
    GenerationOptions, GenerationUpdate, blocks, generate_iteratively, resume_generation,
};
