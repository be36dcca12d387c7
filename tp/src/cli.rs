//! CLI argument parsing for tripplanner

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::render::RenderStyle;

#[derive(Parser, Debug)]
#[command(name = "tp")]
#[command(author, version, about = "Conversational trip planner", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Interactive planning chat; blog URLs pasted into the chat are
    /// scraped for tips
    Chat {
        /// Session name to load and save
        #[arg(short, long)]
        session: Option<String>,

        /// Override the configured provider (anthropic, openai, gemini)
        #[arg(short, long)]
        provider: Option<String>,
    },

    /// Generate an itinerary from requirements text
    Generate {
        /// Trip requirements, e.g. "5-day family trip to Lisbon in June"
        requirements: Option<String>,

        /// Build requirements from a saved chat session instead
        #[arg(short, long)]
        session: Option<String>,

        /// Name to save the plan under (defaults to the generated title)
        #[arg(short, long)]
        name: Option<String>,

        /// Days per generation block
        #[arg(short, long)]
        block_size: Option<u32>,

        /// Output language
        #[arg(short, long)]
        language: Option<String>,

        /// Skip photo fetching even when an access key is configured
        #[arg(long)]
        no_photos: bool,

        /// One blocking generation call instead of the block-wise pipeline;
        /// an existing itinerary in the session is updated rather than
        /// replaced
        #[arg(long)]
        single_shot: bool,
    },

    /// Resume a partially generated itinerary
    Resume {
        /// Name the plan was saved under
        name: String,
    },

    /// Run the destination pre-filter over a piece of text
    Detect {
        /// Text to scan
        text: String,
    },

    /// Render a saved itinerary to a printable document
    Export {
        /// Name the plan was saved under
        name: String,

        /// Visual style
        #[arg(short, long, value_enum, default_value_t = RenderStyle::Magazine)]
        style: RenderStyle,
    },

    /// Inspect saved plans and sessions
    Plans {
        #[command(subcommand)]
        command: PlansCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum PlansCommand {
    /// List saved plans and sessions
    List,

    /// Print a saved plan as JSON
    Show {
        /// Plan name
        name: String,
    },

    /// Delete a saved plan and its session
    Delete {
        /// Plan name
        name: String,
    },
}
