//! CLI argument parsing for planstore

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ps")]
#[command(author, version, about = "Named JSON document store for travel plans", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List saved plans and sessions
    List,

    /// Print a saved document as JSON
    Show {
        /// Document name
        #[arg(required = true)]
        name: String,

        /// Show the session document instead of the plan
        #[arg(short, long)]
        session: bool,
    },

    /// Delete a saved document
    Delete {
        /// Document name
        #[arg(required = true)]
        name: String,

        /// Delete the session document instead of the plan
        #[arg(short, long)]
        session: bool,
    },
}
