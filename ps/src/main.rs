use clap::Parser;
use colored::*;
use eyre::Result;

use planstore::PlanStore;
use planstore::cli::{Cli, Command};
use planstore::config::Config;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_ref())?;
    let store = PlanStore::open(&config.docs_dir)?;

    match cli.command {
        Command::List => {
            let plans = store.list_plans()?;
            let sessions = store.list_sessions()?;

            if plans.is_empty() && sessions.is_empty() {
                println!("No saved documents");
                return Ok(());
            }

            for name in plans {
                println!("{} {}", "plan".cyan(), name);
            }
            for name in sessions {
                println!("{} {}", "session".yellow(), name);
            }
        }
        Command::Show { name, session } => {
            let doc: Option<serde_json::Value> = if session {
                store.load_session(&name)
            } else {
                store.load_plan(&name)
            };

            match doc {
                Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
                None => {
                    eprintln!("{} No such document: {}", "✗".red(), name);
                    std::process::exit(1);
                }
            }
        }
        Command::Delete { name, session } => {
            let deleted = if session {
                store.delete_session(&name)
            } else {
                store.delete_plan(&name)
            };

            if deleted {
                println!("{} Deleted: {}", "✓".green(), name);
            } else {
                eprintln!("{} No such document: {}", "✗".red(), name);
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
