//! tripplanner - conversational trip planning CLI
//!
//! Entry point wiring config, the provider agent, the generation
//! orchestrator and persistence together.

use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use colored::*;
use eyre::{Context, Result, bail};
use tokio::sync::mpsc;
use tracing::info;

use planstore::PlanStore;
use tripplanner::cli::{Cli, Command, PlansCommand};
use tripplanner::config::Config;
use tripplanner::debug::{DebugSink, FileDebugSink, NullDebugSink};
use tripplanner::detect::DestinationDetector;
use tripplanner::domain::{
    ChatMessage, GenerationState, GenerationStatus, Itinerary, PlannerSession,
};
use tripplanner::generation::{
    GenerationOptions, GenerationUpdate, generate_iteratively, resume_generation,
};
use tripplanner::llm::{PromptContext, TravelAgent, create_model};
use tripplanner::render::{ItineraryRenderer, RenderStyle};
use tripplanner::services::{BlogScraper, PhotoService};

fn setup_logging(verbose: bool) -> Result<()> {
    // Logs go to a file so stdout stays clean for streamed chat output
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tripplanner")
        .join("logs");

    std::fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    let log_file =
        std::fs::File::create(log_dir.join("tripplanner.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (verbose: {})", verbose);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose).context("Failed to setup logging")?;

    let mut config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    match cli.command {
        Command::Chat { session, provider } => {
            if let Some(provider) = provider {
                config.llm.provider = provider;
            }
            config.validate()?;
            cmd_chat(&config, session).await
        }
        Command::Generate {
            requirements,
            session,
            name,
            block_size,
            language,
            no_photos,
            single_shot,
        } => {
            config.validate()?;
            cmd_generate(
                &config, requirements, session, name, block_size, language, no_photos, single_shot,
            )
            .await
        }
        Command::Resume { name } => {
            config.validate()?;
            cmd_resume(&config, &name).await
        }
        Command::Detect { text } => cmd_detect(&text),
        Command::Export { name, style } => cmd_export(&config, &name, style),
        Command::Plans { command } => cmd_plans(&config, command),
    }
}

/// Build the agent from config: provider model plus debug sink
fn build_agent(config: &Config) -> Result<TravelAgent> {
    let model = create_model(&config.llm)?;

    let sink: Arc<dyn DebugSink> = if config.debug.enabled {
        Arc::new(FileDebugSink::new(&config.debug.dir))
    } else {
        Arc::new(NullDebugSink)
    };

    Ok(TravelAgent::new(model, sink))
}

fn open_store(config: &Config) -> Result<PlanStore> {
    PlanStore::open(&config.storage.plans_dir)
}

/// One progress line per orchestrator snapshot
fn print_update(update: &GenerationUpdate) {
    let progress = &update.progress;
    match progress.status {
        GenerationStatus::GeneratingMetadata => {}
        GenerationStatus::GeneratingDays => {
            if progress.current_block_end == 0 {
                if let Some(metadata) = &update.metadata {
                    println!(
                        "{} {} ({} days, {} travelers)",
                        "plan".cyan(),
                        metadata.title.bold(),
                        progress.total_days,
                        update.itinerary.travelers
                    );
                }
            } else {
                println!(
                    "{} days {}-{} ({}/{})",
                    "✓".green(),
                    progress.current_block_start,
                    progress.current_block_end,
                    progress.completed_days,
                    progress.total_days
                );
            }
        }
        GenerationStatus::Complete => {
            println!(
                "{} itinerary complete ({} days)",
                "✓".green(),
                progress.completed_days
            );
        }
        GenerationStatus::Partial => {
            println!(
                "{} stopped after {}/{} days: {}",
                "✗".red(),
                progress.completed_days,
                progress.total_days,
                progress.error_message.as_deref().unwrap_or("unknown error")
            );
            println!("  resumable with: tp resume <name>");
        }
        GenerationStatus::Error => {
            println!(
                "{} generation failed: {}",
                "✗".red(),
                progress.error_message.as_deref().unwrap_or("unknown error")
            );
        }
    }
}

/// Spawn a task printing progress snapshots as they arrive
fn spawn_progress_printer(
    mut rx: mpsc::Receiver<GenerationUpdate>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(update) = rx.recv().await {
            print_update(&update);
        }
    })
}

/// Flatten a chat session into requirements text for generation
fn requirements_from_session(session: &PlannerSession) -> String {
    let mut parts: Vec<String> = session
        .chat_history
        .iter()
        .map(|msg| format!("{}: {}", msg.role.as_str(), msg.content))
        .collect();

    for content in session.blog_content.values() {
        parts.push(String::new());
        parts.push(format!(
            "Useful blog content:\n## {}\nTips: {}\nHighlights: {}",
            content.title,
            content.tips.join("; "),
            content.highlights.join("; ")
        ));
    }

    parts.join("\n")
}

fn plan_name_for(title: &str) -> String {
    let slug: String = title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    if slug.is_empty() { "itinerary".to_string() } else { slug }
}

#[allow(clippy::too_many_arguments)]
async fn cmd_generate(
    config: &Config,
    requirements: Option<String>,
    session_name: Option<String>,
    name: Option<String>,
    block_size: Option<u32>,
    language: Option<String>,
    no_photos: bool,
    single_shot: bool,
) -> Result<()> {
    let store = open_store(config)?;

    let mut session = match &session_name {
        Some(session_name) => store
            .load_session::<PlannerSession>(session_name)
            .ok_or_else(|| eyre::eyre!("No such session: {}", session_name))?,
        None => PlannerSession::default(),
    };

    let requirements = match requirements {
        Some(requirements) => requirements,
        None if session_name.is_some() => requirements_from_session(&session),
        None => bail!("Provide requirements text or --session <name>"),
    };

    let agent = build_agent(config)?;
    let options = GenerationOptions {
        block_size: block_size.unwrap_or(config.generation.block_size),
        language: language.unwrap_or_else(|| config.generation.language.clone()),
        destinations: session.destinations.primary.is_some().then(|| session.destinations.clone()),
    };

    println!(
        "Generating with {} ({})...",
        agent.name().bold(),
        agent.model_id()
    );

    if single_shot {
        return cmd_generate_single_shot(
            config, &store, session, &agent, &requirements, &options, name, no_photos,
        )
        .await;
    }

    let (tx, rx) = mpsc::channel(16);
    let printer = spawn_progress_printer(rx);
    let mut outcome = generate_iteratively(&agent, &requirements, &options, tx).await;
    let _ = printer.await;

    if outcome.progress.status == GenerationStatus::Complete && !no_photos {
        enrich_with_photos(&mut outcome.itinerary, config).await;
    }

    let plan_name = name.unwrap_or_else(|| plan_name_for(&outcome.itinerary.title));
    store.save_plan(&plan_name, &outcome.itinerary)?;

    session.itinerary = outcome.itinerary;
    session.language = options.language.clone();
    session.generation_state = Some(GenerationState {
        requirements,
        language: options.language.clone(),
        block_size: options.block_size,
        metadata: outcome.metadata,
        progress: outcome.progress.clone(),
    });
    store.save_session(&plan_name, &session)?;

    println!("Saved as {}", plan_name.bold());

    if outcome.progress.status == GenerationStatus::Error {
        bail!(
            "{}",
            outcome
                .progress
                .error_message
                .unwrap_or_else(|| "generation failed".to_string())
        );
    }
    Ok(())
}

/// One blocking full-itinerary call; an existing itinerary becomes update
/// context for the model instead of being regenerated from nothing
#[allow(clippy::too_many_arguments)]
async fn cmd_generate_single_shot(
    config: &Config,
    store: &PlanStore,
    mut session: PlannerSession,
    agent: &TravelAgent,
    requirements: &str,
    options: &GenerationOptions,
    name: Option<String>,
    no_photos: bool,
) -> Result<()> {
    let ctx = PromptContext::new()
        .with_language(options.language.clone())
        .with_destinations(options.destinations.clone().unwrap_or_default());

    let current = (!session.itinerary.days.is_empty()).then(|| session.itinerary.clone());

    let mut itinerary = agent
        .generate_full_itinerary(requirements, current.as_ref(), &ctx)
        .await
        .map_err(|e| eyre::eyre!("Generation failed: {}", e))?;

    println!(
        "{} itinerary complete ({} days)",
        "✓".green(),
        itinerary.total_days()
    );

    if !no_photos {
        enrich_with_photos(&mut itinerary, config).await;
    }

    let plan_name = name.unwrap_or_else(|| plan_name_for(&itinerary.title));
    store.save_plan(&plan_name, &itinerary)?;
    session.itinerary = itinerary;
    session.language = options.language.clone();
    store.save_session(&plan_name, &session)?;

    println!("Saved as {}", plan_name.bold());
    Ok(())
}

async fn cmd_resume(config: &Config, name: &str) -> Result<()> {
    let store = open_store(config)?;

    let mut session = store
        .load_session::<PlannerSession>(name)
        .ok_or_else(|| eyre::eyre!("No such session: {}", name))?;

    let Some(state) = session.generation_state.clone() else {
        bail!("Session {} has no saved generation state", name);
    };
    if !state.can_resume() {
        bail!(
            "Session {} is not resumable (status: {}, {} days done)",
            name,
            state.progress.status,
            state.progress.completed_days
        );
    }
    let Some(metadata) = state.metadata.clone() else {
        bail!("Session {} has no saved metadata", name);
    };

    let agent = build_agent(config)?;
    let options = GenerationOptions {
        block_size: state.block_size.max(1),
        language: state.language.clone(),
        destinations: session.destinations.primary.is_some().then(|| session.destinations.clone()),
    };

    println!(
        "Resuming {} at day {} with {}...",
        name.bold(),
        state.progress.completed_days + 1,
        agent.name().bold()
    );

    let (tx, rx) = mpsc::channel(16);
    let printer = spawn_progress_printer(rx);
    let outcome = resume_generation(
        &agent,
        &state.requirements,
        metadata,
        session.itinerary.clone(),
        &options,
        tx,
    )
    .await;
    let _ = printer.await;

    store.save_plan(name, &outcome.itinerary)?;
    session.itinerary = outcome.itinerary;
    session.generation_state = Some(GenerationState {
        requirements: state.requirements,
        language: state.language,
        block_size: state.block_size,
        metadata: outcome.metadata,
        progress: outcome.progress.clone(),
    });
    store.save_session(name, &session)?;

    if outcome.progress.status == GenerationStatus::Error {
        bail!(
            "{}",
            outcome
                .progress
                .error_message
                .unwrap_or_else(|| "generation failed".to_string())
        );
    }
    Ok(())
}

/// Fetch photos for each day's suggested image queries
async fn enrich_with_photos(itinerary: &mut Itinerary, config: &Config) {
    let service = PhotoService::from_config(&config.photos);

    for day in &mut itinerary.days {
        if day.image_queries.is_empty() {
            continue;
        }
        let paths = service
            .fetch_for_queries(&day.image_queries, config.photos.max_images)
            .await;
        if !paths.is_empty() {
            day.image_paths = paths
                .iter()
                .map(|p| p.to_string_lossy().to_string())
                .collect();
        }
    }
}

async fn cmd_chat(config: &Config, session_name: Option<String>) -> Result<()> {
    let store = open_store(config)?;
    let detector = DestinationDetector::new();
    let scraper = BlogScraper::new();
    let agent = build_agent(config)?;

    let mut session = session_name
        .as_ref()
        .and_then(|n| store.load_session::<PlannerSession>(n))
        .unwrap_or_default();
    session.provider = config.llm.provider.clone();

    println!(
        "Chatting with {} ({}). Type 'exit' to quit.",
        agent.name().bold(),
        agent.model_id()
    );

    let mut rl = rustyline::DefaultEditor::new()?;
    loop {
        let line = match rl.readline("you> ") {
            Ok(line) => line,
            Err(_) => break,
        };
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }
        if line == "exit" || line == "quit" {
            break;
        }
        let _ = rl.add_history_entry(&line);

        // Blog URLs pasted into the chat become planning context
        for url in extract_urls(&line) {
            let destination = session.destinations.primary.as_ref().map(|d| d.name.clone());
            match scraper
                .scrape_with_agent(&url, &agent, destination.as_deref())
                .await
            {
                Some(content) => {
                    println!(
                        "{} scraped \"{}\" ({} tips)",
                        "blog".yellow(),
                        content.title,
                        content.tips.len()
                    );
                    if !session.itinerary.blog_urls.contains(&url) {
                        session.itinerary.blog_urls.push(url.clone());
                    }
                    session.blog_content.insert(url, content.into());
                }
                None => println!("{} could not scrape {}", "blog".yellow(), url),
            }
        }

        // Cheap pre-filter gates the LLM detection round-trip
        if !detector.extract_from_text(&line).is_empty() {
            let mut window = session.chat_history.clone();
            window.push(ChatMessage::user(line.clone()));
            let detected = detector.extract_from_conversation(&window, &agent).await;
            if detected.primary.is_some() {
                println!(
                    "{} planning for {}",
                    "dest".cyan(),
                    detected.display_name().bold()
                );
                session.destinations = detected;
            }
        }

        let ctx = PromptContext::new()
            .with_language(session.language.clone())
            .with_destinations(session.destinations.clone());

        let (tx, mut rx) = mpsc::channel::<String>(32);
        let echo = tokio::spawn(async move {
            while let Some(chunk) = rx.recv().await {
                print!("{}", chunk);
                let _ = std::io::stdout().flush();
            }
            println!();
        });

        match agent.stream_chat(&line, &session.chat_history, &ctx, tx).await {
            Ok(reply) => {
                let _ = echo.await;
                session.chat_history.push(ChatMessage::user(line));
                session.chat_history.push(ChatMessage::assistant(reply));
            }
            Err(e) => {
                let _ = echo.await;
                println!("{} {}", "✗".red(), e);
            }
        }
    }

    if let Some(name) = session_name {
        store.save_session(&name, &session)?;
        println!("Session saved as {}", name.bold());
    }
    Ok(())
}

/// Absolute http(s) URLs in a chat line
fn extract_urls(text: &str) -> Vec<String> {
    text.split_whitespace()
        .filter(|word| word.starts_with("http://") || word.starts_with("https://"))
        .map(|word| word.trim_end_matches([',', '.', ')', ';']).to_string())
        .collect()
}

fn cmd_detect(text: &str) -> Result<()> {
    let detector = DestinationDetector::new();
    let candidates = detector.extract_from_text(text);

    if candidates.is_empty() {
        println!("No destinations detected");
    } else {
        for candidate in candidates {
            println!("{}", candidate);
        }
    }
    Ok(())
}

fn cmd_export(config: &Config, name: &str, style: RenderStyle) -> Result<()> {
    let store = open_store(config)?;
    let itinerary: Itinerary = store
        .load_plan(name)
        .ok_or_else(|| eyre::eyre!("No such plan: {}", name))?;

    let renderer = ItineraryRenderer::new(&config.storage.exports_dir)?;
    let path = renderer.render(&itinerary, style)?;
    println!("{} {}", "✓".green(), path.display());
    Ok(())
}

fn cmd_plans(config: &Config, command: PlansCommand) -> Result<()> {
    let store = open_store(config)?;

    match command {
        PlansCommand::List => {
            let plans = store.list_plans()?;
            let sessions = store.list_sessions()?;
            if plans.is_empty() && sessions.is_empty() {
                println!("No saved plans");
                return Ok(());
            }
            for name in plans {
                println!("{} {}", "plan".cyan(), name);
            }
            for name in sessions {
                println!("{} {}", "session".yellow(), name);
            }
        }
        PlansCommand::Show { name } => {
            let itinerary: Itinerary = store
                .load_plan(&name)
                .ok_or_else(|| eyre::eyre!("No such plan: {}", name))?;
            println!("{}", serde_json::to_string_pretty(&itinerary)?);
        }
        PlansCommand::Delete { name } => {
            let deleted = store.delete_plan(&name);
            store.delete_session(&name);
            if deleted {
                println!("{} deleted {}", "✓".green(), name);
            } else {
                bail!("No such plan: {}", name);
            }
        }
    }
    Ok(())
}
