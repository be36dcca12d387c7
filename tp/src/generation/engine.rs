//! The iterative generation state machine
//!
//! A run moves through `generating_metadata -> generating_days` and ends in
//! `complete`, `partial` or `error`. Progress snapshots are pushed over a
//! channel after the metadata step and after every day block, so a UI can
//! render between blocks; the driver also returns the final snapshot.
//!
//! Expected failures (provider errors, malformed responses) never surface
//! as `Err` from the drivers - they are encoded in the final snapshot's
//! status and error message. Callers inspect state, not exceptions.
//!
//! Day blocks are merged into the itinerary at the end of every block,
//! success or failure, which is what makes a mid-run failure resumable:
//! committed days are never discarded.

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::domain::{
    DayPlan, GenerationProgress, GenerationStatus, Itinerary, ItineraryMetadata, TripDestinations,
};
use crate::llm::{PromptContext, TravelAgent};

/// Options for one generation run
#[derive(Debug, Clone)]
pub struct GenerationOptions {
    /// Days generated per LLM call; the last block may be shorter
    pub block_size: u32,
    /// Output language for generated content
    pub language: String,
    /// Destination context for prompt building
    pub destinations: Option<TripDestinations>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            block_size: 3,
            language: "English".to_string(),
            destinations: None,
        }
    }
}

impl GenerationOptions {
    fn prompt_context(&self) -> PromptContext {
        let mut ctx = PromptContext::new().with_language(self.language.clone());
        if let Some(destinations) = &self.destinations {
            ctx = ctx.with_destinations(destinations.clone());
        }
        ctx
    }
}

/// One progress snapshot: where the run is and what exists so far
///
/// The metadata is included so callers can persist it in case resume is
/// needed later.
#[derive(Debug, Clone)]
pub struct GenerationUpdate {
    pub progress: GenerationProgress,
    pub itinerary: Itinerary,
    pub metadata: Option<ItineraryMetadata>,
}

/// Partition `[1, total_days]` into consecutive inclusive blocks
///
/// Total and deterministic: `blocks(7, 3) == [(1,3), (4,6), (7,7)]`.
pub fn blocks(total_days: u32, block_size: u32) -> Vec<(u32, u32)> {
    blocks_from(1, total_days, block_size)
}

/// Remaining blocks starting at `start_day`
fn blocks_from(start_day: u32, total_days: u32, block_size: u32) -> Vec<(u32, u32)> {
    let block_size = block_size.max(1);
    let mut result = Vec::new();
    let mut start = start_day.max(1);

    while start <= total_days {
        let end = (start + block_size - 1).min(total_days);
        result.push((start, end));
        start = end + 1;
    }

    result
}

/// Generate an itinerary iteratively from scratch
///
/// Generates metadata first (the model determines total_days), then days in
/// blocks. A snapshot is sent after each step; the final one is returned.
pub async fn generate_iteratively(
    agent: &TravelAgent,
    requirements: &str,
    options: &GenerationOptions,
    update_tx: mpsc::Sender<GenerationUpdate>,
) -> GenerationUpdate {
    let ctx = options.prompt_context();

    let mut progress = GenerationProgress {
        status: GenerationStatus::GeneratingMetadata,
        ..Default::default()
    };

    // Step 1: metadata. A failure here is terminal and not resumable -
    // nothing has been committed yet.
    let metadata = match agent.generate_metadata(requirements, &ctx).await {
        Ok(metadata) => metadata,
        Err(e) => {
            warn!(error = %e, "Metadata generation failed");
            progress.status = GenerationStatus::Error;
            progress.error_message = Some(format!("Failed to generate metadata: {}", e));
            let update = GenerationUpdate {
                progress,
                itinerary: Itinerary::default(),
                metadata: None,
            };
            let _ = update_tx.send(update.clone()).await;
            return update;
        }
    };

    let itinerary = Itinerary::from_metadata(&metadata);
    progress.total_days = metadata.total_days.max(1);
    progress.status = GenerationStatus::GeneratingDays;

    info!(
        total_days = progress.total_days,
        title = %metadata.title,
        "Metadata generated, starting day blocks"
    );
    let _ = update_tx
        .send(GenerationUpdate {
            progress: progress.clone(),
            itinerary: itinerary.clone(),
            metadata: Some(metadata.clone()),
        })
        .await;

    generate_days(
        agent,
        requirements,
        metadata,
        itinerary,
        progress,
        Vec::new(),
        options,
        &ctx,
        update_tx,
    )
    .await
}

/// Resume itinerary generation from a partial state
///
/// Metadata is never regenerated; the next block starts right after the
/// last committed day, and existing days are carried as both result and
/// continuity context.
pub async fn resume_generation(
    agent: &TravelAgent,
    requirements: &str,
    metadata: ItineraryMetadata,
    existing_itinerary: Itinerary,
    options: &GenerationOptions,
    update_tx: mpsc::Sender<GenerationUpdate>,
) -> GenerationUpdate {
    let ctx = options.prompt_context();

    let total_days = metadata.total_days.max(1);
    let existing_days = existing_itinerary.days.clone();
    let completed_days = existing_days.len() as u32;

    let progress = GenerationProgress {
        total_days,
        completed_days,
        current_block_start: completed_days + 1,
        current_block_end: 0,
        status: GenerationStatus::GeneratingDays,
        error_message: None,
    };

    info!(completed_days, total_days, "Resuming generation");
    let _ = update_tx
        .send(GenerationUpdate {
            progress: progress.clone(),
            itinerary: existing_itinerary.clone(),
            metadata: Some(metadata.clone()),
        })
        .await;

    generate_days(
        agent,
        requirements,
        metadata,
        existing_itinerary,
        progress,
        existing_days,
        options,
        &ctx,
        update_tx,
    )
    .await
}

/// Shared day-block loop for fresh and resumed runs
#[allow(clippy::too_many_arguments)]
async fn generate_days(
    agent: &TravelAgent,
    requirements: &str,
    metadata: ItineraryMetadata,
    mut itinerary: Itinerary,
    mut progress: GenerationProgress,
    existing_days: Vec<DayPlan>,
    options: &GenerationOptions,
    ctx: &PromptContext,
    update_tx: mpsc::Sender<GenerationUpdate>,
) -> GenerationUpdate {
    let total_days = progress.total_days;
    let mut all_days = existing_days;
    let start_from = all_days.len() as u32 + 1;

    let day_blocks = blocks_from(start_from, total_days, options.block_size);

    if day_blocks.is_empty() {
        // Already complete
        progress.status = GenerationStatus::Complete;
        let update = GenerationUpdate {
            progress,
            itinerary,
            metadata: Some(metadata),
        };
        let _ = update_tx.send(update.clone()).await;
        return update;
    }

    for (start_day, end_day) in day_blocks {
        progress.current_block_start = start_day;
        progress.current_block_end = end_day;

        match agent
            .generate_day_block(
                requirements,
                &metadata,
                start_day,
                end_day,
                total_days,
                &all_days,
                ctx,
            )
            .await
        {
            Ok(new_days) => {
                all_days.extend(new_days);
                all_days.sort_by_key(|d| d.day_number);

                // Commit every block as it lands; this is what makes a
                // later failure resumable
                itinerary.days = all_days.clone();
                progress.completed_days = all_days.len() as u32;

                if progress.completed_days >= total_days {
                    progress.status = GenerationStatus::Complete;
                }

                let update = GenerationUpdate {
                    progress: progress.clone(),
                    itinerary: itinerary.clone(),
                    metadata: Some(metadata.clone()),
                };
                let _ = update_tx.send(update.clone()).await;

                if progress.status == GenerationStatus::Complete {
                    return update;
                }
            }
            Err(e) => {
                // Partial if any days were committed (this run or a prior
                // one), error otherwise; remaining blocks are abandoned
                progress.status = if progress.completed_days > 0 {
                    GenerationStatus::Partial
                } else {
                    GenerationStatus::Error
                };
                progress.error_message = Some(format!(
                    "Failed to generate days {}-{}: {}",
                    start_day, end_day, e
                ));
                warn!(
                    start_day,
                    end_day,
                    status = %progress.status,
                    "Day block generation failed"
                );

                let update = GenerationUpdate {
                    progress,
                    itinerary,
                    metadata: Some(metadata),
                };
                let _ = update_tx.send(update.clone()).await;
                return update;
            }
        }
    }

    // The loop exhausted without the final block reporting completion;
    // force complete rather than trusting day counts to line up
    progress.status = GenerationStatus::Complete;
    let update = GenerationUpdate {
        progress,
        itinerary,
        metadata: Some(metadata),
    };
    let _ = update_tx.send(update.clone()).await;
    update
}
