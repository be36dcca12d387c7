//! Generation progress and resume-state snapshots
//!
//! Pure value types: the orchestrator mutates its own copies and hands out
//! clones; nothing here has behavior beyond small derived accessors.

use serde::{Deserialize, Serialize};

use super::ItineraryMetadata;

/// Where a generation run currently is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStatus {
    /// Generating the day-independent trip shell
    #[default]
    GeneratingMetadata,
    /// Generating day blocks
    GeneratingDays,
    /// All days generated
    Complete,
    /// Failed after at least one day was committed; resumable
    Partial,
    /// Failed with nothing committed; not resumable
    Error,
}

impl GenerationStatus {
    /// Terminal states end the run
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Partial | Self::Error)
    }
}

impl std::fmt::Display for GenerationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::GeneratingMetadata => "generating_metadata",
            Self::GeneratingDays => "generating_days",
            Self::Complete => "complete",
            Self::Partial => "partial",
            Self::Error => "error",
        };
        write!(f, "{}", s)
    }
}

/// Snapshot of one generation run's progress
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationProgress {
    pub total_days: u32,
    pub completed_days: u32,

    /// Inclusive day range of the block currently being generated
    pub current_block_start: u32,
    pub current_block_end: u32,

    pub status: GenerationStatus,
    pub error_message: Option<String>,
}

/// Persistable snapshot that lets a run be resumed later
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationState {
    /// Trip requirements text the run was started with
    pub requirements: String,
    /// Output language
    pub language: String,
    /// Days per generation block
    pub block_size: u32,
    /// Metadata from the original run; never regenerated on resume
    pub metadata: Option<ItineraryMetadata>,
    /// Last observed progress
    pub progress: GenerationProgress,
}

impl GenerationState {
    /// A run can resume only from `partial` with at least one committed day
    pub fn can_resume(&self) -> bool {
        self.progress.status == GenerationStatus::Partial && self.progress.completed_days > 0
    }
}
