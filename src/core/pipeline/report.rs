//! Per-entry outcomes and the run report.

use crate::core::comparator::{DuplicateGroup, MatchType};
use crate::error::EntryError;
use crate::events::PipelineSummary;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What happened to one (non-directory) archive entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EntryOutcome {
    /// Unique image, written to the output
    Kept { path: String },
    /// Near-duplicate of an earlier image, left out
    Dropped {
        path: String,
        duplicate_of: String,
        distance: u32,
        match_type: MatchType,
    },
    /// Rejected before or during fingerprinting
    Skipped { path: String, reason: EntryError },
    /// Non-image copied unchanged under [`NonImagePolicy::PassThrough`]
    ///
    /// [`NonImagePolicy::PassThrough`]: crate::core::config::NonImagePolicy::PassThrough
    PassedThrough { path: String },
}

impl EntryOutcome {
    pub fn path(&self) -> &str {
        match self {
            EntryOutcome::Kept { path }
            | EntryOutcome::Dropped { path, .. }
            | EntryOutcome::Skipped { path, .. }
            | EntryOutcome::PassedThrough { path } => path,
        }
    }

    /// Whether the entry ends up in the output archive
    pub fn is_retained(&self) -> bool {
        matches!(
            self,
            EntryOutcome::Kept { .. } | EntryOutcome::PassedThrough { .. }
        )
    }
}

/// Result of a deduplication run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupReport {
    /// Input archive
    pub input: PathBuf,
    /// Written archive; `None` for dry runs
    pub output: Option<PathBuf>,
    /// One outcome per non-directory entry, in archive order
    pub outcomes: Vec<EntryOutcome>,
    /// Representatives that absorbed at least one duplicate
    pub groups: Vec<DuplicateGroup>,
    pub duration_ms: u64,
}

impl DedupReport {
    /// Paths written to the output, in archive order
    pub fn retained_paths(&self) -> impl Iterator<Item = &str> {
        self.outcomes
            .iter()
            .filter(|o| o.is_retained())
            .map(EntryOutcome::path)
    }

    /// Unique images, in archive order
    pub fn kept(&self) -> impl Iterator<Item = &str> {
        self.outcomes.iter().filter_map(|o| match o {
            EntryOutcome::Kept { path } => Some(path.as_str()),
            _ => None,
        })
    }

    pub fn dropped(&self) -> impl Iterator<Item = &EntryOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, EntryOutcome::Dropped { .. }))
    }

    pub fn skipped(&self) -> impl Iterator<Item = (&str, &EntryError)> {
        self.outcomes.iter().filter_map(|o| match o {
            EntryOutcome::Skipped { path, reason } => Some((path.as_str(), reason)),
            _ => None,
        })
    }

    pub fn summary(&self) -> PipelineSummary {
        PipelineSummary {
            total_entries: self.outcomes.len(),
            kept: self.kept().count(),
            dropped: self.dropped().count(),
            skipped: self.skipped().count(),
            duration_ms: self.duration_ms,
        }
    }
}
