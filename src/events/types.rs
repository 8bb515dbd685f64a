//! Event type definitions for progress reporting.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted by the deduplication pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Input archive events
    Archive(ArchiveEvent),
    /// Per-entry processing events
    Entry(EntryEvent),
    /// Pipeline-level events
    Pipeline(PipelineEvent),
}

/// Events about the input archive
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ArchiveEvent {
    /// The archive passed validation and its directory was read
    Opened {
        path: PathBuf,
        entries: usize,
        size_bytes: u64,
    },
}

/// Events while entries are fingerprinted and grouped
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EntryEvent {
    /// Processing has started
    Started { total_entries: usize },
    /// One entry has been decided
    Progress(EntryProgress),
    /// Every entry has been decided
    Completed {
        kept: usize,
        dropped: usize,
        skipped: usize,
    },
}

/// Progress information during fingerprinting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryProgress {
    /// Entries decided so far
    pub processed: usize,
    /// Total entries in the archive
    pub total: usize,
    /// Archive path of the entry just decided
    pub current_path: String,
}

/// Pipeline-level events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PipelineEvent {
    /// Pipeline has started
    Started,
    /// Moving to a new phase
    PhaseChanged { phase: PipelinePhase },
    /// Pipeline completed successfully
    Completed { summary: PipelineSummary },
}

/// Phases of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelinePhase {
    Reading,
    Fingerprinting,
    Writing,
}

/// Summary of pipeline results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    pub total_entries: usize,
    pub kept: usize,
    pub dropped: usize,
    pub skipped: usize,
    pub duration_ms: u64,
}

impl std::fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelinePhase::Reading => write!(f, "Reading archive"),
            PipelinePhase::Fingerprinting => write!(f, "Fingerprinting"),
            PipelinePhase::Writing => write!(f, "Writing archive"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_serializable() {
        let event = Event::Entry(EntryEvent::Progress(EntryProgress {
            processed: 3,
            total: 10,
            current_path: "album/c.png".to_string(),
        }));

        let json = serde_json::to_string(&event).unwrap();
        let deserialized: Event = serde_json::from_str(&json).unwrap();

        match deserialized {
            Event::Entry(EntryEvent::Progress(p)) => {
                assert_eq!(p.processed, 3);
                assert_eq!(p.current_path, "album/c.png");
            }
            _ => panic!("Wrong event type"),
        }
    }

    #[test]
    fn phase_display() {
        assert_eq!(PipelinePhase::Fingerprinting.to_string(), "Fingerprinting");
    }
}
