//! # Core Module
//!
//! The UI-agnostic deduplication engine.
//!
//! ## Modules
//! - `config` - Limits, hash parameters and entry policies
//! - `archive` - Reads the input ZIP and writes the deduplicated one
//! - `hasher` - Computes average-hash fingerprints
//! - `comparator` - Groups near-duplicate fingerprints, first seen wins
//! - `pipeline` - Orchestrates the full workflow

pub mod archive;
pub mod comparator;
pub mod config;
pub mod hasher;
pub mod pipeline;

// Re-export commonly used types
pub use comparator::{Decision, DuplicateGroup, MatchType};
pub use config::{DedupConfig, NonImagePolicy};
pub use hasher::{AverageHasher, Fingerprint, PerceptualHash};
pub use pipeline::{DedupReport, EntryOutcome, Pipeline};
