//! # Pipeline Module
//!
//! Orchestrates one deduplication run.
//!
//! ## Pipeline Stages
//! 1. **Read** - Validate the archive and list its entries
//! 2. **Fingerprint** - Admit, decode and hash each entry in archive order,
//!    deciding kept or dropped as it goes
//! 3. **Write** - Assemble the retained entries into the output archive
//!
//! Entries are processed one at a time; the result depends on archive
//! order, so there is no parallel stage.

mod executor;
mod report;

pub use executor::{dedupe_bytes, Pipeline, PipelineBuilder, DEFAULT_OUTPUT_NAME};
pub use report::{DedupReport, EntryOutcome};
