//! # Archive Module
//!
//! ZIP input and output.
//!
//! - [`ArchiveReader`] validates the input and yields entries in stored
//!   order, which is the tie-break order for duplicate detection
//! - [`EntryFilter`] classifies entries by name
//! - [`ScratchSpace`] spools retained entries to a private temp directory
//! - [`ArchiveWriter`] / [`OutputArchive`] assemble the result, keeping
//!   every path exactly as it was read

mod filter;
mod reader;
mod scratch;
mod writer;

pub use filter::EntryFilter;
pub use reader::ArchiveReader;
pub use scratch::{ScratchFile, ScratchSpace};
pub use writer::{ArchiveWriter, OutputArchive, DEFAULT_OUTPUT_NAME};

use crate::core::config::DedupConfig;
use crate::error::ArchiveError;
use serde::{Deserialize, Serialize};

/// Central-directory information about one entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryHeader {
    /// Position in the archive
    pub index: usize,
    /// Archive-relative path exactly as stored
    pub path: String,
    /// Declared uncompressed size
    pub size: u64,
    pub compressed_size: u64,
    pub is_dir: bool,
    /// False when the name is absolute or climbs out with `..`
    pub is_safe: bool,
}

/// Archive-level ceilings checked before any entry is decompressed
#[derive(Debug, Clone, Copy)]
pub struct ArchiveLimits {
    pub max_zip_size: u64,
    pub max_expansion_factor: u64,
}

impl ArchiveLimits {
    pub fn from_config(config: &DedupConfig) -> Self {
        Self {
            max_zip_size: config.max_zip_size,
            max_expansion_factor: config.max_expansion_factor,
        }
    }

    pub fn check_archive_size(&self, size: u64) -> Result<(), ArchiveError> {
        if size > self.max_zip_size {
            return Err(ArchiveError::TooLarge {
                size,
                limit: self.max_zip_size,
            });
        }
        Ok(())
    }

    /// Compare the declared uncompressed total against the expansion ceiling
    pub fn check_expansion(&self, uncompressed: u64) -> Result<(), ArchiveError> {
        let limit = self.max_zip_size.saturating_mul(self.max_expansion_factor);
        if uncompressed > limit {
            return Err(ArchiveError::SuspiciousCompression {
                uncompressed,
                limit,
            });
        }
        Ok(())
    }
}
