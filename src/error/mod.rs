//! # Error Module
//!
//! Error types for the archive deduplicator.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - entry paths, sizes and limits
//! - **Two tiers** - [`EntryError`] is recovered per entry, everything
//!   else aborts the run

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum DedupError {
    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),

    #[error("Write error: {0}")]
    Write(#[from] WriteError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl DedupError {
    /// Process exit code for this error, following sysexits.h conventions.
    pub fn exit_code(&self) -> u8 {
        match self {
            DedupError::Config(_) => exit_codes::USAGE_ERROR,
            DedupError::Archive(ArchiveError::NotFound { .. }) => exit_codes::INPUT_ERROR,
            DedupError::Archive(ArchiveError::Io { .. }) => exit_codes::IO_ERROR,
            DedupError::Archive(_) => exit_codes::DATA_ERROR,
            DedupError::Write(_) => exit_codes::IO_ERROR,
        }
    }
}

/// Exit codes used by the `zip-dedup` binary.
pub mod exit_codes {
    /// Invalid arguments or configuration (EX_USAGE).
    pub const USAGE_ERROR: u8 = 64;
    /// The input archive was rejected (EX_DATAERR).
    pub const DATA_ERROR: u8 = 65;
    /// The input archive does not exist (EX_NOINPUT).
    pub const INPUT_ERROR: u8 = 66;
    /// Reading or writing failed (EX_IOERR).
    pub const IO_ERROR: u8 = 74;
}

/// Fatal errors about the input archive as a whole
#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Input zip file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("ZIP file too large ({size} bytes). Maximum allowed: {limit} bytes")]
    TooLarge { size: u64, limit: u64 },

    #[error(
        "Suspicious ZIP file detected (possible zip bomb): {uncompressed} bytes uncompressed, \
         maximum allowed: {limit} bytes"
    )]
    SuspiciousCompression { uncompressed: u64, limit: u64 },

    #[error("File is not a valid ZIP archive: {reason}")]
    Invalid { reason: String },

    #[error("ZIP file is corrupted at entry {entry}: {reason}")]
    Corrupted { entry: String, reason: String },

    #[error("Failed to read archive {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Per-entry failures. The entry is excluded and the run continues.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryError {
    #[error("Unsupported file type: {path}")]
    UnsupportedFormat { path: String },

    #[error("Image too large: {path} ({size} bytes). Maximum allowed: {limit} bytes")]
    ImageTooLarge { path: String, size: u64, limit: u64 },

    #[error("Invalid or corrupted image {path}: {reason}")]
    Decode { path: String, reason: String },

    #[error("Image is empty: {path}")]
    EmptyImage { path: String },

    #[error("Entry path escapes the archive root: {path}")]
    UnsafePath { path: String },

    #[error("Hidden entry: {path}")]
    Hidden { path: String },
}

impl EntryError {
    /// Whether this failure should be surfaced as a warning.
    ///
    /// Filtered-out entries are expected in most archives and are only
    /// logged at debug level.
    pub fn is_warning(&self) -> bool {
        !matches!(
            self,
            EntryError::UnsupportedFormat { .. } | EntryError::Hidden { .. }
        )
    }
}

/// Fatal errors while assembling the output archive
#[derive(Error, Debug)]
pub enum WriteError {
    #[error("Failed to create output directory {path}: {source}")]
    CreateOutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Scratch storage failed: {source}")]
    Scratch {
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write archive entry {entry}: {reason}")]
    Archive { entry: String, reason: String },

    #[error("Failed to save output archive {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, DedupError>;
