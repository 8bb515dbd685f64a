//! Run configuration.
//!
//! A [`DedupConfig`] is assembled once (by the CLI or a
//! [`PipelineBuilder`](crate::core::pipeline::PipelineBuilder)), validated,
//! and then only read by every stage.

use crate::error::DedupError;
use serde::{Deserialize, Serialize};

/// 1 GiB
pub const DEFAULT_MAX_ZIP_SIZE: u64 = 1024 * 1024 * 1024;
/// 50 MiB
pub const DEFAULT_MAX_IMAGE_SIZE: u64 = 50 * 1024 * 1024;
/// Declared uncompressed total may be at most this multiple of `max_zip_size`.
pub const DEFAULT_MAX_EXPANSION_FACTOR: u64 = 10;
/// 8x8 grid, 64-bit fingerprint
pub const DEFAULT_HASH_SIZE: u32 = 8;
pub const DEFAULT_HASH_DIFF_THRESHOLD: u32 = 5;
pub const DEFAULT_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "gif", "tiff"];

/// What happens to entries whose extension is not an image extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NonImagePolicy {
    /// Report as unsupported and leave out of the output
    #[default]
    Skip,
    /// Copy into the output unchanged, without fingerprinting
    PassThrough,
}

/// Immutable settings for one deduplication run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupConfig {
    /// Reject the input archive if its on-disk size exceeds this (bytes)
    pub max_zip_size: u64,
    /// Skip any entry whose uncompressed size exceeds this (bytes)
    pub max_image_size: u64,
    /// Zip-bomb guard, see [`DEFAULT_MAX_EXPANSION_FACTOR`]
    pub max_expansion_factor: u64,
    /// Fingerprint grid dimension; fingerprints have `hash_size²` bits
    pub hash_size: u32,
    /// Maximum Hamming distance counted as a duplicate
    pub hash_diff_threshold: u32,
    /// Lowercase extensions without the leading dot
    pub valid_extensions: Vec<String>,
    pub non_image_policy: NonImagePolicy,
    /// Process entries under dot-directories or with dot-names.
    /// `__MACOSX` metadata is skipped either way.
    pub include_hidden: bool,
    /// Use the band index to narrow comparisons
    pub bucketing: bool,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            max_zip_size: DEFAULT_MAX_ZIP_SIZE,
            max_image_size: DEFAULT_MAX_IMAGE_SIZE,
            max_expansion_factor: DEFAULT_MAX_EXPANSION_FACTOR,
            hash_size: DEFAULT_HASH_SIZE,
            hash_diff_threshold: DEFAULT_HASH_DIFF_THRESHOLD,
            valid_extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            non_image_policy: NonImagePolicy::Skip,
            include_hidden: true,
            bucketing: true,
        }
    }
}

impl DedupConfig {
    /// Normalize an extension as given by a user: `.PNG` -> `png`
    pub fn normalize_extension(ext: &str) -> String {
        ext.trim().trim_start_matches('.').to_lowercase()
    }

    /// Replace the extension allow-list, normalizing each entry
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.valid_extensions = extensions
            .into_iter()
            .map(|e| Self::normalize_extension(e.as_ref()))
            .filter(|e| !e.is_empty())
            .collect();
        self
    }

    /// Number of bits in a fingerprint under this configuration
    pub fn fingerprint_bits(&self) -> u32 {
        self.hash_size * self.hash_size
    }

    /// Check that the configuration describes a runnable pipeline
    pub fn validate(&self) -> Result<(), DedupError> {
        if !(2..=64).contains(&self.hash_size) {
            return Err(DedupError::Config(format!(
                "hash size must be between 2 and 64, got {}",
                self.hash_size
            )));
        }
        if self.hash_diff_threshold > self.fingerprint_bits() {
            return Err(DedupError::Config(format!(
                "threshold {} exceeds fingerprint length of {} bits",
                self.hash_diff_threshold,
                self.fingerprint_bits()
            )));
        }
        if self.max_zip_size == 0 || self.max_image_size == 0 {
            return Err(DedupError::Config(
                "size limits must be greater than zero".to_string(),
            ));
        }
        if self.max_expansion_factor == 0 {
            return Err(DedupError::Config(
                "expansion factor must be at least 1".to_string(),
            ));
        }
        if self.valid_extensions.is_empty() {
            return Err(DedupError::Config(
                "at least one image extension is required".to_string(),
            ));
        }
        Ok(())
    }
}
