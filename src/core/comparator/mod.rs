//! # Comparator Module
//!
//! The duplicate grouper: decides, image by image, whether a fingerprint
//! is new or a near-duplicate of an earlier one.
//!
//! ## How It Works
//! 1. Compare the new fingerprint against every representative so far
//!    (or only the [`BandIndex`] candidates, which finds the same matches)
//! 2. Within the threshold: drop it into the earliest matching group
//! 3. Otherwise it becomes a representative itself
//!
//! ## Comparison Thresholds
//! | Distance | Classification |
//! |----------|---------------|
//! | 0        | Exact match   |
//! | 1-4      | Near-exact    |
//! | 5-10     | Similar       |
//! | 11+      | Possibly similar |

mod bands;
mod grouper;
mod traits;

pub use bands::BandIndex;
pub use grouper::FirstSeenGrouper;
pub use traits::{ComparisonStrategy, ThresholdStrategy};

use crate::core::hasher::{Fingerprint, PerceptualHash};
use serde::{Deserialize, Serialize};

/// Classification of match types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchType {
    /// Distance = 0, identical perceptual content
    Exact,
    /// Distance 1-4, virtually identical
    NearExact,
    /// Distance 5-10, likely duplicates
    Similar,
    /// Distance 11+, only a duplicate under a permissive threshold
    MaybeSimilar,
}

impl MatchType {
    /// Classify based on Hamming distance
    pub fn from_distance(distance: u32) -> Self {
        match distance {
            0 => MatchType::Exact,
            1..=4 => MatchType::NearExact,
            5..=10 => MatchType::Similar,
            _ => MatchType::MaybeSimilar,
        }
    }
}

impl std::fmt::Display for MatchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchType::Exact => write!(f, "Exact Match"),
            MatchType::NearExact => write!(f, "Near-Exact Match"),
            MatchType::Similar => write!(f, "Similar"),
            MatchType::MaybeSimilar => write!(f, "Possibly Similar"),
        }
    }
}

/// Outcome of observing one fingerprint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// No earlier image is within the threshold; keep it
    Unique,
    /// Drop it: `representative` is the earliest image within the threshold
    Duplicate {
        representative: String,
        distance: u32,
        match_type: MatchType,
    },
}

/// A dropped image and how close it was to its representative
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupMember {
    pub path: String,
    pub distance: u32,
    pub similarity_percent: f64,
    pub match_type: MatchType,
}

/// A kept image and the images discarded as its duplicates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// The kept image
    pub representative: String,
    /// Representative fingerprint in hex
    pub fingerprint: String,
    /// Dropped images in archive order
    pub duplicates: Vec<GroupMember>,
}

impl DuplicateGroup {
    pub fn new(representative: String, fingerprint: &Fingerprint) -> Self {
        Self {
            representative,
            fingerprint: fingerprint.to_hex(),
            duplicates: Vec::new(),
        }
    }

    /// Get the number of duplicates (excluding the representative)
    pub fn duplicate_count(&self) -> usize {
        self.duplicates.len()
    }

    /// All paths in the group, representative first
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.representative.as_str())
            .chain(self.duplicates.iter().map(|m| m.path.as_str()))
    }
}
