//! Trait definitions for comparison strategies.

use super::MatchType;

/// Strategy trait for determining if two images are duplicates
pub trait ComparisonStrategy {
    /// Determine if two images should be considered duplicates based on distance
    fn is_duplicate(&self, distance: u32) -> bool;

    /// Classify the match type based on distance
    fn classify(&self, distance: u32) -> MatchType {
        MatchType::from_distance(distance)
    }

    /// Largest distance still counted as a duplicate
    fn threshold(&self) -> u32;
}

/// Simple threshold-based comparison strategy
#[derive(Debug, Clone, Copy)]
pub struct ThresholdStrategy {
    /// Maximum distance to consider as duplicate
    threshold: u32,
}

impl ThresholdStrategy {
    pub fn new(threshold: u32) -> Self {
        Self { threshold }
    }
}

impl Default for ThresholdStrategy {
    fn default() -> Self {
        Self::new(crate::core::config::DEFAULT_HASH_DIFF_THRESHOLD)
    }
}

impl ComparisonStrategy for ThresholdStrategy {
    fn is_duplicate(&self, distance: u32) -> bool {
        distance <= self.threshold
    }

    fn threshold(&self) -> u32 {
        self.threshold
    }
}
