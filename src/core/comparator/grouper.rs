//! Order-dependent duplicate grouping.
//!
//! Images are observed one at a time in archive order. The first image of
//! a look-alike set becomes its representative; every later image within
//! the threshold of any representative is dropped into that
//! representative's group and never becomes a representative itself.

use super::bands::BandIndex;
use super::traits::{ComparisonStrategy, ThresholdStrategy};
use super::{Decision, DuplicateGroup, GroupMember};
use crate::core::hasher::{Fingerprint, PerceptualHash};
use tracing::trace;

struct Representative {
    path: String,
    fingerprint: Fingerprint,
    group: DuplicateGroup,
}

/// First-encountered-wins grouper
pub struct FirstSeenGrouper<S: ComparisonStrategy = ThresholdStrategy> {
    strategy: S,
    bucketing: bool,
    /// Built on the first observation, once the fingerprint length is known
    index: Option<BandIndex>,
    /// In insertion order; the index refers to positions in this list
    seen: Vec<Representative>,
}

impl<S: ComparisonStrategy> FirstSeenGrouper<S> {
    /// Grouper that narrows comparisons with a [`BandIndex`]
    pub fn new(strategy: S) -> Self {
        Self::with_bucketing(strategy, true)
    }

    /// Grouper that compares every image against every representative
    pub fn linear(strategy: S) -> Self {
        Self::with_bucketing(strategy, false)
    }

    pub fn with_bucketing(strategy: S, bucketing: bool) -> Self {
        Self {
            strategy,
            bucketing,
            index: None,
            seen: Vec::new(),
        }
    }

    /// Decide whether `path` is new or a duplicate of an earlier image
    pub fn observe(&mut self, path: &str, fingerprint: Fingerprint) -> Decision {
        if self.seen.is_empty() && self.bucketing {
            self.index = BandIndex::new(fingerprint.bit_count(), self.strategy.threshold());
        }

        if let Some((position, distance)) = self.first_match(&fingerprint) {
            let representative = &mut self.seen[position];
            let match_type = self.strategy.classify(distance);
            representative.group.duplicates.push(GroupMember {
                path: path.to_string(),
                distance,
                similarity_percent: representative.fingerprint.similarity(&fingerprint),
                match_type,
            });
            trace!(path, representative = %representative.path, distance, "Duplicate");
            return Decision::Duplicate {
                representative: representative.path.clone(),
                distance,
                match_type,
            };
        }

        if let Some(index) = self.index.as_mut() {
            index.insert(&fingerprint);
        }
        self.seen.push(Representative {
            path: path.to_string(),
            group: DuplicateGroup::new(path.to_string(), &fingerprint),
            fingerprint,
        });
        Decision::Unique
    }

    /// Earliest representative within the threshold
    fn first_match(&self, fingerprint: &Fingerprint) -> Option<(usize, u32)> {
        let within = |position: usize| {
            let distance = self.seen[position].fingerprint.distance(fingerprint);
            self.strategy
                .is_duplicate(distance)
                .then_some((position, distance))
        };

        match &self.index {
            Some(index) => index.candidates(fingerprint).into_iter().find_map(within),
            None => (0..self.seen.len()).find_map(within),
        }
    }

    /// Representative paths in the order they were first seen
    pub fn representatives(&self) -> impl Iterator<Item = &str> {
        self.seen.iter().map(|r| r.path.as_str())
    }

    /// Number of representatives
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Groups that absorbed at least one duplicate, in representative order
    pub fn into_groups(self) -> Vec<DuplicateGroup> {
        self.seen
            .into_iter()
            .map(|r| r.group)
            .filter(|g| !g.duplicates.is_empty())
            .collect()
    }

    /// Run a whole stream through a fresh grouper and return the kept paths
    pub fn retain<I>(strategy: S, items: I) -> Vec<String>
    where
        I: IntoIterator<Item = (String, Fingerprint)>,
    {
        let mut grouper = Self::new(strategy);
        items
            .into_iter()
            .filter_map(|(path, fingerprint)| match grouper.observe(&path, fingerprint) {
                Decision::Unique => Some(path),
                Decision::Duplicate { .. } => None,
            })
            .collect()
    }
}
