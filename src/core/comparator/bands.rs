//! # Band Index
//!
//! Narrows the fingerprints a new image must be compared against.
//!
//! ## How It Works
//! 1. Split every fingerprint into `threshold + 1` contiguous bit bands
//! 2. Bucket each stored fingerprint under the exact value of each band
//! 3. Candidates for a new fingerprint are everything sharing any band
//!
//! Two fingerprints within `threshold` bits of each other differ in at
//! most `threshold` bands, so with `threshold + 1` bands at least one band
//! is identical: a true duplicate is always a candidate. False candidates
//! are filtered out by the exact distance check afterwards.

use crate::core::hasher::{Fingerprint, PerceptualHash};
use std::collections::{BTreeSet, HashMap};

/// Bit pattern of one band
type BandKey = Vec<u8>;

pub struct BandIndex {
    /// Bit ranges `[start, end)` of each band
    ranges: Vec<(u32, u32)>,
    /// Per band: band value -> indices of inserted fingerprints
    tables: Vec<HashMap<BandKey, Vec<usize>>>,
    len: usize,
}

impl BandIndex {
    /// Index for `bit_count`-bit fingerprints compared at `threshold`.
    ///
    /// Returns `None` when the threshold leaves no band that must match.
    pub fn new(bit_count: u32, threshold: u32) -> Option<Self> {
        if threshold >= bit_count {
            return None;
        }
        let bands = threshold + 1;

        let ranges: Vec<(u32, u32)> = (0..bands)
            .map(|b| (b * bit_count / bands, (b + 1) * bit_count / bands))
            .collect();
        let tables = ranges.iter().map(|_| HashMap::new()).collect();

        Some(Self {
            ranges,
            tables,
            len: 0,
        })
    }

    pub fn bands(&self) -> usize {
        self.ranges.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Register a fingerprint; it is assigned the next index
    pub fn insert(&mut self, fingerprint: &Fingerprint) -> usize {
        let index = self.len;
        for (band, key) in self.keys(fingerprint).into_iter().enumerate() {
            self.tables[band].entry(key).or_default().push(index);
        }
        self.len += 1;
        index
    }

    /// Indices sharing at least one band with `fingerprint`, ascending
    pub fn candidates(&self, fingerprint: &Fingerprint) -> Vec<usize> {
        let mut found = BTreeSet::new();
        for (band, key) in self.keys(fingerprint).into_iter().enumerate() {
            if let Some(bucket) = self.tables[band].get(&key) {
                found.extend(bucket.iter().copied());
            }
        }
        found.into_iter().collect()
    }

    fn keys(&self, fingerprint: &Fingerprint) -> Vec<BandKey> {
        debug_assert!(
            self.ranges.last().map(|r| r.1) <= Some(fingerprint.bit_count()),
            "fingerprint shorter than the index"
        );
        self.ranges
            .iter()
            .map(|&(start, end)| {
                Fingerprint::from_bits((start..end).map(|i| fingerprint.bit(i)))
                    .as_bytes()
                    .to_vec()
            })
            .collect()
    }
}
