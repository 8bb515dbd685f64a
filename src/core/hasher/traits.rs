//! Fingerprint value type and the comparison trait.

use serde::{Deserialize, Serialize};

/// A computed perceptual hash that can be compared
pub trait PerceptualHash: Clone {
    /// Compute the Hamming distance to another hash
    ///
    /// Returns the number of bits that differ between the two hashes.
    /// Lower distance = more similar images.
    fn distance(&self, other: &Self) -> u32;

    /// Get the raw hash bytes
    fn as_bytes(&self) -> &[u8];

    /// Get the hash as a hexadecimal string
    fn to_hex(&self) -> String {
        self.as_bytes()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect()
    }

    /// Get the total number of bits in this hash
    fn bit_count(&self) -> u32 {
        (self.as_bytes().len() * 8) as u32
    }

    /// Calculate similarity as a percentage (0-100)
    fn similarity(&self, other: &Self) -> f64 {
        let distance = self.distance(other);
        let max_distance = self.bit_count();
        if max_distance == 0 {
            return 100.0;
        }
        (1.0 - (distance as f64 / max_distance as f64)) * 100.0
    }
}

/// Fixed-length bit pattern derived from an image.
///
/// Bits are packed most-significant-first in scan order, so a 64-bit
/// fingerprint reads as a big-endian `u64` whose top bit is the top-left
/// grid cell. Trailing bits of the last byte are zero.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint {
    bytes: Vec<u8>,
    bits: u32,
}

impl Fingerprint {
    /// Pack a sequence of bits in scan order
    pub fn from_bits<I>(bits: I) -> Self
    where
        I: IntoIterator<Item = bool>,
    {
        let mut bytes = Vec::new();
        let mut count: u32 = 0;

        for bit in bits {
            let offset = count % 8;
            if offset == 0 {
                bytes.push(0);
            }
            if bit {
                if let Some(last) = bytes.last_mut() {
                    *last |= 1 << (7 - offset);
                }
            }
            count += 1;
        }

        Self { bytes, bits: count }
    }

    /// A 64-bit fingerprint, first cell in the most significant bit
    pub fn from_u64(value: u64) -> Self {
        Self {
            bytes: value.to_be_bytes().to_vec(),
            bits: 64,
        }
    }

    /// Bit at `index` in scan order
    pub fn bit(&self, index: u32) -> bool {
        if index >= self.bits {
            return false;
        }
        let byte = self.bytes[(index / 8) as usize];
        (byte >> (7 - index % 8)) & 1 == 1
    }

    /// The fingerprint as an unsigned integer, when it fits in 64 bits
    pub fn as_u64(&self) -> Option<u64> {
        if self.bits > 64 {
            return None;
        }
        Some((0..self.bits).fold(0u64, |acc, i| (acc << 1) | self.bit(i) as u64))
    }
}

impl PerceptualHash for Fingerprint {
    fn distance(&self, other: &Self) -> u32 {
        debug_assert_eq!(self.bits, other.bits, "fingerprints of different lengths");
        self.bytes
            .iter()
            .zip(other.bytes.iter())
            .map(|(a, b)| (a ^ b).count_ones())
            .sum()
    }

    fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn bit_count(&self) -> u32 {
        self.bits
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}
