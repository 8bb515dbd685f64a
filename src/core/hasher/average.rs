//! Average Hash (aHash) implementation.
//!
//! aHash works by:
//! 1. Converting the image to grayscale (ITU-R BT.601 weights)
//! 2. Resampling it to hash_size x hash_size with Lanczos3
//! 3. Computing the mean brightness of the grid
//! 4. For each cell in row-major order: 1 if cell >= mean, else 0

use super::decode::decode_image;
use super::traits::Fingerprint;
use crate::error::EntryError;
use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, Luma};

/// Average Hash (aHash) fingerprinter
#[derive(Debug, Clone, Copy)]
pub struct AverageHasher {
    /// Size of the grid (width and height)
    hash_size: u32,
}

impl AverageHasher {
    /// Create a new aHash hasher
    pub fn new(hash_size: u32) -> Self {
        Self { hash_size }
    }

    /// Fingerprint already-decoded pixels
    pub fn hash_image(&self, image: &DynamicImage) -> Fingerprint {
        let gray = luma_bt601(image);
        let grid = imageops::resize(&gray, self.hash_size, self.hash_size, FilterType::Lanczos3);

        let count = u64::from(self.hash_size) * u64::from(self.hash_size);
        let total: u64 = grid.pixels().map(|p| u64::from(p[0])).sum();

        // cell >= total / count, kept in integers so the comparison is exact
        Fingerprint::from_bits(grid.pixels().map(|p| u64::from(p[0]) * count >= total))
    }

    /// Decode an entry's bytes and fingerprint them.
    ///
    /// The decoded buffer is released before this returns.
    pub fn hash_bytes(&self, path: &str, bytes: &[u8]) -> Result<Fingerprint, EntryError> {
        let image = decode_image(path, bytes)?;
        Ok(self.hash_image(&image))
    }
}

/// Grayscale with BT.601 (299/587/114) weights in 16-bit fixed point.
///
/// Not `to_luma8`, which weights by BT.709. The weights sum to exactly
/// 1 << 16, so gray inputs map to themselves.
fn luma_bt601(image: &DynamicImage) -> GrayImage {
    let rgb = image.to_rgb8();
    GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        let value =
            (u32::from(r) * 19_595 + u32::from(g) * 38_470 + u32::from(b) * 7_471 + 0x8000) >> 16;
        Luma([value as u8])
    })
}
