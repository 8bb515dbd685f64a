//! # Hasher Module
//!
//! The fingerprint engine: turns an image's encoded bytes into a
//! fixed-length [`Fingerprint`].
//!
//! ## How It Works
//! 1. Decode the byte stream (format sniffed from content)
//! 2. Convert to grayscale
//! 3. Resample to `hash_size x hash_size` (Lanczos3, deterministic)
//! 4. Threshold every cell against the grid mean
//! 5. Compare fingerprints using Hamming distance
//!
//! ## Example
//! ```rust,ignore
//! use zip_photo_dedup::core::hasher::{AverageHasher, PerceptualHash};
//!
//! let hasher = AverageHasher::new(8);
//! let a = hasher.hash_bytes("a.png", &png_bytes)?;
//! let b = hasher.hash_bytes("b.jpg", &jpeg_bytes)?;
//! println!("distance = {}", a.distance(&b));
//! ```

mod average;
mod decode;
mod traits;

pub use average::AverageHasher;
pub use decode::decode_image;
pub use traits::{Fingerprint, PerceptualHash};
