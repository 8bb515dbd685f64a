//! # ZIP Photo Dedup
//!
//! Removes visually near-duplicate images from a ZIP archive.
//!
//! Every image is reduced to an average-hash fingerprint. Images are
//! visited in archive order; an image whose fingerprint is within the
//! configured Hamming distance of an image already kept is left out of
//! the output archive. Kept entries are written back under their original
//! paths, byte for byte.
//!
//! ## Architecture
//! - `core` - The deduplication engine (archive I/O, hashing, grouping)
//! - `events` - Event-driven progress reporting
//! - `error` - Error types and process exit codes
//!
//! ```no_run
//! use zip_photo_dedup::core::Pipeline;
//!
//! let report = Pipeline::builder()
//!     .input("photos.zip")
//!     .output_dir("out")
//!     .threshold(5)
//!     .build()?
//!     .run()?;
//! println!("kept {} images", report.kept().count());
//! # Ok::<(), zip_photo_dedup::DedupError>(())
//! ```

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use crate::core::pipeline::dedupe_bytes;
pub use error::{DedupError, Result};

use tracing_subscriber::EnvFilter;

/// Initialize tracing for the library
///
/// Logs go to stderr. `RUST_LOG` wins when set; otherwise warnings only,
/// or debug output for this crate when `verbose` is true. Calling it twice
/// is harmless.
pub fn init_tracing(verbose: bool) {
    let default = if verbose {
        "warn,zip_photo_dedup=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
