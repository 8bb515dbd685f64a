//! # zip-dedup CLI
//!
//! Command-line interface for the ZIP image deduplicator.
//!
//! ## Usage
//! ```bash
//! zip-dedup dedup photos.zip out/ --threshold 5
//! zip-dedup dedup photos.zip out/ --dry-run --output json
//! zip-dedup hash photos.zip
//! ```

mod cli;

use std::process::ExitCode;

fn main() -> ExitCode {
    match cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}
