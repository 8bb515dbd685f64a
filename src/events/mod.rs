//! # Events Module
//!
//! Progress reporting decoupled from presentation.
//!
//! The pipeline runs on the caller's thread and pushes [`Event`]s into a
//! channel; a UI (the CLI progress bar, or nothing at all) drains it.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         if let Event::Entry(EntryEvent::Progress(p)) = event {
//!             println!("{}/{} {}", p.processed, p.total, p.current_path);
//!         }
//!     }
//! });
//!
//! pipeline.run_with_events(&sender)?;
//! ```

mod channel;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender};
pub use types::*;
