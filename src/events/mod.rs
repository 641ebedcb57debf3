//! # Events Module
//!
//! Progress reporting for batch evaluation.
//!
//! The guard emits events through a crossbeam channel so the CLI, or any
//! service embedding the library, can follow a batch as it runs.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         if let Event::Upload(UploadEvent::Progress(p)) = event {
//!             println!("Checked {}/{}", p.completed, p.total);
//!         }
//!     }
//! });
//!
//! guard.process_sequential(&owner, &listing, &uploads, &store, &sender)?;
//! ```

mod channel;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender};
pub use types::*;
