//! Pitlane - threaded sound dispatch and record tracking for racing games.
//!
//! This is the umbrella crate that re-exports the public APIs of the
//! workspace crates.
//!
//! # Example
//!
//! ```no_run
//! use pitlane::SoundDispatcher;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let dispatcher = SoundDispatcher::new()?;
//!     // Load sounds and queue play requests here...
//!     dispatcher.shutdown_and_join();
//!     Ok(())
//! }
//! ```

pub use pitlane_core::*;

/// Best lap and race times per track.
pub mod stats {
    pub use pitlane_stats::*;
}

/// Audio backend built on rodio.
#[cfg(feature = "rodio")]
pub mod rodio {
    pub use pitlane_rodio::*;
}
