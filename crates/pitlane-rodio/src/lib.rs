//! rodio audio backend for Pitlane.
//!
//! [`AudioOutput`] opens the default output device and loads sounds into
//! memory. Each loaded [`RodioSound`] implements [`pitlane_core::Sound`], so
//! it can be handed straight to a [`pitlane_core::SoundDispatcher`].
//!
//! # Example
//!
//! ```ignore
//! use pitlane_core::{SoundDispatcher, SoundHandle};
//! use pitlane_rodio::AudioOutput;
//!
//! let output = AudioOutput::new()?;
//! let horn: SoundHandle = output.load("horn", "assets/horn.wav")?;
//!
//! let dispatcher = SoundDispatcher::new()?;
//! dispatcher.play(&horn, 0.8)?;
//! ```

mod error;
mod output;
mod sound;

pub use error::{Result, RodioError};
pub use output::AudioOutput;
pub use sound::{DEFAULT_MAX_INSTANCES, RodioSound};
