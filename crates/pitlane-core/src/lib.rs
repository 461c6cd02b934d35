//! Core systems for Pitlane.
//!
//! This crate provides the threaded sound dispatch queue used by the game:
//!
//! - **Backend seam**: the [`Sound`] trait implemented by loaded sound assets
//! - **Dispatcher**: a `Send + Sync` front end that turns play, loop, stop,
//!   volume and pitch requests into queue messages
//! - **Worker**: a single dedicated thread that performs every queued backend
//!   call and tracks playing sounds
//! - **Configuration**: queue capacity, thread settings and timeouts, loadable
//!   from TOML
//!
//! Some audio backends block inside their play call, sometimes for a long
//! time. Routing requests through the worker keeps that latency off the game
//! thread.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use pitlane_core::{BackendError, InstanceId, Sound, SoundDispatcher, SoundHandle};
//!
//! struct Beep;
//!
//! impl Sound for Beep {
//!     fn play(&self, _volume: f32, _pitch: f32, _start: f32) -> Result<InstanceId, BackendError> {
//!         Ok(InstanceId::from_raw(1))
//!     }
//!     fn loop_sound(&self, v: f32, p: f32, s: f32) -> Result<InstanceId, BackendError> {
//!         self.play(v, p, s)
//!     }
//!     fn stop(&self, _instance: InstanceId) {}
//!     fn set_volume(&self, _instance: InstanceId, _volume: f32) {}
//!     fn set_pitch(&self, _instance: InstanceId, _pitch: f32) {}
//! }
//!
//! let dispatcher = SoundDispatcher::new().unwrap();
//! let beep: SoundHandle = Arc::new(Beep);
//!
//! let id = dispatcher.play(&beep, 0.8).unwrap();
//! dispatcher.set_volume(id, 0.4);
//! dispatcher.stop(id);
//!
//! dispatcher.shutdown_and_join();
//! ```

mod backend;
mod config;
mod dispatcher;
mod error;
pub mod logging;
mod message;
mod registry;
mod worker;

pub use backend::{InstanceId, Sound, SoundHandle};
pub use config::{DEFAULT_QUEUE_CAPACITY, DEFAULT_THREAD_NAME, DispatcherConfig};
pub use dispatcher::{DispatcherBuilder, DispatcherStats, SoundDispatcher};
pub use error::{BackendError, ConfigError, DispatchError, Error, Result};
pub use message::{MIN_PITCH, PlayId};
pub use worker::SoundWorker;
