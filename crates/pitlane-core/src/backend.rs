//! The audio backend seam.
//!
//! Pitlane does not talk to an audio device itself. A loaded sound asset
//! implements [`Sound`], and the sound worker calls it. Implementations may
//! block; that is the reason the worker exists.

use std::fmt;
use std::sync::Arc;

use crate::error::BackendError;

/// Identifier of one playback instance, as returned by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(u64);

impl InstanceId {
    /// Wrap a raw backend id.
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw backend id.
    #[inline]
    pub const fn as_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A loaded sound asset that can start and control playback instances.
///
/// All methods take `&self`: a sound is shared between the game code and the
/// sound worker through a [`SoundHandle`].
pub trait Sound: Send + Sync {
    /// Start a one-shot playback instance.
    ///
    /// `pitch` is a playback-rate multiplier (1.0 = normal). `start_time` is
    /// an offset in seconds into the sound.
    fn play(&self, volume: f32, pitch: f32, start_time: f32) -> Result<InstanceId, BackendError>;

    /// Start a playback instance that repeats until stopped.
    fn loop_sound(
        &self,
        volume: f32,
        pitch: f32,
        start_time: f32,
    ) -> Result<InstanceId, BackendError>;

    /// Stop an instance. Unknown instances are ignored.
    fn stop(&self, instance: InstanceId);

    /// Change the volume of an instance. Unknown instances are ignored.
    fn set_volume(&self, instance: InstanceId, volume: f32);

    /// Change the pitch of an instance. Unknown instances are ignored.
    fn set_pitch(&self, instance: InstanceId, pitch: f32);

    /// A short name used in log messages.
    fn name(&self) -> &str {
        "sound"
    }
}

/// Shared handle to a loaded sound.
pub type SoundHandle = Arc<dyn Sound>;
