//! Messages exchanged between the dispatcher and the sound worker.

use std::fmt;

use crossbeam_channel::Sender;

use crate::backend::SoundHandle;

/// Lowest pitch accepted by the dispatcher.
pub const MIN_PITCH: f32 = 0.01;

/// Identifier of a tracked playback, returned by
/// [`SoundDispatcher::play`](crate::SoundDispatcher::play) and
/// [`SoundDispatcher::loop_sound`](crate::SoundDispatcher::loop_sound).
///
/// Ids are assigned in submission order and never reused by a dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayId(u64);

impl PlayId {
    /// Create a play id from a raw value.
    ///
    /// Useful for ids stored outside the game, or in tests. An id the
    /// dispatcher never issued is simply unknown to the worker.
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw numeric value.
    #[inline]
    pub const fn as_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PlayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A request for the sound worker.
pub(crate) enum Message {
    /// Play a sound once and track it.
    Play {
        play_id: PlayId,
        sound: SoundHandle,
        volume: f32,
        pitch: f32,
    },
    /// Play a sound repeatedly and track it.
    Loop {
        play_id: PlayId,
        sound: SoundHandle,
        volume: f32,
        pitch: f32,
    },
    Stop {
        play_id: PlayId,
    },
    SetVolume {
        play_id: PlayId,
        volume: f32,
    },
    SetPitch {
        play_id: PlayId,
        pitch: f32,
    },
    /// Acknowledged once every earlier message has been handled.
    Sync {
        done: Sender<()>,
    },
    Shutdown,
}

impl Message {
    /// Short name of the variant, for logs.
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Self::Play { .. } => "play",
            Self::Loop { .. } => "loop",
            Self::Stop { .. } => "stop",
            Self::SetVolume { .. } => "set_volume",
            Self::SetPitch { .. } => "set_pitch",
            Self::Sync { .. } => "sync",
            Self::Shutdown => "shutdown",
        }
    }
}

/// Clamp a volume to `0.0..=1.0`. Non-finite values mute.
pub(crate) fn sanitize_volume(volume: f32) -> f32 {
    if volume.is_finite() {
        volume.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Clamp a pitch to at least [`MIN_PITCH`]. Non-finite values play at
/// normal pitch.
pub(crate) fn sanitize_pitch(pitch: f32) -> f32 {
    if pitch.is_finite() {
        pitch.max(MIN_PITCH)
    } else {
        1.0
    }
}
