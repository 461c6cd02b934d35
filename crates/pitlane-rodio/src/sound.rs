//! A pre-loaded sound effect played through rodio sinks.

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use pitlane_core::{BackendError, InstanceId, MIN_PITCH, Sound};
use rodio::{Decoder, OutputStreamHandle, Sink, Source};
use tracing::trace;

use crate::error::{Result, RodioError};

/// Default maximum concurrent instances per sound.
pub const DEFAULT_MAX_INSTANCES: usize = 8;

/// Playback instances of one sound.
struct SoundState {
    /// Active sinks by instance id.
    sinks: HashMap<InstanceId, Sink>,
    /// Next instance id to hand out.
    next_instance: u64,
    /// Per-sound volume multiplier.
    volume: f32,
    /// Maximum concurrent instances allowed.
    max_instances: usize,
}

impl SoundState {
    fn new() -> Self {
        Self {
            sinks: HashMap::new(),
            next_instance: 0,
            volume: 1.0,
            max_instances: DEFAULT_MAX_INSTANCES,
        }
    }

    /// Remove finished sinks and return how many were removed.
    fn cleanup_finished(&mut self) -> usize {
        let before = self.sinks.len();
        self.sinks.retain(|_, sink| !sink.empty());
        before - self.sinks.len()
    }

    /// Check if we can play another instance.
    fn can_play(&self) -> bool {
        self.sinks.len() < self.max_instances
    }

    fn allocate_instance(&mut self) -> InstanceId {
        let instance = InstanceId::from_raw(self.next_instance);
        self.next_instance += 1;
        instance
    }
}

/// A sound effect decoded from memory for every playback.
///
/// Created by [`AudioOutput::load`](crate::AudioOutput::load). Multiple
/// instances of the same sound can play at once, up to a configurable limit.
/// Pitch is applied as a playback speed change, which shifts pitch and
/// duration together.
pub struct RodioSound {
    name: String,
    data: Arc<[u8]>,
    stream_handle: OutputStreamHandle,
    state: Mutex<SoundState>,
}

impl RodioSound {
    pub(crate) fn new(name: String, data: Arc<[u8]>, stream_handle: OutputStreamHandle) -> Self {
        Self {
            name,
            data,
            stream_handle,
            state: Mutex::new(SoundState::new()),
        }
    }

    /// Validate that `data` can be decoded.
    pub(crate) fn validate(data: &Arc<[u8]>) -> Result<()> {
        Decoder::new(Cursor::new(data.clone()))?;
        Ok(())
    }

    /// Set the volume multiplier applied to every instance of this sound.
    ///
    /// Playing instances are not updated.
    pub fn set_sound_volume(&self, volume: f32) {
        self.state.lock().volume = volume.max(0.0);
    }

    /// The volume multiplier of this sound.
    pub fn sound_volume(&self) -> f32 {
        self.state.lock().volume
    }

    /// Set the maximum number of concurrent instances (at least 1).
    pub fn set_max_instances(&self, max: usize) {
        self.state.lock().max_instances = max.max(1);
    }

    /// The maximum number of concurrent instances.
    pub fn max_instances(&self) -> usize {
        self.state.lock().max_instances
    }

    /// Number of instances still playing.
    pub fn playing_count(&self) -> usize {
        let mut state = self.state.lock();
        state.cleanup_finished();
        state.sinks.len()
    }

    /// Stop every instance of this sound.
    pub fn stop_all(&self) {
        let mut state = self.state.lock();
        for (_, sink) in state.sinks.drain() {
            sink.stop();
        }
    }

    fn start(&self, volume: f32, pitch: f32, start_time: f32, looping: bool) -> Result<InstanceId> {
        let mut state = self.state.lock();

        // Clean up finished sinks first
        state.cleanup_finished();

        if !state.can_play() {
            return Err(RodioError::Playback(format!(
                "Maximum concurrent instances ({}) reached for sound: {}",
                state.max_instances, self.name
            )));
        }

        let source = Decoder::new(Cursor::new(self.data.clone()))?;
        let sink = Sink::try_new(&self.stream_handle)?;
        sink.set_volume(volume * state.volume);
        sink.set_speed(pitch.max(MIN_PITCH));

        let offset = Duration::try_from_secs_f32(start_time).unwrap_or_default();
        match (looping, offset.is_zero()) {
            (false, true) => sink.append(source),
            (false, false) => sink.append(source.skip_duration(offset)),
            (true, true) => sink.append(source.repeat_infinite()),
            (true, false) => sink.append(source.repeat_infinite().skip_duration(offset)),
        }

        let instance = state.allocate_instance();
        state.sinks.insert(instance, sink);

        trace!(sound = %self.name, %instance, looping, "Started rodio sink");
        Ok(instance)
    }
}

impl Sound for RodioSound {
    fn play(
        &self,
        volume: f32,
        pitch: f32,
        start_time: f32,
    ) -> std::result::Result<InstanceId, BackendError> {
        self.start(volume, pitch, start_time, false)
            .map_err(BackendError::from)
    }

    fn loop_sound(
        &self,
        volume: f32,
        pitch: f32,
        start_time: f32,
    ) -> std::result::Result<InstanceId, BackendError> {
        self.start(volume, pitch, start_time, true)
            .map_err(BackendError::from)
    }

    fn stop(&self, instance: InstanceId) {
        if let Some(sink) = self.state.lock().sinks.remove(&instance) {
            sink.stop();
        }
    }

    fn set_volume(&self, instance: InstanceId, volume: f32) {
        let state = self.state.lock();
        if let Some(sink) = state.sinks.get(&instance) {
            sink.set_volume(volume * state.volume);
        }
    }

    fn set_pitch(&self, instance: InstanceId, pitch: f32) {
        if let Some(sink) = self.state.lock().sinks.get(&instance) {
            sink.set_speed(pitch.max(MIN_PITCH));
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for RodioSound {
    fn drop(&mut self) {
        self.stop_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cleanup_frees_room_under_limit() {
        // Idle sinks have no device pulling samples, so a queued source
        // keeps its sink busy and an empty sink counts as finished.
        let (busy, _busy_queue) = Sink::new_idle();
        busy.append(rodio::source::Zero::<f32>::new(1, 8000));
        let (done, _done_queue) = Sink::new_idle();

        let mut state = SoundState::new();
        state.max_instances = 2;
        let busy_id = state.allocate_instance();
        state.sinks.insert(busy_id, busy);
        let done_id = state.allocate_instance();
        state.sinks.insert(done_id, done);
        assert!(!state.can_play());

        assert_eq!(state.cleanup_finished(), 1);
        assert!(state.can_play());
        assert!(state.sinks.contains_key(&busy_id));
        assert_eq!(state.cleanup_finished(), 0);
    }

    #[test]
    fn test_state_can_play() {
        let state = SoundState::new();
        assert!(state.can_play());
        assert_eq!(state.max_instances, DEFAULT_MAX_INSTANCES);
        assert_eq!(state.volume, 1.0);
    }

    #[test]
    fn test_state_zero_limit_blocks() {
        let mut state = SoundState::new();
        state.max_instances = 0;
        assert!(!state.can_play());
    }

    #[test]
    fn test_instance_ids_increase() {
        let mut state = SoundState::new();
        let first = state.allocate_instance();
        let second = state.allocate_instance();
        assert!(second > first);
        assert_eq!(first, InstanceId::from_raw(0));
    }

    #[test]
    fn test_cleanup_on_empty_state() {
        let mut state = SoundState::new();
        assert_eq!(state.cleanup_finished(), 0);
    }

    #[test]
    fn test_validate_rejects_garbage() {
        let data: Arc<[u8]> = Arc::from(vec![0u8, 1, 2, 3]);
        assert!(RodioSound::validate(&data).is_err());
    }
}
