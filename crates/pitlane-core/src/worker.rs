//! The sound worker: sole executor of queued backend calls.
//!
//! A [`SoundWorker`] owns the registry of playing sounds. Nothing else reads
//! or writes it, so it needs no lock; the message queue is the only hand-off
//! point with the dispatcher.
//!
//! Backend calls run under `catch_unwind`: a panicking [`Sound`](crate::Sound)
//! is logged and counted as a backend failure, and the worker keeps going.

use std::any::Any;
use std::ops::ControlFlow;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::Ordering;

use crossbeam_channel::Receiver;
use tracing::{debug, error, trace, warn};

use crate::backend::SoundHandle;
use crate::dispatcher::DispatcherState;
use crate::logging::{span_names, targets};
use crate::message::{Message, PlayId};
use crate::registry::{PlayingSound, PlayingSounds};

/// Start offset passed to the backend for queued plays.
const START_TIME: f32 = 0.0;

/// Consumer side of the sound dispatch queue.
///
/// Usually spawned by [`SoundDispatcher::new`](crate::SoundDispatcher::new).
/// A worker obtained from [`SoundDispatcher::detached`](crate::SoundDispatcher::detached)
/// can be run on a custom thread or stepped manually.
pub struct SoundWorker {
    receiver: Receiver<Message>,
    registry: PlayingSounds,
    state: Arc<DispatcherState>,
    finished: bool,
}

impl SoundWorker {
    pub(crate) fn new(
        receiver: Receiver<Message>,
        state: Arc<DispatcherState>,
        capacity_hint: usize,
    ) -> Self {
        Self {
            receiver,
            registry: PlayingSounds::with_capacity(capacity_hint.min(16)),
            state,
            finished: false,
        }
    }

    /// Handle messages until a shutdown request arrives or the dispatcher is
    /// dropped.
    pub fn run(mut self) {
        let span = tracing::debug_span!(target: targets::WORKER, span_names::SOUND_WORKER);
        let _enter = span.enter();
        let _finished = FinishGuard(self.state.clone());
        debug!(target: targets::WORKER, "Sound worker started");

        while !self.finished {
            match self.receiver.recv() {
                Ok(message) => {
                    if self.handle(message).is_break() {
                        self.finish();
                    }
                }
                Err(_) => {
                    debug!(target: targets::WORKER, "Sound dispatcher dropped");
                    self.finish();
                }
            }
        }

        debug!(
            target: targets::WORKER,
            tracked = self.registry.len(),
            "Sound worker stopped"
        );
    }

    /// Handle at most one queued message without blocking.
    ///
    /// Returns `true` if a message was handled.
    pub fn try_process_one(&mut self) -> bool {
        if self.finished {
            return false;
        }

        match self.receiver.try_recv() {
            Ok(message) => {
                if self.handle(message).is_break() {
                    self.finish();
                }
                true
            }
            Err(_) => false,
        }
    }

    /// Handle every queued message without blocking, stopping after a
    /// shutdown request.
    ///
    /// Returns the number of messages handled.
    pub fn process_pending(&mut self) -> usize {
        let mut handled = 0;
        while self.try_process_one() {
            handled += 1;
        }
        handled
    }

    /// Whether the worker has seen a shutdown request or lost its dispatcher.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Number of sounds currently tracked.
    pub fn tracked_count(&self) -> usize {
        self.registry.len()
    }

    fn finish(&mut self) {
        self.finished = true;
        self.state.worker_finished.store(true, Ordering::Release);
    }

    fn handle(&mut self, message: Message) -> ControlFlow<()> {
        trace!(target: targets::WORKER, request = message.kind(), "Handling sound request");

        let flow = match message {
            Message::Play {
                play_id,
                sound,
                volume,
                pitch,
            } => {
                self.start(play_id, sound, volume, pitch, false);
                ControlFlow::Continue(())
            }
            Message::Loop {
                play_id,
                sound,
                volume,
                pitch,
            } => {
                self.start(play_id, sound, volume, pitch, true);
                ControlFlow::Continue(())
            }
            Message::Stop { play_id } => {
                match self.registry.take(play_id) {
                    Some(playing) => {
                        self.update_tracked();
                        self.call_backend(play_id, &playing.sound, "stop", || {
                            playing.sound.stop(playing.instance)
                        });
                    }
                    None => self.unknown_play_id(play_id, "stop"),
                }
                ControlFlow::Continue(())
            }
            Message::SetVolume { play_id, volume } => {
                match self.registry.find(play_id) {
                    Some(playing) => {
                        self.call_backend(play_id, &playing.sound, "set_volume", || {
                            playing.sound.set_volume(playing.instance, volume)
                        });
                    }
                    None => self.unknown_play_id(play_id, "set_volume"),
                }
                ControlFlow::Continue(())
            }
            Message::SetPitch { play_id, pitch } => {
                match self.registry.find(play_id) {
                    Some(playing) => {
                        self.call_backend(play_id, &playing.sound, "set_pitch", || {
                            playing.sound.set_pitch(playing.instance, pitch)
                        });
                    }
                    None => self.unknown_play_id(play_id, "set_pitch"),
                }
                ControlFlow::Continue(())
            }
            Message::Sync { done } => {
                // The caller may have given up waiting
                let _ = done.send(());
                ControlFlow::Continue(())
            }
            Message::Shutdown => ControlFlow::Break(()),
        };

        self.state.pending.fetch_sub(1, Ordering::AcqRel);
        flow
    }

    fn start(
        &mut self,
        play_id: PlayId,
        sound: SoundHandle,
        volume: f32,
        pitch: f32,
        looping: bool,
    ) {
        let request = if looping { "loop" } else { "play" };
        let result = self.call_backend(play_id, &sound, request, || {
            if looping {
                sound.loop_sound(volume, pitch, START_TIME)
            } else {
                sound.play(volume, pitch, START_TIME)
            }
        });

        match result {
            None => {}
            Some(Ok(instance)) => {
                let playing = PlayingSound {
                    play_id,
                    instance,
                    sound,
                };
                if let Some(previous) = self.registry.insert(playing) {
                    warn!(
                        target: targets::WORKER,
                        %play_id,
                        instance = %previous.instance,
                        "Play id was already tracked, replacing it"
                    );
                }
                self.update_tracked();
            }
            Some(Err(err)) => {
                self.state.backend_failures.fetch_add(1, Ordering::Relaxed);
                error!(
                    target: targets::WORKER,
                    %play_id,
                    sound = sound.name(),
                    looping,
                    error = %err,
                    "Failed to start sound"
                );
            }
        }
    }

    /// Run a backend call, turning a panic into a logged backend failure.
    fn call_backend<R>(
        &self,
        play_id: PlayId,
        sound: &SoundHandle,
        request: &'static str,
        call: impl FnOnce() -> R,
    ) -> Option<R> {
        match panic::catch_unwind(AssertUnwindSafe(call)) {
            Ok(value) => Some(value),
            Err(payload) => {
                self.state.backend_failures.fetch_add(1, Ordering::Relaxed);
                error!(
                    target: targets::WORKER,
                    %play_id,
                    sound = sound.name(),
                    request,
                    panic = panic_message(payload.as_ref()),
                    "Sound backend panicked"
                );
                None
            }
        }
    }

    fn unknown_play_id(&self, play_id: PlayId, request: &'static str) {
        self.state.unknown_play_ids.fetch_add(1, Ordering::Relaxed);
        error!(target: targets::WORKER, %play_id, request, "Invalid play id");
    }

    fn update_tracked(&self) {
        self.state
            .tracked
            .store(self.registry.len(), Ordering::Release);
    }
}

/// Marks the worker finished however `run` exits, including by unwinding.
struct FinishGuard(Arc<DispatcherState>);

impl Drop for FinishGuard {
    fn drop(&mut self) {
        self.0.running.store(false, Ordering::Release);
        self.0.worker_finished.store(true, Ordering::Release);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::panic_message;
    use crate::backend::{InstanceId, Sound, SoundHandle};
    use crate::config::DispatcherConfig;
    use crate::dispatcher::SoundDispatcher;
    use crate::error::BackendError;
    use crate::message::PlayId;

    /// Starts fine, but every control call panics.
    struct FragileControls;

    impl Sound for FragileControls {
        fn play(&self, _: f32, _: f32, _: f32) -> Result<InstanceId, BackendError> {
            Ok(InstanceId::from_raw(7))
        }

        fn loop_sound(&self, _: f32, _: f32, _: f32) -> Result<InstanceId, BackendError> {
            Ok(InstanceId::from_raw(8))
        }

        fn stop(&self, _: InstanceId) {
            panic!("stop exploded");
        }

        fn set_volume(&self, _: InstanceId, _: f32) {
            panic!("volume exploded");
        }

        fn set_pitch(&self, _: InstanceId, _: f32) {}
    }

    fn detached(capacity: usize) -> (SoundDispatcher, super::SoundWorker) {
        let config = DispatcherConfig {
            queue_capacity: capacity,
            ..Default::default()
        };
        SoundDispatcher::detached(config).unwrap()
    }

    #[test]
    fn test_idle_worker_handles_nothing() {
        let (_dispatcher, mut worker) = detached(4);
        assert!(!worker.try_process_one());
        assert_eq!(worker.process_pending(), 0);
        assert!(!worker.is_finished());
    }

    #[test]
    fn test_unknown_ids_are_counted() {
        let (dispatcher, mut worker) = detached(4);
        dispatcher.stop(PlayId::from_raw(999));
        dispatcher.set_volume(PlayId::from_raw(999), 0.2);
        dispatcher.set_pitch(PlayId::from_raw(999), 1.2);

        assert_eq!(worker.process_pending(), 3);
        assert_eq!(dispatcher.stats().unknown_play_ids, 3);
        assert_eq!(dispatcher.stats().pending, 0);
        assert_eq!(worker.tracked_count(), 0);
    }

    #[test]
    fn test_panicking_control_calls_are_contained() {
        let (dispatcher, mut worker) = detached(8);
        let sound: SoundHandle = Arc::new(FragileControls);

        let id = dispatcher.loop_sound(&sound, 1.0, 1.0).unwrap();
        dispatcher.set_volume(id, 0.5);
        dispatcher.stop(id);
        dispatcher.stop(id);

        assert_eq!(worker.process_pending(), 4);
        assert!(!worker.is_finished());
        assert_eq!(worker.tracked_count(), 0);

        let stats = dispatcher.stats();
        assert_eq!(stats.backend_failures, 2);
        assert_eq!(stats.unknown_play_ids, 1);
        assert_eq!(stats.pending, 0);
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("static text");
        assert_eq!(panic_message(payload.as_ref()), "static text");

        let payload: Box<dyn std::any::Any + Send> = Box::new(format!("sound {}", 3));
        assert_eq!(panic_message(payload.as_ref()), "sound 3");

        let payload: Box<dyn std::any::Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(payload.as_ref()), "non-string panic payload");
    }

    #[test]
    fn test_shutdown_stops_processing() {
        let (dispatcher, mut worker) = detached(4);
        assert!(dispatcher.shutdown());

        assert_eq!(worker.process_pending(), 1);
        assert!(worker.is_finished());
        assert!(dispatcher.is_worker_finished());
        assert!(!worker.try_process_one());
    }

    #[test]
    fn test_dropped_dispatcher_finishes_run() {
        let (dispatcher, worker) = detached(4);
        drop(dispatcher);
        // run() returns once the queue is drained and disconnected
        worker.run();
    }
}
