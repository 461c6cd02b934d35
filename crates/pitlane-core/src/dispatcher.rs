//! Caller-facing side of the sound dispatch queue.
//!
//! [`SoundDispatcher`] turns play, loop, stop, volume and pitch requests into
//! messages for a single dedicated [`SoundWorker`], which performs the actual
//! backend calls. Callers never wait for the backend: tracked requests either
//! enter the queue immediately or fail with
//! [`DispatchError::QueueSaturated`].
//!
//! # Example
//!
//! ```no_run
//! use pitlane_core::{SoundDispatcher, SoundHandle};
//!
//! # fn example(engine: SoundHandle) -> pitlane_core::Result<()> {
//! let dispatcher = SoundDispatcher::new()?;
//!
//! // Tracked playback: keep the id to control it later
//! if let Ok(id) = dispatcher.loop_sound(&engine, 0.6, 1.0) {
//!     dispatcher.set_pitch(id, 1.4);
//!     dispatcher.stop(id);
//! }
//!
//! // Fire and forget, on the calling thread
//! dispatcher.play_and_forget(&engine, 1.0);
//!
//! dispatcher.shutdown_and_join();
//! # Ok(())
//! # }
//! ```
//!
//! # Ordering
//!
//! Messages are handled in queue order. A `stop()` that reaches the worker
//! before the `play()` it refers to finds no tracked sound: it is logged as
//! an invalid play id and the sound keeps playing until a later `stop()`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{SendTimeoutError, Sender, TrySendError, bounded};
use parking_lot::Mutex;
use tracing::{debug, error};

use crate::backend::SoundHandle;
use crate::config::DispatcherConfig;
use crate::error::{DispatchError, Error, Result};
use crate::logging::targets;
use crate::message::{Message, PlayId, sanitize_pitch, sanitize_volume};
use crate::worker::SoundWorker;

/// Internal state shared between the dispatcher and the worker.
pub(crate) struct DispatcherState {
    /// Whether the dispatcher accepts requests.
    pub(crate) running: AtomicBool,
    /// Whether the worker has left its loop.
    pub(crate) worker_finished: AtomicBool,
    /// Messages queued but not handled yet.
    pub(crate) pending: AtomicUsize,
    /// Sounds currently tracked by the worker.
    pub(crate) tracked: AtomicUsize,
    pub(crate) unknown_play_ids: AtomicU64,
    pub(crate) rejected_requests: AtomicU64,
    pub(crate) dropped_requests: AtomicU64,
    pub(crate) backend_failures: AtomicU64,
}

impl DispatcherState {
    fn new() -> Self {
        Self {
            running: AtomicBool::new(true),
            worker_finished: AtomicBool::new(false),
            pending: AtomicUsize::new(0),
            tracked: AtomicUsize::new(0),
            unknown_play_ids: AtomicU64::new(0),
            rejected_requests: AtomicU64::new(0),
            dropped_requests: AtomicU64::new(0),
            backend_failures: AtomicU64::new(0),
        }
    }
}

/// A snapshot of dispatcher counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatcherStats {
    /// Messages queued but not handled yet.
    pub pending: usize,
    /// Sounds currently tracked by the worker.
    pub tracked: usize,
    /// Stop, volume and pitch requests that referenced an unknown play id.
    pub unknown_play_ids: u64,
    /// Requests refused because the queue was full or the dispatcher was
    /// shut down.
    pub rejected_requests: u64,
    /// Control requests dropped after waiting for room in a full queue.
    pub dropped_requests: u64,
    /// Backend calls that returned an error.
    pub backend_failures: u64,
}

/// Builder for creating dispatchers with custom configuration.
#[derive(Debug, Default)]
pub struct DispatcherBuilder {
    config: DispatcherConfig,
}

impl DispatcherBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration.
    pub fn from_config(config: DispatcherConfig) -> Self {
        Self { config }
    }

    /// Set the worker thread name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.thread_name = name.into();
        self
    }

    /// Set the message queue capacity.
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = capacity;
        self
    }

    /// Set how long control requests wait for room in a full queue.
    pub fn control_timeout(mut self, timeout: Duration) -> Self {
        self.config.control_timeout_ms = duration_to_millis(timeout);
        self
    }

    /// Set how long `shutdown()` waits for room in a full queue.
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.config.shutdown_timeout_ms = duration_to_millis(timeout);
        self
    }

    /// Set the stack size for the worker thread.
    pub fn stack_size(mut self, size: usize) -> Self {
        self.config.stack_size = Some(size);
        self
    }

    /// Build the dispatcher and start its worker thread.
    pub fn build(self) -> Result<SoundDispatcher> {
        SoundDispatcher::with_config(self.config)
    }

    /// Build the dispatcher and hand back its worker without starting it.
    pub fn build_detached(self) -> Result<(SoundDispatcher, SoundWorker)> {
        SoundDispatcher::detached(self.config)
    }
}

fn duration_to_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Dispatches sound requests to a dedicated worker.
///
/// `SoundDispatcher` is `Send + Sync`; share it between threads behind an
/// `Arc`. Dropping it requests shutdown without waiting for the worker.
pub struct SoundDispatcher {
    sender: Sender<Message>,
    /// Next play id. Held while enqueueing so ids follow queue order.
    next_play_id: Mutex<u64>,
    state: Arc<DispatcherState>,
    handle: Mutex<Option<JoinHandle<()>>>,
    config: DispatcherConfig,
}

impl SoundDispatcher {
    /// Create a dispatcher with the default configuration.
    ///
    /// The worker thread starts immediately.
    pub fn new() -> Result<Self> {
        Self::with_config(DispatcherConfig::default())
    }

    /// Create a dispatcher with a custom configuration.
    pub fn with_config(config: DispatcherConfig) -> Result<Self> {
        let (mut dispatcher, worker) = Self::detached(config)?;

        let mut builder = thread::Builder::new().name(dispatcher.config.thread_name.clone());
        if let Some(stack_size) = dispatcher.config.stack_size {
            builder = builder.stack_size(stack_size);
        }

        let handle = builder.spawn(move || worker.run()).map_err(Error::Spawn)?;
        *dispatcher.handle.get_mut() = Some(handle);

        Ok(dispatcher)
    }

    /// Create a dispatcher and return its worker without spawning a thread.
    ///
    /// The caller is responsible for driving the worker, either with
    /// [`SoundWorker::run`] on a thread of its choosing or by stepping it
    /// with [`SoundWorker::try_process_one`].
    pub fn detached(config: DispatcherConfig) -> Result<(Self, SoundWorker)> {
        config.validate()?;

        let (sender, receiver) = bounded(config.queue_capacity);
        let state = Arc::new(DispatcherState::new());
        let worker = SoundWorker::new(receiver, state.clone(), config.queue_capacity);

        let dispatcher = Self {
            sender,
            next_play_id: Mutex::new(0),
            state,
            handle: Mutex::new(None),
            config,
        };

        Ok((dispatcher, worker))
    }

    /// Play a sound on the calling thread, without tracking it.
    ///
    /// The playback cannot be stopped or adjusted later. This is the lowest
    /// latency path, but it blocks the caller for as long as the backend
    /// takes to start the sound.
    pub fn play_and_forget(&self, sound: &SoundHandle, volume: f32) {
        if let Err(err) = sound.play(sanitize_volume(volume), 1.0, 0.0) {
            self.state.backend_failures.fetch_add(1, Ordering::Relaxed);
            error!(
                target: targets::DISPATCHER,
                sound = sound.name(),
                error = %err,
                "Failed to play untracked sound"
            );
        }
    }

    /// Play a sound once at normal pitch.
    ///
    /// See [`play_with_pitch`](Self::play_with_pitch).
    pub fn play(
        &self,
        sound: &SoundHandle,
        volume: f32,
    ) -> std::result::Result<PlayId, DispatchError> {
        self.play_with_pitch(sound, volume, 1.0)
    }

    /// Play a sound once on the worker.
    ///
    /// Returns the id to use with [`stop`](Self::stop),
    /// [`set_volume`](Self::set_volume) and [`set_pitch`](Self::set_pitch).
    /// The id is returned before the sound actually starts.
    ///
    /// The worker tracks the sound until it is stopped, even after a one-shot
    /// sound has finished playing. Sounds that will never be stopped or
    /// adjusted belong in [`play_and_forget`](Self::play_and_forget), which
    /// leaves no entry behind.
    ///
    /// # Errors
    ///
    /// [`DispatchError::QueueSaturated`] if the worker is too busy, or
    /// [`DispatchError::ShutDown`] after [`shutdown`](Self::shutdown).
    pub fn play_with_pitch(
        &self,
        sound: &SoundHandle,
        volume: f32,
        pitch: f32,
    ) -> std::result::Result<PlayId, DispatchError> {
        let volume = sanitize_volume(volume);
        let pitch = sanitize_pitch(pitch);
        self.submit_tracked(|play_id| Message::Play {
            play_id,
            sound: sound.clone(),
            volume,
            pitch,
        })
    }

    /// Play a sound repeatedly on the worker until it is stopped.
    ///
    /// Same contract as [`play_with_pitch`](Self::play_with_pitch).
    pub fn loop_sound(
        &self,
        sound: &SoundHandle,
        volume: f32,
        pitch: f32,
    ) -> std::result::Result<PlayId, DispatchError> {
        let volume = sanitize_volume(volume);
        let pitch = sanitize_pitch(pitch);
        self.submit_tracked(|play_id| Message::Loop {
            play_id,
            sound: sound.clone(),
            volume,
            pitch,
        })
    }

    /// Request a tracked sound to stop.
    ///
    /// Returns `true` if the request was queued. An unknown id is logged by
    /// the worker and otherwise ignored.
    pub fn stop(&self, play_id: PlayId) -> bool {
        self.submit_control(Message::Stop { play_id })
    }

    /// Request a volume change for a tracked sound.
    ///
    /// Returns `true` if the request was queued.
    pub fn set_volume(&self, play_id: PlayId, volume: f32) -> bool {
        self.submit_control(Message::SetVolume {
            play_id,
            volume: sanitize_volume(volume),
        })
    }

    /// Request a pitch change for a tracked sound.
    ///
    /// Returns `true` if the request was queued.
    pub fn set_pitch(&self, play_id: PlayId, pitch: f32) -> bool {
        self.submit_control(Message::SetPitch {
            play_id,
            pitch: sanitize_pitch(pitch),
        })
    }

    /// Block until the worker has handled every request submitted before
    /// this call.
    ///
    /// Returns `false` if the dispatcher is shut down or the worker is gone.
    /// On a detached dispatcher this blocks until the worker is driven.
    pub fn sync(&self) -> bool {
        if !self.is_running() {
            return false;
        }

        let (done, acknowledged) = bounded(1);
        self.state.pending.fetch_add(1, Ordering::AcqRel);

        if self.sender.send(Message::Sync { done }).is_err() {
            self.state.pending.fetch_sub(1, Ordering::AcqRel);
            return false;
        }
        acknowledged.recv().is_ok()
    }

    /// Stop accepting requests and ask the worker to exit.
    ///
    /// Requests already queued are handled first. This is a non-blocking
    /// call unless the queue is full, in which case it waits up to the
    /// configured shutdown timeout. Use [`join`](Self::join) to wait for the
    /// worker.
    ///
    /// Returns `false` if the dispatcher was already shut down or the
    /// shutdown request could not be queued.
    pub fn shutdown(&self) -> bool {
        if !self.state.running.swap(false, Ordering::AcqRel) {
            return false;
        }

        debug!(target: targets::DISPATCHER, "Sound dispatcher shutting down");
        self.state.pending.fetch_add(1, Ordering::AcqRel);

        match self
            .sender
            .send_timeout(Message::Shutdown, self.config.shutdown_timeout())
        {
            Ok(()) => true,
            Err(_) => {
                self.state.pending.fetch_sub(1, Ordering::AcqRel);
                error!(
                    target: targets::DISPATCHER,
                    "Could not queue shutdown request, worker exits when the dispatcher is dropped"
                );
                false
            }
        }
    }

    /// Wait for the worker thread to finish.
    ///
    /// Returns `true` if the worker was joined successfully, `false` if
    /// already joined, detached, or the thread panicked.
    pub fn join(&self) -> bool {
        let mut handle = self.handle.lock();
        if let Some(h) = handle.take() {
            h.join().is_ok()
        } else {
            false
        }
    }

    /// Shut down and wait for the worker to finish.
    pub fn shutdown_and_join(&self) -> bool {
        self.shutdown();
        self.join()
    }

    /// Whether the dispatcher accepts requests.
    pub fn is_running(&self) -> bool {
        self.state.running.load(Ordering::Acquire)
    }

    /// Whether the worker has left its loop.
    pub fn is_worker_finished(&self) -> bool {
        self.state.worker_finished.load(Ordering::Acquire)
    }

    /// Capacity of the message queue.
    pub fn queue_capacity(&self) -> usize {
        self.config.queue_capacity
    }

    /// The configuration this dispatcher was built with.
    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// A snapshot of the dispatcher counters.
    pub fn stats(&self) -> DispatcherStats {
        DispatcherStats {
            pending: self.state.pending.load(Ordering::Acquire),
            tracked: self.state.tracked.load(Ordering::Acquire),
            unknown_play_ids: self.state.unknown_play_ids.load(Ordering::Relaxed),
            rejected_requests: self.state.rejected_requests.load(Ordering::Relaxed),
            dropped_requests: self.state.dropped_requests.load(Ordering::Relaxed),
            backend_failures: self.state.backend_failures.load(Ordering::Relaxed),
        }
    }

    /// Allocate a play id and queue a play or loop message without blocking.
    ///
    /// The id is only consumed when the message is accepted.
    fn submit_tracked<F>(&self, make_message: F) -> std::result::Result<PlayId, DispatchError>
    where
        F: FnOnce(PlayId) -> Message,
    {
        if !self.is_running() {
            self.state.rejected_requests.fetch_add(1, Ordering::Relaxed);
            return Err(DispatchError::ShutDown);
        }

        let mut next_play_id = self.next_play_id.lock();
        let play_id = PlayId::from_raw(*next_play_id);

        self.state.pending.fetch_add(1, Ordering::AcqRel);

        match self.sender.try_send(make_message(play_id)) {
            Ok(()) => {
                *next_play_id += 1;
                Ok(play_id)
            }
            Err(TrySendError::Full(message)) => {
                self.state.pending.fetch_sub(1, Ordering::AcqRel);
                self.state.rejected_requests.fetch_add(1, Ordering::Relaxed);
                error!(
                    target: targets::DISPATCHER,
                    request = message.kind(),
                    capacity = self.config.queue_capacity,
                    "Sound queue is full, request rejected"
                );
                Err(DispatchError::QueueSaturated {
                    capacity: self.config.queue_capacity,
                })
            }
            Err(TrySendError::Disconnected(message)) => {
                self.state.pending.fetch_sub(1, Ordering::AcqRel);
                self.state.rejected_requests.fetch_add(1, Ordering::Relaxed);
                self.worker_gone(message.kind());
                Err(DispatchError::ShutDown)
            }
        }
    }

    /// The worker dropped its receiver without a shutdown request.
    fn worker_gone(&self, request: &'static str) {
        self.state.running.store(false, Ordering::Release);
        error!(
            target: targets::DISPATCHER,
            request,
            "Sound worker is gone, request rejected"
        );
    }

    /// Queue a control message, waiting briefly if the queue is full.
    fn submit_control(&self, message: Message) -> bool {
        if !self.is_running() {
            self.state.rejected_requests.fetch_add(1, Ordering::Relaxed);
            debug!(
                target: targets::DISPATCHER,
                request = message.kind(),
                "Sound dispatcher is shut down, request ignored"
            );
            return false;
        }

        self.state.pending.fetch_add(1, Ordering::AcqRel);

        match self
            .sender
            .send_timeout(message, self.config.control_timeout())
        {
            Ok(()) => true,
            Err(SendTimeoutError::Timeout(message)) => {
                self.state.pending.fetch_sub(1, Ordering::AcqRel);
                self.state.dropped_requests.fetch_add(1, Ordering::Relaxed);
                error!(
                    target: targets::DISPATCHER,
                    request = message.kind(),
                    timeout_ms = self.config.control_timeout_ms,
                    "Sound queue is full, request dropped"
                );
                false
            }
            Err(SendTimeoutError::Disconnected(message)) => {
                self.state.pending.fetch_sub(1, Ordering::AcqRel);
                self.state.rejected_requests.fetch_add(1, Ordering::Relaxed);
                self.worker_gone(message.kind());
                false
            }
        }
    }
}

impl Drop for SoundDispatcher {
    fn drop(&mut self) {
        // Don't block in drop, dropping the sender also ends the worker loop
        if self.state.running.swap(false, Ordering::AcqRel) {
            self.state.pending.fetch_add(1, Ordering::AcqRel);
            if self.sender.try_send(Message::Shutdown).is_err() {
                self.state.pending.fetch_sub(1, Ordering::AcqRel);
            }
        }
    }
}
