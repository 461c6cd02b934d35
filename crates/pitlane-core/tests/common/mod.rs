//! Shared test backend.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crossbeam_channel::{Receiver, Sender, unbounded};
use parking_lot::Mutex;
use pitlane_core::{BackendError, InstanceId, Sound, SoundHandle};

/// A backend call observed by [`RecordingSound`].
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Play {
        instance: InstanceId,
        volume: f32,
        pitch: f32,
        start_time: f32,
    },
    Loop {
        instance: InstanceId,
        volume: f32,
        pitch: f32,
        start_time: f32,
    },
    Stop(InstanceId),
    SetVolume(InstanceId, f32),
    SetPitch(InstanceId, f32),
}

/// A sound that records every backend call.
///
/// Instance ids start at 1000 so they never collide with play ids in
/// assertions.
pub struct RecordingSound {
    name: String,
    calls: Mutex<Vec<Call>>,
    next_instance: AtomicU64,
    fail_plays: AtomicBool,
    panic_plays: AtomicBool,
    gate: Mutex<Option<Receiver<()>>>,
    entered: Mutex<Option<Sender<()>>>,
}

impl RecordingSound {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            calls: Mutex::new(Vec::new()),
            next_instance: AtomicU64::new(1000),
            fail_plays: AtomicBool::new(false),
            panic_plays: AtomicBool::new(false),
            gate: Mutex::new(None),
            entered: Mutex::new(None),
        })
    }

    pub fn handle(self: &Arc<Self>) -> SoundHandle {
        self.clone()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn stops(&self) -> Vec<InstanceId> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Stop(instance) => Some(instance),
                _ => None,
            })
            .collect()
    }

    pub fn started_instances(&self) -> Vec<InstanceId> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Play { instance, .. } | Call::Loop { instance, .. } => Some(instance),
                _ => None,
            })
            .collect()
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail_plays.store(failing, Ordering::SeqCst);
    }

    /// Make play and loop calls panic instead of returning.
    pub fn set_panicking(&self, panicking: bool) {
        self.panic_plays.store(panicking, Ordering::SeqCst);
    }

    /// Make the next play or loop call block until the returned sender is
    /// used or dropped. The second receiver fires once the call is blocked.
    pub fn block_next_play(&self) -> (Sender<()>, Receiver<()>) {
        let (release, gate) = unbounded();
        let (entered_tx, entered_rx) = unbounded();
        *self.gate.lock() = Some(gate);
        *self.entered.lock() = Some(entered_tx);
        (release, entered_rx)
    }

    fn start(
        &self,
        looping: bool,
        volume: f32,
        pitch: f32,
        start_time: f32,
    ) -> Result<InstanceId, BackendError> {
        let gate = self.gate.lock().take();
        if let Some(gate) = gate {
            if let Some(entered) = self.entered.lock().take() {
                let _ = entered.send(());
            }
            let _ = gate.recv();
        }

        if self.panic_plays.load(Ordering::SeqCst) {
            panic!("{} blew up in the driver", self.name);
        }

        if self.fail_plays.load(Ordering::SeqCst) {
            return Err(BackendError::Playback(format!("{} refused to play", self.name)));
        }

        let instance = InstanceId::from_raw(self.next_instance.fetch_add(1, Ordering::SeqCst));
        let call = if looping {
            Call::Loop {
                instance,
                volume,
                pitch,
                start_time,
            }
        } else {
            Call::Play {
                instance,
                volume,
                pitch,
                start_time,
            }
        };
        self.calls.lock().push(call);
        Ok(instance)
    }
}

impl Sound for RecordingSound {
    fn play(&self, volume: f32, pitch: f32, start_time: f32) -> Result<InstanceId, BackendError> {
        self.start(false, volume, pitch, start_time)
    }

    fn loop_sound(
        &self,
        volume: f32,
        pitch: f32,
        start_time: f32,
    ) -> Result<InstanceId, BackendError> {
        self.start(true, volume, pitch, start_time)
    }

    fn stop(&self, instance: InstanceId) {
        self.calls.lock().push(Call::Stop(instance));
    }

    fn set_volume(&self, instance: InstanceId, volume: f32) {
        self.calls.lock().push(Call::SetVolume(instance, volume));
    }

    fn set_pitch(&self, instance: InstanceId, pitch: f32) {
        self.calls.lock().push(Call::SetPitch(instance, pitch));
    }

    fn name(&self) -> &str {
        &self.name
    }
}
