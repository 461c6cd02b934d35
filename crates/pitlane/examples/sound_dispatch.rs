//! Pitlane Sound Dispatch Example
//!
//! Drives the dispatcher with a backend that logs every call and takes a
//! while to start sounds, the way some audio drivers do. The game loop never
//! waits on it. At the end of the "race" the lap times go into the record
//! tables.
//!
//! Run with: cargo run -p pitlane --example sound_dispatch

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use pitlane::stats::{GameStats, ResultType};
use pitlane::{BackendError, DispatcherBuilder, InstanceId, Sound, SoundHandle};
use tracing::info;

/// A backend that only logs.
struct ConsoleSound {
    name: &'static str,
    start_delay: Duration,
    next_instance: AtomicU64,
}

impl ConsoleSound {
    fn new(name: &'static str, start_delay: Duration) -> SoundHandle {
        Arc::new(Self {
            name,
            start_delay,
            next_instance: AtomicU64::new(0),
        })
    }

    fn start(&self, looping: bool, volume: f32, pitch: f32) -> Result<InstanceId, BackendError> {
        thread::sleep(self.start_delay);
        let instance = InstanceId::from_raw(self.next_instance.fetch_add(1, Ordering::Relaxed));
        info!(sound = self.name, %instance, looping, volume, pitch, "start");
        Ok(instance)
    }
}

impl Sound for ConsoleSound {
    fn play(&self, volume: f32, pitch: f32, _start_time: f32) -> Result<InstanceId, BackendError> {
        self.start(false, volume, pitch)
    }

    fn loop_sound(
        &self,
        volume: f32,
        pitch: f32,
        _start_time: f32,
    ) -> Result<InstanceId, BackendError> {
        self.start(true, volume, pitch)
    }

    fn stop(&self, instance: InstanceId) {
        info!(sound = self.name, %instance, "stop");
    }

    fn set_volume(&self, instance: InstanceId, volume: f32) {
        info!(sound = self.name, %instance, volume, "volume");
    }

    fn set_pitch(&self, instance: InstanceId, pitch: f32) {
        info!(sound = self.name, %instance, pitch, "pitch");
    }

    fn name(&self) -> &str {
        self.name
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let engine = ConsoleSound::new("engine", Duration::from_millis(40));
    let bump = ConsoleSound::new("bump", Duration::from_millis(25));

    let dispatcher = DispatcherBuilder::new()
        .name("example-sound")
        .queue_capacity(16)
        .build()?;

    let engine_id = dispatcher.loop_sound(&engine, 0.5, 1.0)?;

    let mut lap_times = Vec::new();
    for lap in 0..3 {
        let lap_start = Instant::now();
        for frame in 0..30 {
            let speed = (frame as f32 / 30.0) + lap as f32 * 0.1;
            dispatcher.set_pitch(engine_id, 1.0 + speed);
            if frame % 10 == 0 {
                // Collisions are frequent; a saturated queue just drops them.
                if let Err(err) = dispatcher.play(&bump, 0.8) {
                    info!(%err, "Skipped bump sound");
                }
            }
            thread::sleep(Duration::from_millis(16));
        }
        lap_times.push(lap_start.elapsed().as_secs_f32());
    }

    dispatcher.set_volume(engine_id, 0.1);
    dispatcher.stop(engine_id);
    dispatcher.sync();
    info!(stats = ?dispatcher.stats(), "Race over");
    dispatcher.shutdown_and_join();

    let path = std::env::temp_dir().join("pitlane-example-stats.json");
    let mut stats = GameStats::load(&path)?;
    stats
        .track_stats_mut("example")
        .add_default_record(ResultType::Lap, 0.55);
    for time in lap_times {
        match stats.record_result("example", ResultType::Lap, "player", time)? {
            Some(rank) => info!(time, rank = rank + 1, "Lap record"),
            None => info!(time, "No record"),
        }
    }
    info!(path = %path.display(), "Records saved");

    Ok(())
}
