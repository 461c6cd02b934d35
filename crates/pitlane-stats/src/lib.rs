//! Per-track record tables for Pitlane.
//!
//! Each track keeps its three best lap times and three best race times.
//! [`GameStats`] holds the tables for every track and saves them to a JSON
//! file whenever a result makes it into a table.
//!
//! Tables can be seeded with default records held by the
//! [`DEFAULT_RECORD_VEHICLE`]. Those give players something to beat and are
//! never written to disk.

mod error;
mod game_stats;
mod track_stats;

pub use error::{Result, StatsError};
pub use game_stats::GameStats;
pub use track_stats::{DEFAULT_RECORD_VEHICLE, RECORD_COUNT, ResultType, TrackResult, TrackStats};
