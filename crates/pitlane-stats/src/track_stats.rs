//! Best lap and total times for one track.

use serde::{Deserialize, Serialize, Serializer};

/// Number of records kept per result type.
pub const RECORD_COUNT: usize = 3;

/// Vehicle name used for seeded default records.
///
/// Records held by this vehicle are never written to disk.
pub const DEFAULT_RECORD_VEHICLE: &str = "CPU";

/// A single timed result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackResult {
    /// Name of the vehicle that set the time.
    pub vehicle: String,
    /// Time in seconds.
    pub value: f32,
}

impl TrackResult {
    /// Create a result.
    pub fn new(vehicle: impl Into<String>, value: f32) -> Self {
        Self {
            vehicle: vehicle.into(),
            value,
        }
    }

    /// Whether this is a seeded default record.
    pub fn is_default(&self) -> bool {
        self.vehicle == DEFAULT_RECORD_VEHICLE
    }
}

/// Which record table a result belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultType {
    /// Best single lap.
    Lap,
    /// Best complete race.
    Total,
}

/// Record tables for one track, sorted fastest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackStats {
    #[serde(default, serialize_with = "serialize_player_records")]
    lap_records: Vec<TrackResult>,
    #[serde(default, serialize_with = "serialize_player_records")]
    total_records: Vec<TrackResult>,
}

impl TrackStats {
    /// Create empty record tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// The records of one type, fastest first.
    pub fn records(&self, kind: ResultType) -> &[TrackResult] {
        match kind {
            ResultType::Lap => &self.lap_records,
            ResultType::Total => &self.total_records,
        }
    }

    fn records_mut(&mut self, kind: ResultType) -> &mut Vec<TrackResult> {
        match kind {
            ResultType::Lap => &mut self.lap_records,
            ResultType::Total => &mut self.total_records,
        }
    }

    /// Add a result and return its rank (0 is the best) if it made the table.
    ///
    /// A result is inserted ahead of the first record it strictly beats, so
    /// an equal time ranks behind the existing one. If it beats nothing but
    /// the table is not full, it is appended.
    pub fn add_result(
        &mut self,
        kind: ResultType,
        vehicle: impl Into<String>,
        time: f32,
    ) -> Option<usize> {
        insert_result(self.records_mut(kind), TrackResult::new(vehicle, time))
    }

    /// Seed a record held by [`DEFAULT_RECORD_VEHICLE`].
    ///
    /// Gives players a time to beat on tracks they have not raced yet.
    pub fn add_default_record(&mut self, kind: ResultType, time: f32) -> Option<usize> {
        self.add_result(kind, DEFAULT_RECORD_VEHICLE, time)
    }
}

fn insert_result(records: &mut Vec<TrackResult>, result: TrackResult) -> Option<usize> {
    if let Some(rank) = records.iter().position(|r| result.value < r.value) {
        records.insert(rank, result);
        records.truncate(RECORD_COUNT);
        return Some(rank);
    }
    if records.len() < RECORD_COUNT {
        records.push(result);
        return Some(records.len() - 1);
    }
    None
}

fn serialize_player_records<S>(records: &[TrackResult], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_seq(records.iter().filter(|r| !r.is_default()))
}
