//! Record tables for every track, persisted as JSON.

use std::collections::BTreeMap;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Result, StatsError};
use crate::track_stats::{ResultType, TrackStats};

/// Records for all tracks, keyed by track id.
///
/// Stats loaded with [`GameStats::load`] remember their file and are
/// written back whenever [`record_result`](Self::record_result) sets a new
/// record.
///
/// # Example
///
/// ```no_run
/// use pitlane_stats::{GameStats, ResultType};
///
/// let mut stats = GameStats::load("saves/stats.json")?;
/// if let Some(rank) = stats.record_result("harbor", ResultType::Lap, "red", 41.7)? {
///     println!("New lap record, rank {}", rank + 1);
/// }
/// # Ok::<(), pitlane_stats::StatsError>(())
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameStats {
    #[serde(default)]
    tracks: BTreeMap<String, TrackStats>,
    #[serde(skip)]
    path: Option<PathBuf>,
}

impl GameStats {
    /// Create empty stats that are not backed by a file.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load stats from `path`, binding them to it for later saves.
    ///
    /// A missing file yields empty stats.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut stats = match fs::read_to_string(path) {
            Ok(content) => serde_json::from_str::<GameStats>(&content)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No stats file, starting empty");
                GameStats::new()
            }
            Err(err) => return Err(StatsError::io(path, err)),
        };
        stats.path = Some(path.to_path_buf());
        Ok(stats)
    }

    /// The file these stats are saved to, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Records for a track, if any were set.
    pub fn track_stats(&self, track_id: &str) -> Option<&TrackStats> {
        self.tracks.get(track_id)
    }

    /// Records for a track, created empty if needed.
    pub fn track_stats_mut(&mut self, track_id: &str) -> &mut TrackStats {
        self.tracks.entry(track_id.to_string()).or_default()
    }

    /// Ids of every track with records, in sorted order.
    pub fn track_ids(&self) -> impl Iterator<Item = &str> {
        self.tracks.keys().map(String::as_str)
    }

    /// Add a result to a track and save if it ranked.
    ///
    /// Returns the rank of the result, or `None` if it did not make the
    /// table.
    pub fn record_result(
        &mut self,
        track_id: &str,
        kind: ResultType,
        vehicle: &str,
        time: f32,
    ) -> Result<Option<usize>> {
        let rank = self.track_stats_mut(track_id).add_result(kind, vehicle, time);
        if let Some(rank) = rank {
            info!(track = track_id, ?kind, vehicle, time, rank, "New record");
            self.save()?;
        }
        Ok(rank)
    }

    /// Write the stats to their file.
    ///
    /// The file is replaced atomically: the JSON goes to a temporary file
    /// in the same directory which is then renamed over the target. Stats
    /// created with [`new`](Self::new) have no file and saving them does
    /// nothing.
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        self.save_to(path)
    }

    /// Write the stats to `path` without rebinding them.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let temp_path = temp_path_for(path);

        if let Err(err) = self.write_temp(&temp_path) {
            fs::remove_file(&temp_path).ok();
            return Err(err);
        }
        if let Err(err) = fs::rename(&temp_path, path) {
            warn!(path = %path.display(), error = %err, "Failed to replace stats file");
            fs::remove_file(&temp_path).ok();
            return Err(StatsError::io(path, err));
        }

        debug!(path = %path.display(), tracks = self.tracks.len(), "Saved stats");
        Ok(())
    }

    fn write_temp(&self, temp_path: &Path) -> Result<()> {
        let file = fs::File::create(temp_path).map_err(|e| StatsError::io(temp_path, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush().map_err(|e| StatsError::io(temp_path, e))?;
        writer
            .get_ref()
            .sync_all()
            .map_err(|e| StatsError::io(temp_path, e))
    }
}

/// Temporary file next to `path`, so the rename stays on one filesystem.
fn temp_path_for(path: &Path) -> PathBuf {
    let parent = path.parent().unwrap_or(Path::new("."));
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "stats".to_string());
    parent.join(format!(".{}.tmp.{}", file_name, std::process::id()))
}
