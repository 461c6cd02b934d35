//! Dispatcher configuration.
//!
//! A [`DispatcherConfig`] can be built in code, through
//! [`DispatcherBuilder`](crate::DispatcherBuilder), or loaded from a TOML
//! table. Every field is optional in TOML:
//!
//! ```toml
//! thread_name = "race-sfx"
//! queue_capacity = 80
//! control_timeout_ms = 20
//! shutdown_timeout_ms = 1000
//! stack_size = 262144
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default capacity of the message queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 80;

/// Default name of the sound worker thread.
pub const DEFAULT_THREAD_NAME: &str = "pitlane-sound";

const DEFAULT_CONTROL_TIMEOUT_MS: u64 = 20;
const DEFAULT_SHUTDOWN_TIMEOUT_MS: u64 = 1000;

/// Configuration for creating a sound dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Name for the worker thread.
    pub thread_name: String,
    /// Capacity of the message queue.
    pub queue_capacity: usize,
    /// How long stop/volume/pitch requests wait for room in a full queue
    /// before being dropped.
    pub control_timeout_ms: u64,
    /// How long `shutdown()` waits for room in a full queue.
    pub shutdown_timeout_ms: u64,
    /// Stack size for the worker thread in bytes. `None` uses the default.
    pub stack_size: Option<usize>,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            thread_name: DEFAULT_THREAD_NAME.to_string(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            control_timeout_ms: DEFAULT_CONTROL_TIMEOUT_MS,
            shutdown_timeout_ms: DEFAULT_SHUTDOWN_TIMEOUT_MS,
            stack_size: None,
        }
    }
}

impl DispatcherConfig {
    /// Create a new configuration with the given thread name.
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            thread_name: name.into(),
            ..Default::default()
        }
    }

    /// Parse a configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Check that every value is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue_capacity == 0 {
            return Err(ConfigError::invalid(
                "queue_capacity",
                "must be greater than 0",
            ));
        }
        if self.thread_name.trim().is_empty() {
            return Err(ConfigError::invalid("thread_name", "must not be empty"));
        }
        if self.stack_size == Some(0) {
            return Err(ConfigError::invalid("stack_size", "must be greater than 0"));
        }
        Ok(())
    }

    /// Wait applied to control requests when the queue is full.
    pub fn control_timeout(&self) -> Duration {
        Duration::from_millis(self.control_timeout_ms)
    }

    /// Wait applied to the shutdown request when the queue is full.
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}
