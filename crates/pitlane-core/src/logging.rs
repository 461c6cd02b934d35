//! Logging facilities for Pitlane.
//!
//! Pitlane uses the `tracing` crate for instrumentation. To see logs,
//! install a tracing subscriber in your application:
//!
//! ```ignore
//! fn main() {
//!     tracing_subscriber::fmt()
//!         .with_env_filter("pitlane_core::worker=debug")
//!         .init();
//!
//!     // Your game code...
//! }
//! ```
//!
//! Invalid play ids, saturated queues, dropped control requests and backend
//! failures are reported at `error` level. Worker lifecycle is reported at
//! `debug`, individual messages at `trace`.

/// Span names used throughout Pitlane for tracing.
pub mod span_names {
    /// Span wrapping the whole life of the sound worker thread.
    pub const SOUND_WORKER: &str = "pitlane::sound_worker";
}

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core crate target.
    pub const CORE: &str = "pitlane_core";
    /// Caller-facing dispatcher target.
    pub const DISPATCHER: &str = "pitlane_core::dispatcher";
    /// Sound worker target.
    pub const WORKER: &str = "pitlane_core::worker";
}
