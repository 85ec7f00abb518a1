//! Shared engine plumbing for the `melvind` daemon and `melvin` CLI:
//! runtime configuration, the metrics CSV log, the inbox watcher, and
//! (behind the `http` feature) the ingest HTTP endpoint.

pub mod config;
pub mod metrics_log;
pub mod watcher;

#[cfg(feature = "http")]
pub mod http;

use melvin_core::Scheduler;

/// Shared state behind the daemon's tick loop and (when enabled) its HTTP
/// endpoint. `base_ns` anchors wall-clock time to `Instant::now()` so
/// `now_ns()` keeps advancing even when the system clock is adjusted.
pub struct AppState {
    pub scheduler: Scheduler,
    pub config: config::EngineConfig,
    base_instant: std::time::Instant,
    base_ns: u64,
}

impl AppState {
    pub fn new(scheduler: Scheduler, config: config::EngineConfig, base_ns: u64) -> Self {
        Self {
            scheduler,
            config,
            base_instant: std::time::Instant::now(),
            base_ns,
        }
    }

    pub fn now_ns(&self) -> u64 {
        self.base_ns + self.base_instant.elapsed().as_nanos() as u64
    }
}
