//! Event store configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Event store configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Persistence root. `None` keeps the store memory-only.
    pub data_dir: Option<PathBuf>,
    /// Maximum retained events per run; oldest are evicted FIFO past this.
    pub max_events_per_run: usize,
    /// Safety ceiling factor for the health check.
    pub max_runs_in_memory: usize,
    /// Interval between scheduled flushes.
    pub flush_interval: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            max_events_per_run: 10_000,
            max_runs_in_memory: 100,
            flush_interval: Duration::from_secs(30),
        }
    }
}

impl StoreConfig {
    /// Memory-only store with default caps.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Store persisting under `data_dir` with default caps.
    #[must_use]
    pub fn persistent(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: Some(data_dir.into()),
            ..Self::default()
        }
    }

    /// Total retained-event ceiling used by the health check.
    #[must_use]
    pub fn event_ceiling(&self) -> usize {
        self.max_events_per_run.saturating_mul(self.max_runs_in_memory)
    }
}
