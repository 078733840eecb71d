//! Structured log event names for the store.

/// Log event names attached to `tracing` records emitted by this crate.
#[derive(Debug, Clone, Copy)]
pub(crate) enum StoreEvent {
    RunCreated,
    RunUpdated,
    EventsEvicted,
    FlushSucceeded,
    FlushFailed,
    StoreLoaded,
    EventLogHydrated,
    FlushTaskStarted,
    FlushTaskStopped,
}

impl StoreEvent {
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::RunCreated => "store_run_created",
            Self::RunUpdated => "store_run_updated",
            Self::EventsEvicted => "store_events_evicted",
            Self::FlushSucceeded => "store_flush_succeeded",
            Self::FlushFailed => "store_flush_failed",
            Self::StoreLoaded => "store_loaded",
            Self::EventLogHydrated => "store_event_log_hydrated",
            Self::FlushTaskStarted => "store_flush_task_started",
            Self::FlushTaskStopped => "store_flush_task_stopped",
        }
    }
}
