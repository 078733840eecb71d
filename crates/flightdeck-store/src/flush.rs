//! Periodic flush task driving [`EventStore::flush`].

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::observability::StoreEvent;
use crate::store::EventStore;

/// Handle to a running flush task.
///
/// [`FlushHandle::stop`] is idempotent; dropping the handle without
/// stopping leaves the task running until the runtime shuts down.
pub struct FlushHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl FlushHandle {
    /// Signal the task to perform one final flush and exit. Safe to call
    /// any number of times.
    pub fn stop(&self) {
        let _ = self.shutdown.send(true);
    }

    /// Stop the task and wait for it to finish its final flush.
    pub async fn stop_and_join(self) {
        self.stop();
        let _ = self.task.await;
    }
}

/// Spawn the periodic flush task for this store.
///
/// Must be called from within a tokio runtime. The first tick flushes
/// immediately; thereafter every `flush_interval`, skipping missed ticks.
#[must_use]
pub fn spawn_flusher(store: &Arc<EventStore>) -> FlushHandle {
    let (shutdown, mut signal) = watch::channel(false);
    let store = Arc::clone(store);
    let interval = store.config().flush_interval;
    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    // Failures are already logged inside flush and the
                    // dirty state is kept, so the loop just keeps ticking.
                    let _ = store.flush();
                }
                changed = signal.changed() => {
                    if changed.is_err() || *signal.borrow() {
                        break;
                    }
                }
            }
        }
        let _ = store.flush();
        tracing::debug!(
            event = StoreEvent::FlushTaskStopped.as_str(),
            "flush task stopped"
        );
    });
    tracing::debug!(
        event = StoreEvent::FlushTaskStarted.as_str(),
        interval_secs = interval.as_secs(),
        "flush task started"
    );
    FlushHandle { shutdown, task }
}
