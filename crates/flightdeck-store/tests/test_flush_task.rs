//! Integration tests for the periodic flush task lifecycle.

use std::sync::Arc;
use std::time::Duration;

use flightdeck_store::{EventStore, StoreConfig};
use flightdeck_types::{AgentEvent, EventKind, Run};
use tempfile::TempDir;

#[tokio::test]
async fn test_flush_task_persists_on_interval() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(EventStore::new(StoreConfig {
        flush_interval: Duration::from_millis(20),
        ..StoreConfig::persistent(dir.path())
    }));
    let handle = flightdeck_store::spawn_flusher(&store);

    store.create_run(Run::new("r1")).unwrap();
    store
        .append_event(AgentEvent::new("e0", "r1", EventKind::SystemInfo))
        .unwrap();

    tokio::time::sleep(Duration::from_millis(80)).await;
    handle.stop_and_join().await;

    let log = dir.path().join("events").join("r1.jsonl");
    assert!(log.exists());
    let content = std::fs::read_to_string(log).unwrap();
    assert_eq!(content.lines().count(), 1);
}

#[tokio::test]
async fn test_stop_flushes_pending_delta() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(EventStore::new(StoreConfig {
        // Long interval: only the shutdown flush can persist the event.
        flush_interval: Duration::from_secs(3600),
        ..StoreConfig::persistent(dir.path())
    }));
    let handle = flightdeck_store::spawn_flusher(&store);
    // Let the immediate first tick pass before mutating.
    tokio::time::sleep(Duration::from_millis(20)).await;

    store.create_run(Run::new("r1")).unwrap();
    store
        .append_event(AgentEvent::new("e0", "r1", EventKind::SystemInfo))
        .unwrap();
    handle.stop_and_join().await;

    let content =
        std::fs::read_to_string(dir.path().join("events").join("r1.jsonl")).unwrap();
    assert_eq!(content.lines().count(), 1);
}

#[tokio::test]
async fn test_stop_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(EventStore::new(StoreConfig::persistent(dir.path())));
    let handle = flightdeck_store::spawn_flusher(&store);
    handle.stop();
    handle.stop();
    handle.stop_and_join().await;
}
