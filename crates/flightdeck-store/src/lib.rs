//! flightdeck-store - Append-only event store with bounded retention.
//!
//! Owns the durable run/event data: appends events into per-run bounded
//! rings, serves filtered queries, and flushes the in-memory state to disk
//! on a timer. Durability is at-most-every-N-seconds: a crash between
//! mutation and flush loses the unflushed delta.
//!
//! Persisted layout:
//! - `<data_dir>/runs.json` - one document with all run metadata
//! - `<data_dir>/events/<run_id>.jsonl` - one line-delimited log per run
//!
//! Startup restores run metadata only; per-run event logs hydrate lazily
//! on the first query touching that run.

mod config;
mod error;
mod flat_graph;
mod flush;
mod observability;
mod persistence;
mod store;

pub use config::StoreConfig;
pub use error::StoreError;
pub use flat_graph::{FlatGraphEdge, FlatGraphNode, FlatTaskGraph};
pub use flush::{spawn_flusher, FlushHandle};
pub use store::{EventStore, Health, HealthStatus, RunPage};
