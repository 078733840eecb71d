//! flightdeck - Context hub for the mission-control core.
//!
//! Wires the event store, task-graph builder, workspace tracker, redaction
//! engine, and safety gate into one explicit context object constructed at
//! process start and passed by reference to every consumer. No global
//! singletons: independent contexts per test are cheap.
//!
//! Transport, authentication, and UI are external collaborators; they
//! drive the core exclusively through [`Flightdeck`]'s query and
//! ingestion surface.

mod context;
mod settings;

pub use context::{Flightdeck, SetupError, SnapshotOptions};
pub use settings::{
    load_settings, load_settings_from_paths, FlightdeckSettings, GraphSettings,
    RedactionSettings, SafetySettings, StoreSettings, WorkspaceSettings,
};

pub use flightdeck_graph::{GraphBuilder, GraphConfig, TaskGraph};
pub use flightdeck_redact::{PatternError, RedactionConfig, RedactionEngine, REDACTION_MARKER};
pub use flightdeck_safety::{GateDecision, SafetyGate};
pub use flightdeck_store::{
    EventStore, FlatTaskGraph, FlushHandle, Health, HealthStatus, RunPage, StoreConfig, StoreError,
};
pub use flightdeck_types::{
    AgentEvent, EventFilter, EventKind, FilterError, NodeStatus, Run, RunPatch, RunStatus,
};
pub use flightdeck_workspace::{
    FileDiff, FileOperation, FsHandle, TrackerConfig, TrackerError, WorkspaceSnapshot,
    WorkspaceTracker,
};
