//! The Flightdeck context object and its query surface.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use thiserror::Error;

use flightdeck_graph::{GraphBuilder, GraphConfig, TaskGraph};
use flightdeck_redact::{PatternError, RedactionConfig, RedactionEngine};
use flightdeck_safety::{GateDecision, SafetyGate};
use flightdeck_store::{
    EventStore, FlatTaskGraph, FlushHandle, Health, RunPage, StoreConfig, StoreError,
};
use flightdeck_types::{AgentEvent, EventFilter, Run, RunPatch};
use flightdeck_workspace::{
    FsHandle, TrackerConfig, TrackerError, WorkspaceSnapshot, WorkspaceTracker,
};

use crate::settings::FlightdeckSettings;

/// Initialization failure.
///
/// Surfaced once at construction; subsystems with soft failures (store
/// load, tracker data dir) log and degrade instead of erroring here.
#[derive(Debug, Error)]
pub enum SetupError {
    /// A configured redaction pattern does not compile. Redaction never
    /// silently disables itself, so this is a hard error.
    #[error(transparent)]
    Redaction(#[from] PatternError),
}

/// Options for workspace snapshot queries.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnapshotOptions {
    /// Also redact full file contents (before/after/unified) inside the
    /// snapshot. Separate opt-in from key/value payload redaction, since
    /// file bodies are not key/value pairs.
    pub redact_contents: bool,
}

/// The mission-control context: every subsystem, constructed once and
/// passed by reference to consumers.
pub struct Flightdeck {
    store: Arc<EventStore>,
    tracker: Arc<WorkspaceTracker>,
    fs: FsHandle,
    builder: GraphBuilder,
    redaction: RedactionEngine,
    safety: SafetyGate,
    flusher: Mutex<Option<FlushHandle>>,
}

impl Flightdeck {
    /// Build the context from settings.
    ///
    /// Existing persisted run metadata is restored; a corrupt or
    /// unreadable store document is logged and the store starts empty
    /// rather than failing startup.
    ///
    /// # Errors
    /// Returns [`SetupError::Redaction`] when a configured redaction
    /// pattern does not compile.
    pub fn new(settings: &FlightdeckSettings) -> Result<Self, SetupError> {
        let store_config = StoreConfig {
            data_dir: settings.data_dir.clone(),
            max_events_per_run: settings
                .store
                .max_events_per_run
                .unwrap_or(StoreConfig::default().max_events_per_run),
            max_runs_in_memory: settings
                .store
                .max_runs_in_memory
                .unwrap_or(StoreConfig::default().max_runs_in_memory),
            flush_interval: settings
                .store
                .flush_interval_secs
                .map(Duration::from_secs)
                .unwrap_or(StoreConfig::default().flush_interval),
        };
        let store = Arc::new(EventStore::new(store_config));
        if let Err(error) = store.load() {
            tracing::warn!(%error, "run metadata restore failed; starting empty");
        }

        let tracker_defaults = TrackerConfig::default();
        let tracker = Arc::new(WorkspaceTracker::new(TrackerConfig {
            enabled: settings.workspace.enabled.unwrap_or(tracker_defaults.enabled),
            data_dir: settings.data_dir.clone(),
            max_operations: settings
                .workspace
                .max_operations
                .unwrap_or(tracker_defaults.max_operations),
            diff_max_age_days: settings
                .workspace
                .diff_max_age_days
                .unwrap_or(tracker_defaults.diff_max_age_days),
        }));

        let graph_defaults = GraphConfig::default();
        let builder = GraphBuilder::new(GraphConfig {
            auto_layout: settings.graph.auto_layout.unwrap_or(graph_defaults.auto_layout),
            include_raw_events: settings
                .graph
                .include_raw_events
                .unwrap_or(graph_defaults.include_raw_events),
            ..graph_defaults
        });

        let redaction_defaults = RedactionConfig::default();
        let redaction = RedactionEngine::new(RedactionConfig {
            sensitive_keys: settings
                .redaction
                .sensitive_keys
                .clone()
                .unwrap_or(redaction_defaults.sensitive_keys),
            value_patterns: settings
                .redaction
                .value_patterns
                .clone()
                .unwrap_or(redaction_defaults.value_patterns),
        })?;

        let safety = SafetyGate::new();
        if settings.safety.safe_mode.unwrap_or(false) {
            safety.set_safe_mode(true);
        }

        Ok(Self {
            store,
            tracker,
            fs: FsHandle::real(),
            builder,
            redaction,
            safety,
            flusher: Mutex::new(None),
        })
    }

    /// Start the periodic flush task. Idempotent; must be called from
    /// within a tokio runtime.
    pub fn start(&self) {
        let mut guard = self.flusher.lock().unwrap_or_else(PoisonError::into_inner);
        if guard.is_none() {
            *guard = Some(flightdeck_store::spawn_flusher(&self.store));
        }
    }

    /// Stop the flush task. Safe to call multiple times or when never
    /// started.
    pub fn shutdown(&self) {
        let guard = self.flusher.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(ref handle) = *guard {
            handle.stop();
        }
    }

    /// The event store.
    #[must_use]
    pub fn store(&self) -> &Arc<EventStore> {
        &self.store
    }

    /// The workspace tracker.
    #[must_use]
    pub fn tracker(&self) -> &Arc<WorkspaceTracker> {
        &self.tracker
    }

    /// The file-primitive indirection handle the host routes through.
    #[must_use]
    pub fn fs(&self) -> &FsHandle {
        &self.fs
    }

    /// The redaction engine.
    #[must_use]
    pub fn redaction(&self) -> &RedactionEngine {
        &self.redaction
    }

    /// The safety gate.
    #[must_use]
    pub fn safety(&self) -> &SafetyGate {
        &self.safety
    }

    /// Install the file hooks, gated by the host's feature flag.
    pub fn install_hooks(&self) {
        self.fs.install_hooks(Arc::clone(&self.tracker));
    }

    /// Uninstall the file hooks.
    pub fn uninstall_hooks(&self) {
        self.fs.uninstall_hooks();
    }

    /// Whether the file hooks are installed.
    #[must_use]
    pub fn hooks_installed(&self) -> bool {
        self.fs.hooks_installed()
    }

    // --- ingestion -------------------------------------------------------

    /// Register a run.
    ///
    /// # Errors
    /// See [`EventStore::create_run`].
    pub fn create_run(&self, run: Run) -> Result<(), StoreError> {
        self.store.create_run(run)
    }

    /// Merge a partial update into a run.
    ///
    /// # Errors
    /// See [`EventStore::update_run`].
    pub fn update_run(&self, run_id: &str, patch: RunPatch) -> Result<Run, StoreError> {
        self.store.update_run(run_id, patch)
    }

    /// Append one event, called by the hosting agent runtime for every
    /// lifecycle/tool/message/file fact.
    ///
    /// # Errors
    /// See [`EventStore::append_event`].
    pub fn append_event(&self, event: AgentEvent) -> Result<u64, StoreError> {
        self.store.append_event(event)
    }

    // --- query surface ---------------------------------------------------

    /// Page of runs, most recently started first.
    #[must_use]
    pub fn list_runs(&self, limit: usize, offset: usize) -> RunPage {
        self.store.list_runs(limit, offset)
    }

    /// One run's metadata.
    ///
    /// # Errors
    /// See [`EventStore::get_run`].
    pub fn get_run(&self, run_id: &str) -> Result<Run, StoreError> {
        self.store.get_run(run_id)
    }

    /// Filtered events for a run, optionally redacted.
    ///
    /// # Errors
    /// See [`EventStore::get_events`].
    pub fn get_events(
        &self,
        run_id: &str,
        filter: &EventFilter,
        redact: bool,
    ) -> Result<Vec<AgentEvent>, StoreError> {
        let mut events = self.store.get_events(run_id, filter)?;
        if redact {
            for event in &mut events {
                event.payload = self.redaction.redact(&event.payload);
            }
        }
        Ok(events)
    }

    /// Hierarchical task graph for a run, optionally redacted.
    ///
    /// Redaction happens on the event slice before the build, so node
    /// names, metadata, and tool arguments/results are covered uniformly.
    ///
    /// # Errors
    /// See [`EventStore::get_events`].
    pub fn get_task_graph(&self, run_id: &str, redact: bool) -> Result<TaskGraph, StoreError> {
        let events = self.get_events(run_id, &EventFilter::all(), redact)?;
        Ok(self.builder.build(run_id, &events))
    }

    /// Flat graph view for a run, optionally redacted.
    ///
    /// # Errors
    /// See [`EventStore::flat_task_graph`].
    pub fn get_flat_graph(&self, run_id: &str, redact: bool) -> Result<FlatTaskGraph, StoreError> {
        let mut graph = self.store.flat_task_graph(run_id)?;
        if redact {
            for node in &mut graph.nodes {
                node.label = self.redaction.redact_text(&node.label);
            }
        }
        Ok(graph)
    }

    /// Workspace snapshot, optionally with file contents redacted.
    #[must_use]
    pub fn workspace_snapshot(
        &self,
        session_id: Option<&str>,
        options: SnapshotOptions,
    ) -> WorkspaceSnapshot {
        let mut snapshot = self.tracker.snapshot(session_id);
        if options.redact_contents {
            for diff in &mut snapshot.diffs {
                diff.before = diff
                    .before
                    .as_deref()
                    .map(|text| self.redaction.redact_text(text));
                diff.after = self.redaction.redact_text(&diff.after);
                diff.unified = self.redaction.redact_text(&diff.unified);
            }
        }
        snapshot
    }

    /// Fetch one diff by id.
    ///
    /// # Errors
    /// See [`WorkspaceTracker::get_diff`].
    pub fn get_diff(&self, diff_id: &str) -> Result<flightdeck_workspace::FileDiff, TrackerError> {
        self.tracker.get_diff(diff_id)
    }

    /// Store health.
    #[must_use]
    pub fn health(&self) -> Health {
        self.store.health()
    }

    /// Consult the safety gate before a privileged action.
    #[must_use]
    pub fn check_action(&self, action: &str) -> GateDecision {
        self.safety.check(action)
    }

    /// Run retention maintenance: sweep expired diff documents.
    ///
    /// # Errors
    /// See [`WorkspaceTracker::sweep_old_diffs`].
    pub fn sweep(&self) -> Result<usize, TrackerError> {
        self.tracker.sweep_old_diffs()
    }
}
