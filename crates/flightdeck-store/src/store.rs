//! In-memory run/event state with scheduled persistence.

use std::collections::{HashMap, VecDeque};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use flightdeck_types::{AgentEvent, EventFilter, Run, RunPatch};

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::flat_graph::{self, FlatTaskGraph};
use crate::observability::StoreEvent;
use crate::persistence;

/// Health status reported by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// Retained event volume is within the safety ceiling.
    Healthy,
    /// Retained event volume exceeds the safety ceiling.
    Degraded,
}

/// Health snapshot. This check never reports worse than degraded.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Health {
    /// Current status.
    pub status: HealthStatus,
    /// Total retained events across all runs.
    pub retained_events: usize,
    /// Safety ceiling (`max_events_per_run × max_runs_in_memory`).
    pub ceiling: usize,
}

/// One page of runs, most recently started first.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RunPage {
    /// Runs in this page.
    pub runs: Vec<Run>,
    /// Total number of known runs.
    pub total: usize,
}

struct RunSlot {
    run: Run,
    ring: VecDeque<AgentEvent>,
    next_seq: u64,
    /// Events appended since the last successful flush.
    pending: Vec<AgentEvent>,
    /// Whether the on-disk event log has been replayed into the ring.
    hydrated: bool,
}

impl RunSlot {
    fn fresh(run: Run) -> Self {
        Self {
            run,
            ring: VecDeque::new(),
            next_seq: 0,
            pending: Vec::new(),
            hydrated: true,
        }
    }

    fn restored(run: Run) -> Self {
        Self {
            run,
            ring: VecDeque::new(),
            next_seq: 0,
            pending: Vec::new(),
            hydrated: false,
        }
    }
}

#[derive(Default)]
struct StoreState {
    runs: HashMap<String, RunSlot>,
    meta_dirty: bool,
}

/// Append-only event store with bounded per-run retention.
///
/// All mutations apply to the in-memory representation immediately;
/// persistence happens on the flush timer (or forced on run creation).
pub struct EventStore {
    state: RwLock<StoreState>,
    config: StoreConfig,
}

impl EventStore {
    /// Create a store with the given configuration.
    #[must_use]
    pub fn new(config: StoreConfig) -> Self {
        Self {
            state: RwLock::new(StoreState::default()),
            config,
        }
    }

    /// Store configuration.
    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn read_state(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Restore run metadata from disk. Event logs are hydrated lazily on
    /// the first query touching each run.
    ///
    /// # Errors
    /// Returns a persistence/encoding error when `runs.json` exists but
    /// cannot be read or decoded.
    pub fn load(&self) -> Result<usize, StoreError> {
        let Some(ref data_dir) = self.config.data_dir else {
            return Ok(0);
        };
        let Some(document) = persistence::read_runs_document(data_dir)? else {
            return Ok(0);
        };
        let mut state = self.write_state();
        let mut restored = 0;
        for run in document.runs {
            if state.runs.contains_key(&run.id) {
                continue;
            }
            let id = run.id.clone();
            state.runs.insert(id, RunSlot::restored(run));
            restored += 1;
        }
        drop(state);
        tracing::info!(
            event = StoreEvent::StoreLoaded.as_str(),
            restored_runs = restored,
            "run metadata restored from disk"
        );
        Ok(restored)
    }

    /// Register a new run.
    ///
    /// Forces an immediate metadata flush when persistence is configured;
    /// a failed forced flush is logged and retried on the next tick rather
    /// than failing the registration.
    ///
    /// # Errors
    /// Returns [`StoreError::DuplicateRun`] when the id is already known.
    pub fn create_run(&self, run: Run) -> Result<(), StoreError> {
        let run_id = run.id.clone();
        {
            let mut state = self.write_state();
            if state.runs.contains_key(&run_id) {
                return Err(StoreError::DuplicateRun(run_id));
            }
            state.runs.insert(run_id.clone(), RunSlot::fresh(run));
            state.meta_dirty = true;
        }
        tracing::debug!(
            event = StoreEvent::RunCreated.as_str(),
            run_id = %run_id,
            "run registered"
        );
        if self.config.data_dir.is_some()
            && let Err(error) = self.flush()
        {
            tracing::warn!(
                event = StoreEvent::FlushFailed.as_str(),
                run_id = %run_id,
                %error,
                "forced flush on run creation failed; will retry on schedule"
            );
        }
        Ok(())
    }

    /// Merge a partial update into an existing run.
    ///
    /// # Errors
    /// Returns [`StoreError::RunNotFound`] when the run is absent.
    pub fn update_run(&self, run_id: &str, patch: RunPatch) -> Result<Run, StoreError> {
        let mut state = self.write_state();
        let slot = state
            .runs
            .get_mut(run_id)
            .ok_or_else(|| StoreError::RunNotFound(run_id.to_string()))?;
        if let Some(status) = patch.status {
            slot.run.status = status;
        }
        if let Some(ended_at) = patch.ended_at {
            slot.run.ended_at = Some(ended_at);
        }
        if let Some(prompt) = patch.prompt {
            slot.run.prompt = Some(prompt);
        }
        if let Some(root_agent_id) = patch.root_agent_id {
            slot.run.root_agent_id = Some(root_agent_id);
        }
        if let Some(error) = patch.error {
            slot.run.error = Some(error);
        }
        let updated = slot.run.clone();
        state.meta_dirty = true;
        drop(state);
        tracing::debug!(
            event = StoreEvent::RunUpdated.as_str(),
            run_id,
            status = %updated.status,
            "run updated"
        );
        Ok(updated)
    }

    /// Append an event to its run, assigning the next sequence number.
    ///
    /// Past `max_events_per_run` the oldest retained events are evicted
    /// FIFO; `event_count` tracks the retained count, not the lifetime
    /// total. Returns the assigned sequence number.
    ///
    /// # Errors
    /// Returns [`StoreError::RunNotFound`] when the run was never created.
    pub fn append_event(&self, mut event: AgentEvent) -> Result<u64, StoreError> {
        let cap = self.config.max_events_per_run;
        let mut state = self.write_state();
        let run_id = event.run_id.clone();
        let slot = state
            .runs
            .get_mut(&run_id)
            .ok_or_else(|| StoreError::RunNotFound(run_id.clone()))?;
        Self::hydrate_slot(&self.config, &run_id, slot);

        let seq = slot.next_seq;
        event.seq = seq;
        slot.next_seq += 1;
        slot.ring.push_back(event.clone());
        slot.pending.push(event);

        let mut evicted = 0usize;
        while slot.ring.len() > cap {
            let _ = slot.ring.pop_front();
            evicted += 1;
        }
        slot.run.event_count = slot.ring.len();
        state.meta_dirty = true;
        drop(state);

        if evicted > 0 {
            tracing::debug!(
                event = StoreEvent::EventsEvicted.as_str(),
                run_id = %run_id,
                evicted,
                cap,
                "oldest events evicted past retention cap"
            );
        }
        Ok(seq)
    }

    /// Fetch one run's metadata.
    ///
    /// # Errors
    /// Returns [`StoreError::RunNotFound`] when the run is absent.
    pub fn get_run(&self, run_id: &str) -> Result<Run, StoreError> {
        let state = self.read_state();
        state
            .runs
            .get(run_id)
            .map(|slot| slot.run.clone())
            .ok_or_else(|| StoreError::RunNotFound(run_id.to_string()))
    }

    /// Retained events of a run satisfying every filter predicate.
    ///
    /// # Errors
    /// Returns [`StoreError::Validation`] for malformed filters and
    /// [`StoreError::RunNotFound`] when the run is absent.
    pub fn get_events(
        &self,
        run_id: &str,
        filter: &EventFilter,
    ) -> Result<Vec<AgentEvent>, StoreError> {
        filter.validate()?;
        let mut state = self.write_state();
        let slot = state
            .runs
            .get_mut(run_id)
            .ok_or_else(|| StoreError::RunNotFound(run_id.to_string()))?;
        Self::hydrate_slot(&self.config, run_id, slot);
        Ok(slot
            .ring
            .iter()
            .filter(|event| filter.matches(event))
            .cloned()
            .collect())
    }

    /// Lightweight flat graph view of a run's retained events.
    ///
    /// # Errors
    /// Returns [`StoreError::RunNotFound`] when the run is absent.
    pub fn flat_task_graph(&self, run_id: &str) -> Result<FlatTaskGraph, StoreError> {
        let mut state = self.write_state();
        let slot = state
            .runs
            .get_mut(run_id)
            .ok_or_else(|| StoreError::RunNotFound(run_id.to_string()))?;
        Self::hydrate_slot(&self.config, run_id, slot);
        let events: Vec<AgentEvent> = slot.ring.iter().cloned().collect();
        drop(state);
        Ok(flat_graph::derive(run_id, &events))
    }

    /// Page of runs ordered most recently started first, plus total count.
    #[must_use]
    pub fn list_runs(&self, limit: usize, offset: usize) -> RunPage {
        let state = self.read_state();
        let mut runs: Vec<Run> = state.runs.values().map(|slot| slot.run.clone()).collect();
        drop(state);
        runs.sort_by(|a, b| b.started_at.cmp(&a.started_at).then(a.id.cmp(&b.id)));
        let total = runs.len();
        let page = runs.into_iter().skip(offset).take(limit).collect();
        RunPage { runs: page, total }
    }

    /// Health snapshot from retained event volume.
    #[must_use]
    pub fn health(&self) -> Health {
        let state = self.read_state();
        let retained_events: usize = state.runs.values().map(|slot| slot.ring.len()).sum();
        drop(state);
        let ceiling = self.config.event_ceiling();
        let status = if retained_events > ceiling {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };
        Health {
            status,
            retained_events,
            ceiling,
        }
    }

    /// Persist dirty state: the run-metadata document and per-run pending
    /// event log lines. Failed writes re-mark their state dirty so the
    /// next scheduled flush retries them.
    ///
    /// # Errors
    /// Returns the first persistence error encountered (all writes are
    /// still attempted).
    pub fn flush(&self) -> Result<(), StoreError> {
        let Some(data_dir) = self.config.data_dir.clone() else {
            return Ok(());
        };

        let (runs_snapshot, drained) = {
            let mut state = self.write_state();
            let runs_snapshot = if state.meta_dirty {
                state.meta_dirty = false;
                Some(state.runs.values().map(|slot| slot.run.clone()).collect::<Vec<_>>())
            } else {
                None
            };
            let mut drained: Vec<(String, Vec<AgentEvent>)> = Vec::new();
            for (run_id, slot) in &mut state.runs {
                if !slot.pending.is_empty() {
                    drained.push((run_id.clone(), std::mem::take(&mut slot.pending)));
                }
            }
            (runs_snapshot, drained)
        };

        if runs_snapshot.is_none() && drained.is_empty() {
            return Ok(());
        }

        let mut first_error: Option<StoreError> = None;
        let mut flushed_runs = 0usize;
        let mut flushed_events = 0usize;

        if let Some(runs) = runs_snapshot {
            flushed_runs = runs.len();
            if let Err(error) = persistence::write_runs_document(&data_dir, runs) {
                self.write_state().meta_dirty = true;
                first_error.get_or_insert(error);
            }
        }

        for (run_id, events) in drained {
            flushed_events += events.len();
            if let Err(error) = persistence::append_event_log(&data_dir, &run_id, &events) {
                // Put the unwritten events back in front of anything that
                // arrived meanwhile, preserving log order.
                let mut state = self.write_state();
                if let Some(slot) = state.runs.get_mut(&run_id) {
                    let mut restored = events;
                    restored.append(&mut slot.pending);
                    slot.pending = restored;
                }
                drop(state);
                first_error.get_or_insert(error);
            }
        }

        match first_error {
            Some(error) => {
                tracing::warn!(
                    event = StoreEvent::FlushFailed.as_str(),
                    %error,
                    "flush failed; dirty state kept for retry"
                );
                Err(error)
            }
            None => {
                tracing::debug!(
                    event = StoreEvent::FlushSucceeded.as_str(),
                    flushed_runs,
                    flushed_events,
                    "state flushed"
                );
                Ok(())
            }
        }
    }

    fn hydrate_slot(config: &StoreConfig, run_id: &str, slot: &mut RunSlot) {
        if slot.hydrated {
            return;
        }
        slot.hydrated = true;
        let Some(ref data_dir) = config.data_dir else {
            return;
        };
        match persistence::read_event_log(data_dir, run_id, config.max_events_per_run) {
            Ok(events) => {
                let replayed = events.len();
                slot.next_seq = events.iter().map(|event| event.seq + 1).max().unwrap_or(0);
                slot.ring = events.into();
                slot.run.event_count = slot.ring.len();
                if replayed > 0 {
                    tracing::debug!(
                        event = StoreEvent::EventLogHydrated.as_str(),
                        run_id,
                        replayed,
                        "event log replayed from disk"
                    );
                }
            }
            Err(error) => {
                tracing::warn!(
                    event = StoreEvent::FlushFailed.as_str(),
                    run_id,
                    %error,
                    "event log hydration failed; continuing with empty ring"
                );
            }
        }
    }
}
