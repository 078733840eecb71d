//! Workspace tracker: operation history, diff capture, retention.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::diff::unified_diff;
use crate::error::TrackerError;
use crate::observability::TrackerEvent;
use crate::path_filter;

/// Kind of a tracked file operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileOpKind {
    /// File content was read.
    Read,
    /// File content was written.
    Write,
}

/// One tracked read or write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileOperation {
    /// Operation id.
    pub id: String,
    /// Read or write.
    pub kind: FileOpKind,
    /// Absolute path of the touched file.
    pub path: String,
    /// When the operation was intercepted.
    pub ts: DateTime<Utc>,
    /// Session scope active at interception time.
    #[serde(default)]
    pub session_id: Option<String>,
    /// Content size in bytes.
    pub size_bytes: u64,
    /// Whether an associated diff exists.
    pub has_diff: bool,
}

/// Captured change for one write: full before/after plus the rendered
/// unified diff. Only created when a write changes existing decodable
/// text content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileDiff {
    /// Diff id (names the on-disk document).
    pub id: String,
    /// Owning file operation.
    pub operation_id: String,
    /// Absolute path of the changed file.
    pub path: String,
    /// Prior content; `None` means the file did not previously exist.
    pub before: Option<String>,
    /// New content.
    pub after: String,
    /// Rendered unified diff.
    pub unified: String,
    /// When the diff was captured.
    pub ts: DateTime<Utc>,
}

/// Tracker configuration.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Master switch; a disabled tracker records nothing and does no I/O.
    pub enabled: bool,
    /// Directory for persisted diff documents. `None` keeps diffs
    /// memory-only.
    pub data_dir: Option<PathBuf>,
    /// In-memory operation ring capacity (oldest evicted past this).
    pub max_operations: usize,
    /// Age in days past which persisted diffs are swept. 0 disables the
    /// sweep.
    pub diff_max_age_days: u64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            data_dir: None,
            max_operations: 10_000,
            diff_max_age_days: 30,
        }
    }
}

/// Counters observable when tracking failures are swallowed.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TrackerStats {
    /// Recorded read operations.
    pub reads: u64,
    /// Recorded write operations.
    pub writes: u64,
    /// Diffs captured.
    pub diffs: u64,
    /// Operations skipped by the path denylist.
    pub skipped: u64,
    /// Internal failures caught and swallowed.
    pub failures: u64,
}

/// Point-in-time view of tracked operations and their diffs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceSnapshot {
    /// Session filter the snapshot was taken with.
    #[serde(default)]
    pub session_id: Option<String>,
    /// Operations, oldest first.
    pub operations: Vec<FileOperation>,
    /// Diffs belonging to the included operations.
    pub diffs: Vec<FileDiff>,
}

struct TrackerState {
    ops: VecDeque<FileOperation>,
    diffs: HashMap<String, FileDiff>,
    /// Diff id per operation id, for snapshot joins and eviction.
    diff_by_op: HashMap<String, String>,
    session_id: Option<String>,
}

/// Observes file reads/writes and produces operation history with diffs.
///
/// Every tracking entry point swallows internal errors: tracking must
/// never be able to break the operation it observes.
pub struct WorkspaceTracker {
    config: TrackerConfig,
    enabled: AtomicBool,
    state: RwLock<TrackerState>,
    reads: AtomicU64,
    writes: AtomicU64,
    diffs_created: AtomicU64,
    skipped: AtomicU64,
    failures: AtomicU64,
}

impl WorkspaceTracker {
    /// Create a tracker.
    ///
    /// When a data dir is configured but cannot be prepared, the tracker
    /// logs the configuration error once and disables itself instead of
    /// failing on every operation.
    #[must_use]
    pub fn new(config: TrackerConfig) -> Self {
        let mut enabled = config.enabled;
        if enabled
            && let Some(dir) = diffs_dir(&config)
            && let Err(error) = std::fs::create_dir_all(&dir)
        {
            tracing::error!(
                event = TrackerEvent::TrackerDisabled.as_str(),
                dir = %dir.display(),
                %error,
                "diff directory is unusable; workspace tracking disabled"
            );
            enabled = false;
        }
        Self {
            config,
            enabled: AtomicBool::new(enabled),
            state: RwLock::new(TrackerState {
                ops: VecDeque::new(),
                diffs: HashMap::new(),
                diff_by_op: HashMap::new(),
                session_id: None,
            }),
            reads: AtomicU64::new(0),
            writes: AtomicU64::new(0),
            diffs_created: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        }
    }

    /// Whether tracking is active.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Scope subsequently recorded operations to a session.
    pub fn set_session(&self, session_id: Option<String>) {
        self.write_state().session_id = session_id;
    }

    fn read_state(&self) -> RwLockReadGuard<'_, TrackerState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, TrackerState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a file read. Never fails; never aborts the underlying
    /// operation.
    pub fn track_read(&self, path: &Path) {
        if !self.is_enabled() {
            return;
        }
        if path_filter::is_denied(path) {
            self.skipped.fetch_add(1, Ordering::Relaxed);
            return;
        }
        let absolute = absolute_path(path);
        let size_bytes = std::fs::metadata(&absolute).map(|meta| meta.len()).unwrap_or(0);
        self.record_operation(FileOpKind::Read, &absolute, size_bytes, false);
        self.reads.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a file write, capturing a diff when the new content differs
    /// from existing decodable text on disk. Never fails; never aborts
    /// the underlying operation.
    ///
    /// Outcomes:
    /// - file did not exist (or is binary): operation with `has_diff = false`
    /// - content identical: operation with `has_diff = false`
    /// - content changed: diff generated, persisted, `has_diff = true`
    pub fn track_write(&self, path: &Path, new_content: &str) {
        if !self.is_enabled() {
            return;
        }
        if path_filter::is_denied(path) {
            self.skipped.fetch_add(1, Ordering::Relaxed);
            return;
        }
        let absolute = absolute_path(path);
        let before = read_existing_text(&absolute);

        let changed = match before.as_deref() {
            None => false,
            Some(existing) => existing != new_content,
        };

        let operation_id = self.record_operation(
            FileOpKind::Write,
            &absolute,
            new_content.len() as u64,
            changed,
        );
        self.writes.fetch_add(1, Ordering::Relaxed);

        if !changed {
            return;
        }

        let path_str = absolute.to_string_lossy();
        let diff = FileDiff {
            id: uuid::Uuid::new_v4().to_string(),
            operation_id: operation_id.clone(),
            path: path_str.to_string(),
            before: before.clone(),
            after: new_content.to_string(),
            unified: unified_diff(before.as_deref(), new_content, &path_str),
            ts: Utc::now(),
        };

        if let Err(error) = self.persist_diff(&diff) {
            self.failures.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(
                event = TrackerEvent::TrackingFailed.as_str(),
                path = %path_str,
                %error,
                "diff persistence failed; diff kept in memory only"
            );
        }

        let mut state = self.write_state();
        state.diff_by_op.insert(operation_id, diff.id.clone());
        state.diffs.insert(diff.id.clone(), diff);
        drop(state);
        self.diffs_created.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(
            event = TrackerEvent::DiffCreated.as_str(),
            path = %path_str,
            "file diff captured"
        );
    }

    fn record_operation(
        &self,
        kind: FileOpKind,
        absolute: &Path,
        size_bytes: u64,
        has_diff: bool,
    ) -> String {
        let cap = self.config.max_operations.max(1);
        let mut state = self.write_state();
        let operation = FileOperation {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            path: absolute.to_string_lossy().to_string(),
            ts: Utc::now(),
            session_id: state.session_id.clone(),
            size_bytes,
            has_diff,
        };
        let operation_id = operation.id.clone();
        state.ops.push_back(operation);
        while state.ops.len() > cap {
            if let Some(evicted) = state.ops.pop_front()
                && let Some(diff_id) = state.diff_by_op.remove(&evicted.id)
            {
                // The on-disk document survives until the age sweep.
                state.diffs.remove(&diff_id);
            }
        }
        drop(state);
        tracing::debug!(
            event = TrackerEvent::OperationRecorded.as_str(),
            path = %absolute.display(),
            kind = ?kind,
            "file operation recorded"
        );
        operation_id
    }

    fn persist_diff(&self, diff: &FileDiff) -> Result<(), TrackerError> {
        let Some(dir) = diffs_dir(&self.config) else {
            return Ok(());
        };
        let content = serde_json::to_string_pretty(diff)?;
        std::fs::create_dir_all(&dir)?;
        std::fs::write(dir.join(format!("{}.json", diff.id)), content)?;
        Ok(())
    }

    /// All retained operations, oldest first.
    #[must_use]
    pub fn operations(&self) -> Vec<FileOperation> {
        self.read_state().ops.iter().cloned().collect()
    }

    /// Fetch a diff by id, from memory first, then the diffs directory.
    ///
    /// # Errors
    /// Returns [`TrackerError::DiffNotFound`] when the id is unknown.
    pub fn get_diff(&self, diff_id: &str) -> Result<FileDiff, TrackerError> {
        if let Some(diff) = self.read_state().diffs.get(diff_id) {
            return Ok(diff.clone());
        }
        if let Some(dir) = diffs_dir(&self.config) {
            let path = dir.join(format!("{diff_id}.json"));
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                return Ok(serde_json::from_str(&content)?);
            }
        }
        Err(TrackerError::DiffNotFound(diff_id.to_string()))
    }

    /// Snapshot of retained operations (optionally scoped to a session)
    /// joined with their in-memory diffs.
    #[must_use]
    pub fn snapshot(&self, session_id: Option<&str>) -> WorkspaceSnapshot {
        let state = self.read_state();
        let operations: Vec<FileOperation> = state
            .ops
            .iter()
            .filter(|op| match session_id {
                Some(wanted) => op.session_id.as_deref() == Some(wanted),
                None => true,
            })
            .cloned()
            .collect();
        let diffs = operations
            .iter()
            .filter_map(|op| state.diff_by_op.get(&op.id))
            .filter_map(|diff_id| state.diffs.get(diff_id))
            .cloned()
            .collect();
        drop(state);
        WorkspaceSnapshot {
            session_id: session_id.map(str::to_string),
            operations,
            diffs,
        }
    }

    /// Delete persisted diff documents older than the configured age.
    /// A zero max age disables the sweep. Returns the number deleted.
    ///
    /// # Errors
    /// Returns an I/O error when the diffs directory cannot be listed.
    pub fn sweep_old_diffs(&self) -> Result<usize, TrackerError> {
        if self.config.diff_max_age_days == 0 {
            return Ok(0);
        }
        let Some(dir) = diffs_dir(&self.config) else {
            return Ok(0);
        };
        if !dir.exists() {
            return Ok(0);
        }
        let max_age = std::time::Duration::from_secs(self.config.diff_max_age_days * 24 * 3600);
        let now = SystemTime::now();
        let mut deleted = 0usize;
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let Ok(modified) = entry.metadata().and_then(|meta| meta.modified()) else {
                continue;
            };
            let expired = now
                .duration_since(modified)
                .map(|age| age > max_age)
                .unwrap_or(false);
            if expired && std::fs::remove_file(&path).is_ok() {
                deleted += 1;
            }
        }
        if deleted > 0 {
            tracing::info!(
                event = TrackerEvent::DiffsSwept.as_str(),
                deleted,
                max_age_days = self.config.diff_max_age_days,
                "expired diff documents deleted"
            );
        }
        Ok(deleted)
    }

    /// Current counter snapshot.
    #[must_use]
    pub fn stats(&self) -> TrackerStats {
        TrackerStats {
            reads: self.reads.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            diffs: self.diffs_created.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

fn diffs_dir(config: &TrackerConfig) -> Option<PathBuf> {
    config.data_dir.as_ref().map(|dir| dir.join("diffs"))
}

fn absolute_path(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Existing on-disk content as text. `None` for a missing, unreadable, or
/// binary (non-UTF-8) file; all three fold into the no-prior-content case.
fn read_existing_text(path: &Path) -> Option<String> {
    let bytes = std::fs::read(path).ok()?;
    String::from_utf8(bytes).ok()
}
