//! File-primitive indirection layer.
//!
//! The host program routes file primitives through an [`FsHandle`] slot
//! that defaults to the real implementation. Installing hooks swaps in a
//! tracking wrapper; uninstalling restores the captured original, so
//! behavior with hooks absent is byte-identical to never having installed
//! them. Both operations are idempotent.

use std::io;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use crate::observability::TrackerEvent;
use crate::tracker::WorkspaceTracker;

/// File primitives the host routes through the indirection slot.
pub trait FileOps: Send + Sync {
    /// Read a file as UTF-8 text.
    ///
    /// # Errors
    /// Propagates the underlying filesystem error.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Read a file as raw bytes.
    ///
    /// # Errors
    /// Propagates the underlying filesystem error.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Write a file, creating it if missing and truncating otherwise.
    ///
    /// # Errors
    /// Propagates the underlying filesystem error.
    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()>;
}

/// The real `std::fs` implementation.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFileOps;

impl FileOps for RealFileOps {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        std::fs::write(path, contents)
    }
}

/// Tracking wrapper: records through the tracker, delegates all real I/O
/// unchanged to the captured implementation.
struct TrackingFileOps {
    real: Arc<dyn FileOps>,
    tracker: Arc<WorkspaceTracker>,
}

impl FileOps for TrackingFileOps {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let result = self.real.read_to_string(path);
        self.tracker.track_read(path);
        result
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        let result = self.real.read(path);
        self.tracker.track_read(path);
        result
    }

    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        // Capture happens before the real write so the prior on-disk
        // content is still available for the diff.
        if let Ok(text) = std::str::from_utf8(contents) {
            self.tracker.track_write(path, text);
        }
        self.real.write(path, contents)
    }
}

struct Slot {
    current: Arc<dyn FileOps>,
    original: Arc<dyn FileOps>,
    installed: bool,
}

/// Shared handle to the file-primitive slot.
#[derive(Clone)]
pub struct FsHandle {
    slot: Arc<RwLock<Slot>>,
}

impl Default for FsHandle {
    fn default() -> Self {
        Self::real()
    }
}

impl FsHandle {
    /// Handle backed by the real filesystem.
    #[must_use]
    pub fn real() -> Self {
        Self::with_ops(Arc::new(RealFileOps))
    }

    /// Handle backed by a custom implementation (tests, sandboxes).
    #[must_use]
    pub fn with_ops(ops: Arc<dyn FileOps>) -> Self {
        Self {
            slot: Arc::new(RwLock::new(Slot {
                current: Arc::clone(&ops),
                original: ops,
                installed: false,
            })),
        }
    }

    fn lock(&self) -> std::sync::RwLockWriteGuard<'_, Slot> {
        self.slot.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn peek(&self) -> std::sync::RwLockReadGuard<'_, Slot> {
        self.slot.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Swap in the tracking implementation. Installing twice has no
    /// additional effect.
    pub fn install_hooks(&self, tracker: Arc<WorkspaceTracker>) {
        let mut slot = self.lock();
        if slot.installed {
            return;
        }
        slot.current = Arc::new(TrackingFileOps {
            real: Arc::clone(&slot.original),
            tracker,
        });
        slot.installed = true;
        drop(slot);
        tracing::info!(
            event = TrackerEvent::HooksInstalled.as_str(),
            "file hooks installed"
        );
    }

    /// Restore the original implementation. Safe to call when hooks were
    /// never installed.
    pub fn uninstall_hooks(&self) {
        let mut slot = self.lock();
        if !slot.installed {
            return;
        }
        slot.current = Arc::clone(&slot.original);
        slot.installed = false;
        drop(slot);
        tracing::info!(
            event = TrackerEvent::HooksUninstalled.as_str(),
            "file hooks uninstalled"
        );
    }

    /// Whether the tracking implementation is currently installed.
    #[must_use]
    pub fn hooks_installed(&self) -> bool {
        self.peek().installed
    }

    /// Current implementation (tracking or original).
    #[must_use]
    pub fn current(&self) -> Arc<dyn FileOps> {
        Arc::clone(&self.peek().current)
    }

    /// Read a file as UTF-8 text through the slot.
    ///
    /// # Errors
    /// Propagates the underlying filesystem error.
    pub fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.current().read_to_string(path)
    }

    /// Read a file as raw bytes through the slot.
    ///
    /// # Errors
    /// Propagates the underlying filesystem error.
    pub fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.current().read(path)
    }

    /// Write a file through the slot.
    ///
    /// # Errors
    /// Propagates the underlying filesystem error.
    pub fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        self.current().write(path, contents)
    }
}
