//! flightdeck-workspace - File operation tracking with diffs.
//!
//! Observes file reads/writes performed by agent-controlled code and
//! produces a navigable history with unified diffs, at zero cost when
//! disabled. Tracking is invisible on failure: any internal error is
//! caught, logged, and counted - never propagated to the operation being
//! tracked.
//!
//! Interception goes through an explicit indirection layer ([`FsHandle`])
//! that the host calls instead of raw file primitives; installing the
//! tracking implementation is idempotent and uninstalling restores the
//! original byte-identical behavior.

pub mod diff;
mod error;
mod fs_ops;
mod observability;
mod path_filter;
mod tracker;

pub use diff::unified_diff;
pub use error::TrackerError;
pub use fs_ops::{FileOps, FsHandle, RealFileOps};
pub use path_filter::is_denied;
pub use tracker::{
    FileDiff, FileOpKind, FileOperation, TrackerConfig, TrackerStats, WorkspaceSnapshot,
    WorkspaceTracker,
};
