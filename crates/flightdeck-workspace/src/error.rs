//! Error types for workspace tracking.

use thiserror::Error;

/// Error types for tracker operations.
///
/// Tracking-path failures are swallowed at the interception boundary and
/// surface only through logs and stats counters; these variants reach
/// callers solely on the query path (diff lookup, retention sweep).
#[derive(Debug, Error)]
pub enum TrackerError {
    /// The referenced diff does not exist in memory or on disk.
    #[error("diff not found: {0}")]
    DiffNotFound(String),

    /// Underlying filesystem failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Persisted diff document could not be encoded or decoded.
    #[error("encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}
