//! Error types for the event store.

use thiserror::Error;

/// Error types for store operations.
///
/// Query-path errors (`RunNotFound`, `Validation`) are returned to the
/// caller for translation into a user-facing response; persistence errors
/// surface only from explicit flush/load calls and are otherwise retried
/// by the flush timer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A run with this id is already registered.
    #[error("duplicate run: {0}")]
    DuplicateRun(String),

    /// The referenced run does not exist.
    #[error("run not found: {0}")]
    RunNotFound(String),

    /// Malformed filter/query parameters.
    #[error("invalid query: {0}")]
    Validation(#[from] flightdeck_types::FilterError),

    /// Flush-to-disk or log-read failure.
    #[error("persistence error: {0}")]
    Persistence(#[from] std::io::Error),

    /// Persisted document could not be encoded or decoded.
    #[error("encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}
