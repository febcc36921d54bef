use std::io;
use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, SnapshotError>;

/// Errors surfaced by the snapshot engine.
///
/// None of these abort the pipeline: ingest failures drop the offending
/// event, view failures yield an empty view, and rollover failures forfeit
/// the inflight set for one window.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// I/O failure in the replay tooling or the logging setup.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// The buffer rejected an insert (e.g. the row cap was reached).
    #[error("ingest rejected: {0}")]
    Ingest(String),
    /// A derived view could not be produced.
    #[error("view failed: {0}")]
    View(String),
    /// The next window buffer could not be created or populated.
    #[error("rollover failed: {0}")]
    Rollover(String),
    /// Caller-supplied argument or configuration was invalid.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
