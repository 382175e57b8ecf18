//! Error types for the durable queue.

use fieldrec_model::{InvalidTransition, RecordId, ValidationError};
use thiserror::Error;

/// Result type for queue operations.
pub type QueueResult<T> = Result<T, QueueError>;

/// Errors that can occur in the durable queue.
#[derive(Error, Debug)]
pub enum QueueError {
    /// Underlying file I/O failed.
    #[error("queue i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot encoding failed.
    #[error("snapshot encode failed: {0}")]
    Encode(String),

    /// Snapshot decoding failed.
    #[error("snapshot decode failed: {0}")]
    Decode(String),

    /// The persisted snapshot was written by a newer schema.
    #[error("unsupported snapshot version {found}, this build supports up to {supported}")]
    UnsupportedVersion {
        /// Version found on disk.
        found: u32,
        /// Highest version this build understands.
        supported: u32,
    },

    /// No record with the given id exists in the queue.
    #[error("unknown record id {0}")]
    UnknownRecord(RecordId),

    /// The requested status change is not a legal transition.
    #[error(transparent)]
    Transition(#[from] InvalidTransition),

    /// An edit or draft violated a field bound.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}
