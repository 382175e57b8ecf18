//! Error types for the sync orchestrator.

use fieldrec_queue::QueueError;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during a sync cycle.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Network or transport failure.
    #[error("transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
        /// Whether a later cycle may succeed.
        retryable: bool,
    },

    /// The durable queue failed.
    #[error("queue error: {0}")]
    Queue(#[from] QueueError),

    /// The server response did not line up with the submitted batch.
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl SyncError {
    /// Creates a retryable transport error (connection lost, timeout).
    pub fn transport_retryable(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a non-retryable transport error.
    pub fn transport_fatal(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: false,
        }
    }

    /// Returns true if a later trigger may succeed where this one failed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, SyncError::Transport { retryable: true, .. })
    }
}
