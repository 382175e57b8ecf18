//! Error types for the reconciliation server.

use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur while handling a batch.
///
/// Note that per-record failures are not errors at this level: they become
/// `error` outcomes in the response. A `ServerError` rejects the request as
/// a whole.
#[derive(Error, Debug)]
pub enum ServerError {
    /// The batch size is outside the accepted bounds.
    #[error("batch of {len} records is outside {min}..={max}")]
    InvalidBatchSize {
        /// Number of records submitted.
        len: usize,
        /// Minimum accepted batch size.
        min: usize,
        /// Maximum accepted batch size.
        max: usize,
    },

    /// The caller's token did not resolve to an identity.
    #[error("unknown caller: {0}")]
    UnknownCaller(String),

    /// The storage collaborator failed.
    #[error("store error: {0}")]
    Store(String),
}
