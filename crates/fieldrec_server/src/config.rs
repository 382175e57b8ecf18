//! Server configuration.

use fieldrec_protocol::MAX_BATCH_RECORDS;

/// Configuration for the reconciliation endpoint.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Maximum number of records accepted per batch.
    pub max_batch_size: usize,
}

impl ServerConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_batch_size: MAX_BATCH_RECORDS,
        }
    }

    /// Sets the maximum batch size, clamped to the protocol bound.
    #[must_use]
    pub fn with_max_batch_size(mut self, size: usize) -> Self {
        self.max_batch_size = size.min(MAX_BATCH_RECORDS);
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new()
    }
}
