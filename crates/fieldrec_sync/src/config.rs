//! Configuration for the sync orchestrator.

use fieldrec_protocol::MAX_BATCH_RECORDS;
use std::time::Duration;

/// Configuration for sync cycles.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Maximum records per submitted batch, clamped to the protocol bound.
    pub max_batch_size: usize,
    /// Consecutive network failures a record tolerates before it is
    /// surfaced as `Error`.
    pub network_retry_ceiling: u32,
    /// Suggested interval for the host's periodic timer trigger.
    pub sync_interval: Option<Duration>,
}

impl SyncConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_batch_size: MAX_BATCH_RECORDS,
            network_retry_ceiling: 5,
            sync_interval: None,
        }
    }

    /// Sets the batch size, clamped to `1..=100`.
    #[must_use]
    pub fn with_max_batch_size(mut self, size: usize) -> Self {
        self.max_batch_size = size.clamp(1, MAX_BATCH_RECORDS);
        self
    }

    /// Sets the network retry ceiling.
    #[must_use]
    pub fn with_network_retry_ceiling(mut self, ceiling: u32) -> Self {
        self.network_retry_ceiling = ceiling;
        self
    }

    /// Sets the suggested timer interval.
    #[must_use]
    pub fn with_sync_interval(mut self, interval: Duration) -> Self {
        self.sync_interval = Some(interval);
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.max_batch_size, 100);
        assert_eq!(config.network_retry_ceiling, 5);
        assert!(config.sync_interval.is_none());
    }

    #[test]
    fn batch_size_is_clamped() {
        assert_eq!(SyncConfig::new().with_max_batch_size(0).max_batch_size, 1);
        assert_eq!(
            SyncConfig::new().with_max_batch_size(500).max_batch_size,
            100
        );
        assert_eq!(SyncConfig::new().with_max_batch_size(25).max_batch_size, 25);
    }
}
