//! Batch-sync request and response messages.

use fieldrec_model::{AckOutcome, Record, RecordId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum number of records in one batch.
pub const MAX_BATCH_RECORDS: usize = 100;
/// Minimum number of records in one batch.
pub const MIN_BATCH_RECORDS: usize = 1;

/// A batch size outside `1..=100`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("batch of {len} records is outside {MIN_BATCH_RECORDS}..={MAX_BATCH_RECORDS}")]
pub struct BatchSizeError {
    /// Number of records in the rejected batch.
    pub len: usize,
}

/// A client-submitted batch of records to reconcile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSyncRequest {
    /// Records to reconcile, each with its client-assigned id.
    pub records: Vec<Record>,
}

impl BatchSyncRequest {
    /// Creates a batch request.
    #[must_use]
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    /// Checks the batch size bound.
    pub fn check_size(&self) -> Result<(), BatchSizeError> {
        let len = self.records.len();
        if !(MIN_BATCH_RECORDS..=MAX_BATCH_RECORDS).contains(&len) {
            return Err(BatchSizeError { len });
        }
        Ok(())
    }
}

/// Per-record outcome status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    /// The record is durably stored on the server.
    Synced,
    /// The record was rejected; see the reason.
    Error,
}

/// The server's acknowledgment for a single record.
///
/// Responses carry one outcome per submitted record, aligned 1:1 with the
/// request order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordOutcome {
    /// The client-assigned record id being acknowledged.
    pub id: RecordId,
    /// Outcome status.
    pub status: OutcomeStatus,
    /// Failure reason, or a marker for redundant writes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl RecordOutcome {
    /// The server stored the submitted version.
    #[must_use]
    pub fn synced(id: RecordId) -> Self {
        Self {
            id,
            status: OutcomeStatus::Synced,
            reason: None,
        }
    }

    /// The server already held an equal-or-newer copy; the write was
    /// logically redundant, not an error.
    #[must_use]
    pub fn superseded(id: RecordId) -> Self {
        Self {
            id,
            status: OutcomeStatus::Synced,
            reason: Some("superseded".into()),
        }
    }

    /// The record was rejected.
    #[must_use]
    pub fn error(id: RecordId, reason: impl Into<String>) -> Self {
        Self {
            id,
            status: OutcomeStatus::Error,
            reason: Some(reason.into()),
        }
    }

    /// Returns true if the outcome acknowledges durable storage.
    #[must_use]
    pub fn is_synced(&self) -> bool {
        self.status == OutcomeStatus::Synced
    }

    /// Converts into the typed acknowledgment the queue applies.
    #[must_use]
    pub fn to_ack(&self) -> AckOutcome {
        match self.status {
            OutcomeStatus::Synced if self.reason.as_deref() == Some("superseded") => {
                AckOutcome::Superseded
            }
            OutcomeStatus::Synced => AckOutcome::Synced,
            OutcomeStatus::Error => AckOutcome::Error(
                self.reason
                    .clone()
                    .unwrap_or_else(|| "rejected by server".into()),
            ),
        }
    }
}

/// The server's response to a batch-sync request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSyncResponse {
    /// One outcome per submitted record, in request order.
    pub outcomes: Vec<RecordOutcome>,
}

impl BatchSyncResponse {
    /// Creates a response.
    #[must_use]
    pub fn new(outcomes: Vec<RecordOutcome>) -> Self {
        Self { outcomes }
    }
}
