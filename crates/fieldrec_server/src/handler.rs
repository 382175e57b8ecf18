//! The batch reconciliation handler.

use crate::auth::CallerIdentity;
use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::store::RecordStore;
use fieldrec_protocol::{BatchSyncRequest, BatchSyncResponse, RecordOutcome, MIN_BATCH_RECORDS};
use std::sync::Arc;
use tracing::debug;

/// Handles batch-sync requests against a record store.
///
/// Reconciliation is idempotent per id and tolerant of partial failure:
/// every record is processed independently and gets its own outcome, in
/// request order. There is no cross-record transaction.
pub struct ReconciliationHandler {
    config: ServerConfig,
    store: Arc<dyn RecordStore>,
}

impl ReconciliationHandler {
    /// Creates a handler over the given store.
    pub fn new(config: ServerConfig, store: Arc<dyn RecordStore>) -> Self {
        Self { config, store }
    }

    /// Returns the store this handler reconciles into.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Reconciles a batch of records.
    ///
    /// The batch as a whole is only rejected for a size outside the
    /// configured bounds; everything else surfaces as per-record outcomes.
    pub fn handle_batch(&self, request: BatchSyncRequest) -> ServerResult<BatchSyncResponse> {
        self.check_batch_size(&request)?;
        debug!(records = request.records.len(), "reconciling batch");

        let outcomes = request
            .records
            .into_iter()
            .map(|record| self.reconcile(record))
            .collect();

        Ok(BatchSyncResponse::new(outcomes))
    }

    /// Reconciles a batch submitted by an authenticated caller.
    ///
    /// Records whose `doctor_id` does not match the caller are rejected
    /// individually; their siblings still reconcile.
    pub fn handle_batch_as(
        &self,
        caller: &CallerIdentity,
        request: BatchSyncRequest,
    ) -> ServerResult<BatchSyncResponse> {
        self.check_batch_size(&request)?;
        debug!(
            records = request.records.len(),
            doctor = %caller.doctor_id,
            "reconciling batch for caller"
        );

        let outcomes = request
            .records
            .into_iter()
            .map(|record| {
                if record.doctor_id != caller.doctor_id {
                    RecordOutcome::error(record.id, "doctor_id does not match caller")
                } else {
                    self.reconcile(record)
                }
            })
            .collect();

        Ok(BatchSyncResponse::new(outcomes))
    }

    fn check_batch_size(&self, request: &BatchSyncRequest) -> ServerResult<()> {
        let len = request.records.len();
        if !(MIN_BATCH_RECORDS..=self.config.max_batch_size).contains(&len) {
            return Err(ServerError::InvalidBatchSize {
                len,
                min: MIN_BATCH_RECORDS,
                max: self.config.max_batch_size,
            });
        }
        Ok(())
    }

    /// Reconciles one record: validate, then upsert under last-write-wins.
    fn reconcile(&self, record: fieldrec_model::Record) -> RecordOutcome {
        let id = record.id;

        if let Err(e) = record.validate() {
            debug!(id = %id, reason = %e, "record rejected");
            return RecordOutcome::error(id, e.to_string());
        }

        let existing = match self.store.get(&id) {
            Ok(existing) => existing,
            Err(e) => return RecordOutcome::error(id, e.to_string()),
        };

        match existing {
            // The server copy is as new or newer; the incoming write is
            // logically redundant, not an error.
            Some(stored) if stored.updated_at >= record.updated_at => {
                RecordOutcome::superseded(id)
            }
            _ => match self.store.upsert(record.into_server_copy()) {
                Ok(()) => RecordOutcome::synced(id),
                Err(e) => RecordOutcome::error(id, e.to_string()),
            },
        }
    }
}
