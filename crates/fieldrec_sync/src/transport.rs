//! Transport seam between the orchestrator and the reconciliation endpoint.

use crate::error::{SyncError, SyncResult};
use fieldrec_protocol::{BatchSyncRequest, BatchSyncResponse, RecordOutcome};
use parking_lot::Mutex;
use std::collections::VecDeque;

/// Carries batch-sync requests to the reconciliation endpoint.
///
/// Implementations wrap whatever the platform provides (HTTP client,
/// in-process loopback for tests). The orchestrator treats the call as its
/// only suspension point.
pub trait SyncTransport: Send + Sync {
    /// Submits one batch and returns the per-record outcomes.
    fn submit_batch(&self, request: &BatchSyncRequest) -> SyncResult<BatchSyncResponse>;
}

/// What a [`MockTransport`] does with the next request.
#[derive(Debug, Clone)]
enum Scripted {
    /// Return this response.
    Respond(BatchSyncResponse),
    /// Fail with a retryable transport error.
    NetworkFailure,
}

/// A scriptable transport for tests.
///
/// With no script queued it acknowledges every submitted record as synced.
/// Every request is recorded for later inspection.
#[derive(Debug, Default)]
pub struct MockTransport {
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<BatchSyncRequest>>,
}

impl MockTransport {
    /// Creates a transport that acks everything it is given.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a scripted response for the next request.
    pub fn push_response(&self, response: BatchSyncResponse) {
        self.script.lock().push_back(Scripted::Respond(response));
    }

    /// Queues a retryable network failure for the next request.
    pub fn push_network_failure(&self) {
        self.script.lock().push_back(Scripted::NetworkFailure);
    }

    /// Returns every request submitted so far.
    pub fn requests(&self) -> Vec<BatchSyncRequest> {
        self.requests.lock().clone()
    }

    /// Number of requests submitted so far.
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

impl SyncTransport for MockTransport {
    fn submit_batch(&self, request: &BatchSyncRequest) -> SyncResult<BatchSyncResponse> {
        self.requests.lock().push(request.clone());

        match self.script.lock().pop_front() {
            Some(Scripted::Respond(response)) => Ok(response),
            Some(Scripted::NetworkFailure) => {
                Err(SyncError::transport_retryable("connection lost"))
            }
            None => Ok(BatchSyncResponse::new(
                request
                    .records
                    .iter()
                    .map(|record| RecordOutcome::synced(record.id))
                    .collect(),
            )),
        }
    }
}
