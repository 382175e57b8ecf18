//! The sync orchestrator.

use crate::config::SyncConfig;
use crate::connectivity::ConnectivitySignal;
use crate::error::{SyncError, SyncResult};
use crate::transport::SyncTransport;
use fieldrec_model::{time, AckOutcome, Record, RecordId, SyncStatus};
use fieldrec_protocol::BatchSyncRequest;
use fieldrec_queue::{QueueStore, RecordQueue};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// What caused a sync cycle to start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncTrigger {
    /// The connectivity signal flipped to online.
    ConnectivityRegained,
    /// The host's periodic timer fired.
    Timer,
    /// An explicit user or application request.
    Manual,
}

/// The result of handling a trigger.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// A cycle ran; see the report.
    Completed(SyncCycleReport),
    /// The device is offline; nothing was done.
    Offline,
    /// A cycle was already in flight; the trigger was dropped.
    AlreadyRunning,
}

impl CycleOutcome {
    /// Returns the report if a cycle actually ran.
    #[must_use]
    pub fn report(&self) -> Option<&SyncCycleReport> {
        match self {
            CycleOutcome::Completed(report) => Some(report),
            _ => None,
        }
    }
}

/// What one sync cycle did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncCycleReport {
    /// Records submitted to the endpoint.
    pub submitted: usize,
    /// Records acknowledged as stored.
    pub synced: usize,
    /// Records acknowledged as redundant (server copy newer or equal).
    pub superseded: usize,
    /// Records that ended the cycle in `Error`.
    pub errored: usize,
    /// Batches that received a response.
    pub batches: usize,
    /// Whether the cycle terminated on a network failure.
    pub network_failure: bool,
    /// Wall-clock duration of the cycle.
    pub duration: Duration,
}

/// Cumulative statistics across cycles.
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    /// Cycles that ran to their end (with or without a network failure).
    pub cycles_completed: u64,
    /// Total records acknowledged as stored.
    pub records_synced: u64,
    /// Total records acknowledged as redundant.
    pub records_superseded: u64,
    /// Total records surfaced as `Error`.
    pub records_errored: u64,
    /// Cycles terminated by a network failure.
    pub network_failures: u64,
    /// Triggers dropped because a cycle was in flight.
    pub triggers_coalesced: u64,
    /// Last failure message, if any.
    pub last_error: Option<String>,
}

/// Drives records from the durable queue to the reconciliation endpoint.
///
/// The orchestrator never creates or edits records itself; it only advances
/// their state machines from server acknowledgments. It is constructed at
/// the application root with an explicit queue instance; there is no
/// ambient singleton.
pub struct SyncOrchestrator<S: QueueStore, T: SyncTransport, C: ConnectivitySignal> {
    config: SyncConfig,
    queue: Arc<RecordQueue<S>>,
    transport: T,
    connectivity: C,
    in_flight: AtomicBool,
    network_attempts: Mutex<HashMap<RecordId, u32>>,
    stats: RwLock<SyncStats>,
}

/// Clears the in-flight flag when the cycle ends, however it ends.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl<S: QueueStore, T: SyncTransport, C: ConnectivitySignal> SyncOrchestrator<S, T, C> {
    /// Creates an orchestrator over an explicit queue instance.
    pub fn new(
        config: SyncConfig,
        queue: Arc<RecordQueue<S>>,
        transport: T,
        connectivity: C,
    ) -> Self {
        Self {
            config,
            queue,
            transport,
            connectivity,
            in_flight: AtomicBool::new(false),
            network_attempts: Mutex::new(HashMap::new()),
            stats: RwLock::new(SyncStats::default()),
        }
    }

    /// Returns the queue this orchestrator drains.
    #[must_use]
    pub fn queue(&self) -> &Arc<RecordQueue<S>> {
        &self.queue
    }

    /// Returns the transport.
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Returns the connectivity signal.
    #[must_use]
    pub fn connectivity(&self) -> &C {
        &self.connectivity
    }

    /// Returns cumulative statistics.
    pub fn stats(&self) -> SyncStats {
        self.stats.read().clone()
    }

    /// Returns true if a cycle is currently in flight.
    pub fn is_syncing(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Moves an errored record back to `Pending` and clears its network
    /// attempt count, so the next cycle picks it up again.
    pub fn retry_record(&self, id: &RecordId) -> SyncResult<Record> {
        self.network_attempts.lock().remove(id);
        Ok(self.queue.retry(id, time::now_ms())?)
    }

    /// Handles a trigger, running at most one sync cycle.
    ///
    /// A trigger that arrives while a cycle is in flight is dropped (the
    /// running cycle's queue snapshot already covers its records, and the
    /// next trigger covers anything enqueued since). A cycle terminated by
    /// a retryable network failure still reports `Completed`, with
    /// [`SyncCycleReport::network_failure`] set; unacknowledged records
    /// stay `Pending`.
    pub fn trigger(&self, trigger: SyncTrigger) -> SyncResult<CycleOutcome> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!(?trigger, "trigger coalesced, cycle already in flight");
            self.stats.write().triggers_coalesced += 1;
            return Ok(CycleOutcome::AlreadyRunning);
        }
        let _guard = InFlightGuard(&self.in_flight);

        if !self.connectivity.is_online() {
            debug!(?trigger, "offline, skipping cycle");
            return Ok(CycleOutcome::Offline);
        }

        let report = self.run_cycle(trigger)?;
        Ok(CycleOutcome::Completed(report))
    }

    fn run_cycle(&self, trigger: SyncTrigger) -> SyncResult<SyncCycleReport> {
        let start = Instant::now();
        let mut report = SyncCycleReport::default();

        // Error records wait for an explicit retry or edit; resubmitting
        // unchanged invalid data cannot succeed.
        let pending: Vec<Record> = self
            .queue
            .drain_pending()
            .into_iter()
            .filter(|r| r.sync_status == SyncStatus::Pending)
            .collect();

        debug!(?trigger, pending = pending.len(), "sync cycle started");

        for chunk in pending.chunks(self.config.max_batch_size) {
            let request = BatchSyncRequest::new(chunk.to_vec());

            match self.transport.submit_batch(&request) {
                Ok(response) => {
                    report.submitted += chunk.len();
                    report.batches += 1;
                    self.apply_response(chunk, &response.outcomes, &mut report)?;
                }
                Err(e) if e.is_retryable() => {
                    warn!(error = %e, "batch failed, cycle terminated");
                    self.record_network_failure(chunk, &mut report)?;
                    report.network_failure = true;
                    self.stats.write().last_error = Some(e.to_string());
                    break;
                }
                Err(e) => {
                    self.stats.write().last_error = Some(e.to_string());
                    return Err(e);
                }
            }
        }

        report.duration = start.elapsed();

        let mut stats = self.stats.write();
        stats.cycles_completed += 1;
        stats.records_synced += report.synced as u64;
        stats.records_superseded += report.superseded as u64;
        stats.records_errored += report.errored as u64;
        if report.network_failure {
            stats.network_failures += 1;
        } else {
            stats.last_error = None;
        }
        drop(stats);

        info!(
            submitted = report.submitted,
            synced = report.synced,
            errored = report.errored,
            network_failure = report.network_failure,
            "sync cycle finished"
        );
        Ok(report)
    }

    /// Applies one batch's acknowledgments back into the queue.
    fn apply_response(
        &self,
        submitted: &[Record],
        outcomes: &[fieldrec_protocol::RecordOutcome],
        report: &mut SyncCycleReport,
    ) -> SyncResult<()> {
        if outcomes.len() != submitted.len() {
            return Err(SyncError::Protocol(format!(
                "response has {} outcomes for {} submitted records",
                outcomes.len(),
                submitted.len()
            )));
        }

        let now = time::now_ms();
        let mut attempts = self.network_attempts.lock();

        for (record, outcome) in submitted.iter().zip(outcomes) {
            if outcome.id != record.id {
                return Err(SyncError::Protocol(format!(
                    "outcome for {} does not match submitted record {}",
                    outcome.id, record.id
                )));
            }

            let ack = outcome.to_ack();
            self.queue.apply_outcome(&record.id, &ack, now)?;
            // The server responded, so the network slate is clean either way.
            attempts.remove(&record.id);

            match ack {
                AckOutcome::Synced => report.synced += 1,
                AckOutcome::Superseded => report.superseded += 1,
                AckOutcome::Error(_) => report.errored += 1,
            }
        }
        Ok(())
    }

    /// Bumps attempt counts for an unacknowledged batch; records that hit
    /// the ceiling are surfaced as `Error`, the rest stay `Pending`.
    fn record_network_failure(
        &self,
        submitted: &[Record],
        report: &mut SyncCycleReport,
    ) -> SyncResult<()> {
        let now = time::now_ms();
        let mut attempts = self.network_attempts.lock();

        for record in submitted {
            let count = attempts.entry(record.id).or_insert(0);
            *count += 1;

            if *count >= self.config.network_retry_ceiling {
                warn!(id = %record.id, attempts = *count, "network retry ceiling exceeded");
                self.queue.apply_outcome(
                    &record.id,
                    &AckOutcome::Error("network retry ceiling exceeded".into()),
                    now,
                )?;
                attempts.remove(&record.id);
                report.errored += 1;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectivity::StaticConnectivity;
    use crate::transport::MockTransport;
    use fieldrec_model::{RecordDraft, Severity, Symptom};
    use fieldrec_protocol::{BatchSyncResponse, RecordOutcome};
    use fieldrec_queue::MemoryQueueStore;
    use std::sync::mpsc;
    use std::thread;

    fn draft(name: &str) -> RecordDraft {
        RecordDraft {
            patient_id: "patient-1".into(),
            doctor_id: "doctor-1".into(),
            patient_name: name.into(),
            age: 34,
            diagnosis: "Malaria".into(),
            symptoms: vec![Symptom::new("fever", Severity::Moderate, "3 days")],
            description: None,
            date: 1_700_000_000_000,
            location: None,
            images: vec![],
            audio_notes: None,
            is_offline: true,
        }
    }

    fn queue() -> Arc<RecordQueue<MemoryQueueStore>> {
        Arc::new(RecordQueue::open(MemoryQueueStore::new()).unwrap())
    }

    fn orchestrator(
        config: SyncConfig,
        queue: Arc<RecordQueue<MemoryQueueStore>>,
        online: bool,
    ) -> SyncOrchestrator<MemoryQueueStore, MockTransport, StaticConnectivity> {
        SyncOrchestrator::new(
            config,
            queue,
            MockTransport::new(),
            StaticConnectivity::new(online),
        )
    }

    #[test]
    fn offline_is_a_noop() {
        let queue = queue();
        queue.create(draft("A"), 1).unwrap();
        let orchestrator = orchestrator(SyncConfig::default(), queue.clone(), false);

        let outcome = orchestrator.trigger(SyncTrigger::Timer).unwrap();
        assert_eq!(outcome, CycleOutcome::Offline);
        assert_eq!(orchestrator.transport().request_count(), 0);
        assert_eq!(queue.pending_count(), 1);
    }

    #[test]
    fn empty_queue_completes_without_batches() {
        let orchestrator = orchestrator(SyncConfig::default(), queue(), true);

        let outcome = orchestrator.trigger(SyncTrigger::Manual).unwrap();
        let report = outcome.report().unwrap();
        assert_eq!(report.submitted, 0);
        assert_eq!(report.batches, 0);
    }

    #[test]
    fn acks_advance_records_to_synced() {
        let queue = queue();
        let a = queue.create(draft("A"), 1).unwrap();
        let b = queue.create(draft("B"), 2).unwrap();
        let orchestrator = orchestrator(SyncConfig::default(), queue.clone(), true);

        let outcome = orchestrator.trigger(SyncTrigger::ConnectivityRegained).unwrap();
        let report = outcome.report().unwrap();

        assert_eq!(report.submitted, 2);
        assert_eq!(report.synced, 2);
        assert_eq!(queue.get(&a.id).unwrap().sync_status, SyncStatus::Synced);
        assert_eq!(queue.get(&b.id).unwrap().sync_status, SyncStatus::Synced);
        assert_eq!(queue.pending_count(), 0);
    }

    #[test]
    fn batches_respect_the_size_bound() {
        let queue = queue();
        for i in 0..7 {
            queue.create(draft(&format!("P{i}")), i as u64).unwrap();
        }
        let config = SyncConfig::new().with_max_batch_size(3);
        let orchestrator = orchestrator(config, queue, true);

        let outcome = orchestrator.trigger(SyncTrigger::Manual).unwrap();
        let report = outcome.report().unwrap();

        assert_eq!(report.batches, 3);
        let sizes: Vec<_> = orchestrator
            .transport()
            .requests()
            .iter()
            .map(|r| r.records.len())
            .collect();
        assert_eq!(sizes, vec![3, 3, 1]);
    }

    #[test]
    fn error_records_are_not_resubmitted() {
        let queue = queue();
        let a = queue.create(draft("A"), 1).unwrap();
        queue
            .apply_outcome(&a.id, &AckOutcome::Error("age out of range".into()), 5)
            .unwrap();
        let orchestrator = orchestrator(SyncConfig::default(), queue, true);

        let outcome = orchestrator.trigger(SyncTrigger::Manual).unwrap();
        assert_eq!(outcome.report().unwrap().submitted, 0);
        assert_eq!(orchestrator.transport().request_count(), 0);
    }

    #[test]
    fn network_failure_keeps_records_pending() {
        let queue = queue();
        queue.create(draft("A"), 1).unwrap();
        let orchestrator = orchestrator(SyncConfig::default(), queue.clone(), true);
        orchestrator.transport().push_network_failure();

        let outcome = orchestrator.trigger(SyncTrigger::Manual).unwrap();
        let report = outcome.report().unwrap();

        assert!(report.network_failure);
        assert_eq!(report.synced, 0);
        assert_eq!(queue.pending_count(), 1);
        assert_eq!(orchestrator.stats().network_failures, 1);

        // Next trigger succeeds (mock acks by default).
        let outcome = orchestrator.trigger(SyncTrigger::Manual).unwrap();
        assert_eq!(outcome.report().unwrap().synced, 1);
        assert_eq!(queue.pending_count(), 0);
    }

    #[test]
    fn retry_ceiling_surfaces_error() {
        let queue = queue();
        let a = queue.create(draft("A"), 1).unwrap();
        let config = SyncConfig::new().with_network_retry_ceiling(2);
        let orchestrator = orchestrator(config, queue.clone(), true);

        orchestrator.transport().push_network_failure();
        orchestrator.trigger(SyncTrigger::Manual).unwrap();
        assert_eq!(queue.get(&a.id).unwrap().sync_status, SyncStatus::Pending);

        orchestrator.transport().push_network_failure();
        let outcome = orchestrator.trigger(SyncTrigger::Manual).unwrap();
        assert_eq!(outcome.report().unwrap().errored, 1);
        assert_eq!(queue.get(&a.id).unwrap().sync_status, SyncStatus::Error);

        // Explicit retry clears the slate and the record syncs.
        orchestrator.retry_record(&a.id).unwrap();
        orchestrator.trigger(SyncTrigger::Manual).unwrap();
        assert_eq!(queue.get(&a.id).unwrap().sync_status, SyncStatus::Synced);
    }

    #[test]
    fn successful_ack_resets_the_attempt_count() {
        let queue = queue();
        let a = queue.create(draft("A"), 1).unwrap();
        let config = SyncConfig::new().with_network_retry_ceiling(2);
        let orchestrator = orchestrator(config, queue.clone(), true);

        orchestrator.transport().push_network_failure();
        orchestrator.trigger(SyncTrigger::Manual).unwrap();

        // A response arrives, then the record is edited back to pending.
        orchestrator.trigger(SyncTrigger::Manual).unwrap();
        assert_eq!(queue.get(&a.id).unwrap().sync_status, SyncStatus::Synced);
        let edit = fieldrec_model::RecordEdit {
            diagnosis: Some("Typhoid".into()),
            ..Default::default()
        };
        queue.apply_edit(&a.id, &edit, 50).unwrap();

        // One more failure must not hit the ceiling: the count was reset.
        orchestrator.transport().push_network_failure();
        orchestrator.trigger(SyncTrigger::Manual).unwrap();
        assert_eq!(queue.get(&a.id).unwrap().sync_status, SyncStatus::Pending);
    }

    #[test]
    fn misaligned_response_is_a_protocol_error() {
        let queue = queue();
        let a = queue.create(draft("A"), 1).unwrap();
        let orchestrator = orchestrator(SyncConfig::default(), queue.clone(), true);

        orchestrator
            .transport()
            .push_response(BatchSyncResponse::new(vec![RecordOutcome::synced(
                RecordId::new(),
            )]));

        let err = orchestrator.trigger(SyncTrigger::Manual).unwrap_err();
        assert!(matches!(err, SyncError::Protocol(_)));
        // No optimistic marking: the record is still pending.
        assert_eq!(queue.get(&a.id).unwrap().sync_status, SyncStatus::Pending);
        // The in-flight flag was released despite the error.
        assert!(!orchestrator.is_syncing());
    }

    #[test]
    fn server_error_outcome_marks_record_error() {
        let queue = queue();
        let a = queue.create(draft("A"), 1).unwrap();
        let orchestrator = orchestrator(SyncConfig::default(), queue.clone(), true);

        orchestrator
            .transport()
            .push_response(BatchSyncResponse::new(vec![RecordOutcome::error(
                a.id,
                "age out of range",
            )]));

        let outcome = orchestrator.trigger(SyncTrigger::Manual).unwrap();
        assert_eq!(outcome.report().unwrap().errored, 1);
        assert_eq!(queue.get(&a.id).unwrap().sync_status, SyncStatus::Error);
    }

    /// Blocks inside the network call until released, then acks everything.
    struct BlockingTransport {
        entered: mpsc::Sender<()>,
        release: Mutex<mpsc::Receiver<()>>,
    }

    impl SyncTransport for BlockingTransport {
        fn submit_batch(&self, request: &BatchSyncRequest) -> SyncResult<BatchSyncResponse> {
            self.entered.send(()).ok();
            self.release.lock().recv().ok();
            Ok(BatchSyncResponse::new(
                request
                    .records
                    .iter()
                    .map(|r| RecordOutcome::synced(r.id))
                    .collect(),
            ))
        }
    }

    #[test]
    fn concurrent_triggers_coalesce_into_one_batch() {
        let queue = queue();
        queue.create(draft("A"), 1).unwrap();
        queue.create(draft("B"), 2).unwrap();

        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let transport = BlockingTransport {
            entered: entered_tx,
            release: Mutex::new(release_rx),
        };

        let orchestrator = Arc::new(SyncOrchestrator::new(
            SyncConfig::default(),
            queue.clone(),
            transport,
            StaticConnectivity::online(),
        ));

        let background = {
            let orchestrator = Arc::clone(&orchestrator);
            thread::spawn(move || orchestrator.trigger(SyncTrigger::Manual).unwrap())
        };

        // Wait until the cycle is inside its network call, then fire two
        // more triggers: both must be dropped, not queued.
        entered_rx.recv().unwrap();
        assert!(orchestrator.is_syncing());
        assert_eq!(
            orchestrator.trigger(SyncTrigger::Timer).unwrap(),
            CycleOutcome::AlreadyRunning
        );
        assert_eq!(
            orchestrator.trigger(SyncTrigger::Manual).unwrap(),
            CycleOutcome::AlreadyRunning
        );

        release_tx.send(()).unwrap();
        let outcome = background.join().unwrap();

        // Exactly one network batch covered the pending set.
        assert_eq!(outcome.report().unwrap().batches, 1);
        assert_eq!(orchestrator.stats().triggers_coalesced, 2);
        assert_eq!(queue.pending_count(), 0);
    }
}
