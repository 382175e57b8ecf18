//! The durable record queue.

use crate::error::{QueueError, QueueResult};
use crate::snapshot::QueueSnapshot;
use crate::store::QueueStore;
use fieldrec_model::{AckOutcome, Record, RecordDraft, RecordEdit, RecordId};
use parking_lot::RwLock;
use tracing::debug;

/// All locally known records, keyed by id, in insertion order.
///
/// Every mutation is persisted through the [`QueueStore`] before it returns,
/// so the queue's contents are reconstructible after a restart. Records are
/// never removed: anything not yet `Synced` remains visible to
/// [`drain_pending`](RecordQueue::drain_pending).
pub struct RecordQueue<S: QueueStore> {
    store: S,
    records: RwLock<Vec<Record>>,
}

impl<S: QueueStore> RecordQueue<S> {
    /// Opens the queue, loading any persisted snapshot.
    pub fn open(store: S) -> QueueResult<Self> {
        let records = match store.load()? {
            Some(snapshot) => snapshot.records,
            None => Vec::new(),
        };
        debug!(records = records.len(), "queue opened");
        Ok(Self {
            store,
            records: RwLock::new(records),
        })
    }

    /// Creates a new record from a draft and enqueues it as `Pending`.
    pub fn create(&self, draft: RecordDraft, now_ms: u64) -> QueueResult<Record> {
        let record = Record::create(draft, now_ms)?;
        self.upsert(record.clone())?;
        Ok(record)
    }

    /// Inserts a record, or replaces the existing one with the same id.
    ///
    /// Replacement keeps the record's original insertion position.
    pub fn upsert(&self, record: Record) -> QueueResult<()> {
        let mut records = self.records.write();
        match records.iter().position(|r| r.id == record.id) {
            Some(index) => records[index] = record,
            None => {
                debug!(id = %record.id, "record enqueued");
                records.push(record);
            }
        }
        self.persist(&records)
    }

    /// Returns the record with the given id, if present.
    pub fn get(&self, id: &RecordId) -> Option<Record> {
        self.records.read().iter().find(|r| r.id == *id).cloned()
    }

    /// Returns all records in insertion order.
    pub fn records(&self) -> Vec<Record> {
        self.records.read().clone()
    }

    /// Returns, in original insertion order, every record that still needs
    /// to reach the server (`sync_status != Synced`).
    pub fn drain_pending(&self) -> Vec<Record> {
        self.records
            .read()
            .iter()
            .filter(|r| r.sync_status.needs_sync())
            .cloned()
            .collect()
    }

    /// Number of records that still need to reach the server.
    pub fn pending_count(&self) -> usize {
        self.records
            .read()
            .iter()
            .filter(|r| r.sync_status.needs_sync())
            .count()
    }

    /// Total number of records.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Returns true if the queue holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Applies a server acknowledgment to the record with the given id.
    ///
    /// Only the sync status (and `updated_at`) change; business fields are
    /// untouched.
    pub fn apply_outcome(
        &self,
        id: &RecordId,
        outcome: &AckOutcome,
        now_ms: u64,
    ) -> QueueResult<Record> {
        self.transition(id, |record| {
            record.apply_ack(outcome, now_ms).map_err(QueueError::from)
        })
    }

    /// Applies a user edit; the record re-enters `Pending`.
    pub fn apply_edit(&self, id: &RecordId, edit: &RecordEdit, now_ms: u64) -> QueueResult<Record> {
        self.transition(id, |record| {
            record.apply_edit(edit, now_ms).map_err(QueueError::from)
        })
    }

    /// Moves an errored record back to `Pending` for another attempt.
    pub fn retry(&self, id: &RecordId, now_ms: u64) -> QueueResult<Record> {
        self.transition(id, |record| record.retry(now_ms).map_err(QueueError::from))
    }

    fn transition<F>(&self, id: &RecordId, f: F) -> QueueResult<Record>
    where
        F: FnOnce(&Record) -> QueueResult<Record>,
    {
        let mut records = self.records.write();
        let index = records
            .iter()
            .position(|r| r.id == *id)
            .ok_or(QueueError::UnknownRecord(*id))?;

        let next = f(&records[index])?;
        debug!(id = %id, status = ?next.sync_status, "record transitioned");
        records[index] = next.clone();
        self.persist(&records)?;
        Ok(next)
    }

    fn persist(&self, records: &[Record]) -> QueueResult<()> {
        self.store.save(&QueueSnapshot::new(records.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryQueueStore;
    use fieldrec_model::{Severity, Symptom, SyncStatus};

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

    fn queue() -> RecordQueue<MemoryQueueStore> {
        RecordQueue::open(MemoryQueueStore::new()).unwrap()
    }

    #[test]
    fn create_enqueues_pending() {
        let queue = queue();
        let record = queue.create(draft("Amina"), 100).unwrap();

        assert_eq!(queue.len(), 1);
        assert_eq!(record.sync_status, SyncStatus::Pending);
        assert_eq!(queue.get(&record.id).unwrap(), record);
    }

    #[test]
    fn drain_pending_preserves_insertion_order() {
        let queue = queue();
        let a = queue.create(draft("A"), 1).unwrap();
        let b = queue.create(draft("B"), 2).unwrap();
        let c = queue.create(draft("C"), 3).unwrap();

        let pending = queue.drain_pending();
        let ids: Vec<_> = pending.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![a.id, b.id, c.id]);
    }

    #[test]
    fn upsert_replaces_in_place() {
        let queue = queue();
        let a = queue.create(draft("A"), 1).unwrap();
        let b = queue.create(draft("B"), 2).unwrap();

        let mut replacement = a.clone();
        replacement.diagnosis = "Typhoid".into();
        queue.upsert(replacement).unwrap();

        assert_eq!(queue.len(), 2);
        let ids: Vec<_> = queue.records().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![a.id, b.id]);
        assert_eq!(queue.get(&a.id).unwrap().diagnosis, "Typhoid");
    }

    #[test]
    fn synced_records_leave_drain_pending() {
        let queue = queue();
        let a = queue.create(draft("A"), 1).unwrap();
        let b = queue.create(draft("B"), 2).unwrap();

        queue.apply_outcome(&a.id, &AckOutcome::Synced, 10).unwrap();

        let pending = queue.drain_pending();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, b.id);
        // Still in the queue, just synced.
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn errored_records_stay_visible() {
        let queue = queue();
        let a = queue.create(draft("A"), 1).unwrap();

        queue
            .apply_outcome(&a.id, &AckOutcome::Error("age out of range".into()), 10)
            .unwrap();

        let pending = queue.drain_pending();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].sync_status, SyncStatus::Error);
    }

    #[test]
    fn apply_outcome_touches_only_status() {
        let queue = queue();
        let a = queue.create(draft("A"), 1).unwrap();

        let synced = queue.apply_outcome(&a.id, &AckOutcome::Synced, 10).unwrap();
        assert_eq!(synced.patient_name, a.patient_name);
        assert_eq!(synced.diagnosis, a.diagnosis);
        assert_eq!(synced.created_at, a.created_at);
        assert_eq!(synced.updated_at, 10);
    }

    #[test]
    fn apply_outcome_unknown_id() {
        let queue = queue();
        let err = queue
            .apply_outcome(&RecordId::new(), &AckOutcome::Synced, 10)
            .unwrap_err();
        assert!(matches!(err, QueueError::UnknownRecord(_)));
    }

    #[test]
    fn double_ack_is_rejected() {
        let queue = queue();
        let a = queue.create(draft("A"), 1).unwrap();

        queue.apply_outcome(&a.id, &AckOutcome::Synced, 10).unwrap();
        let err = queue
            .apply_outcome(&a.id, &AckOutcome::Synced, 20)
            .unwrap_err();
        assert!(matches!(err, QueueError::Transition(_)));
    }

    #[test]
    fn retry_moves_error_back_to_pending() {
        let queue = queue();
        let a = queue.create(draft("A"), 1).unwrap();
        queue
            .apply_outcome(&a.id, &AckOutcome::Error("rejected".into()), 10)
            .unwrap();

        let retried = queue.retry(&a.id, 20).unwrap();
        assert_eq!(retried.sync_status, SyncStatus::Pending);
        assert_eq!(queue.pending_count(), 1);
    }

    #[test]
    fn edit_reenters_pending_and_persists() {
        let queue = queue();
        let a = queue.create(draft("A"), 1).unwrap();
        queue.apply_outcome(&a.id, &AckOutcome::Synced, 10).unwrap();

        let edit = RecordEdit {
            diagnosis: Some("Typhoid".into()),
            ..RecordEdit::default()
        };
        let edited = queue.apply_edit(&a.id, &edit, 20).unwrap();

        assert_eq!(edited.sync_status, SyncStatus::Pending);
        assert_eq!(queue.drain_pending().len(), 1);
    }

    #[test]
    fn queue_survives_restart_in_insertion_order() {
        let store = MemoryQueueStore::new();
        let queue = RecordQueue::open(store.clone()).unwrap();

        let mut ids = Vec::new();
        for i in 0..5 {
            ids.push(queue.create(draft(&format!("P{i}")), i as u64).unwrap().id);
        }

        // Simulated process restart: reopen over the same persisted bytes.
        drop(queue);
        let reopened = RecordQueue::open(store).unwrap();

        let pending = reopened.drain_pending();
        assert_eq!(pending.len(), 5);
        let reopened_ids: Vec<_> = pending.iter().map(|r| r.id).collect();
        assert_eq!(reopened_ids, ids);
    }
}
