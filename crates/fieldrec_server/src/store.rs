//! The record store and its in-memory implementation.

use crate::error::ServerResult;
use crate::query::QueryCriteria;
use fieldrec_model::{Record, RecordId};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};

/// The storage collaborator behind the reconciliation endpoint.
///
/// Provides keyed upsert-by-id; the last-write-wins decision itself is made
/// by the handler's comparator, the store just persists what it is given
/// and maintains the patient/doctor/date indexes.
pub trait RecordStore: Send + Sync {
    /// Returns the stored record with the given id, if any.
    fn get(&self, id: &RecordId) -> ServerResult<Option<Record>>;

    /// Inserts or replaces a record by id.
    fn upsert(&self, record: Record) -> ServerResult<()>;

    /// Resolves typed query criteria, returning matches ordered by date.
    fn find(&self, criteria: &QueryCriteria) -> ServerResult<Vec<Record>>;

    /// Number of stored records.
    fn len(&self) -> usize;

    /// Returns true if the store is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Default)]
struct StoreInner {
    records: HashMap<RecordId, Record>,
    by_patient: HashMap<String, Vec<RecordId>>,
    by_doctor: HashMap<String, Vec<RecordId>>,
    by_date: BTreeMap<u64, Vec<RecordId>>,
}

impl StoreInner {
    fn unindex(&mut self, record: &Record) {
        if let Some(ids) = self.by_patient.get_mut(&record.patient_id) {
            ids.retain(|id| *id != record.id);
        }
        if let Some(ids) = self.by_doctor.get_mut(&record.doctor_id) {
            ids.retain(|id| *id != record.id);
        }
        if let Some(ids) = self.by_date.get_mut(&record.date) {
            ids.retain(|id| *id != record.id);
            if ids.is_empty() {
                self.by_date.remove(&record.date);
            }
        }
    }

    fn index(&mut self, record: &Record) {
        self.by_patient
            .entry(record.patient_id.clone())
            .or_default()
            .push(record.id);
        self.by_doctor
            .entry(record.doctor_id.clone())
            .or_default()
            .push(record.id);
        self.by_date.entry(record.date).or_default().push(record.id);
    }

    /// Narrows candidates using the most selective applicable index.
    fn candidates(&self, criteria: &QueryCriteria) -> Vec<RecordId> {
        if let Some(patient_id) = &criteria.patient_id {
            return self.by_patient.get(patient_id).cloned().unwrap_or_default();
        }
        if let Some(doctor_id) = &criteria.doctor_id {
            return self.by_doctor.get(doctor_id).cloned().unwrap_or_default();
        }
        if let Some(range) = &criteria.date_range {
            return self
                .by_date
                .range(range.start..=range.end)
                .flat_map(|(_, ids)| ids.iter().copied())
                .collect();
        }
        self.records.keys().copied().collect()
    }
}

/// An in-memory record store with patient, doctor, and date indexes.
#[derive(Default)]
pub struct MemoryRecordStore {
    inner: RwLock<StoreInner>,
}

impl MemoryRecordStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryRecordStore {
    fn get(&self, id: &RecordId) -> ServerResult<Option<Record>> {
        Ok(self.inner.read().records.get(id).cloned())
    }

    fn upsert(&self, record: Record) -> ServerResult<()> {
        let mut inner = self.inner.write();
        if let Some(previous) = inner.records.remove(&record.id) {
            inner.unindex(&previous);
        }
        inner.index(&record);
        inner.records.insert(record.id, record);
        Ok(())
    }

    fn find(&self, criteria: &QueryCriteria) -> ServerResult<Vec<Record>> {
        let inner = self.inner.read();
        let mut matches: Vec<Record> = inner
            .candidates(criteria)
            .into_iter()
            .filter_map(|id| inner.records.get(&id))
            .filter(|record| criteria.matches(record))
            .cloned()
            .collect();
        matches.sort_by_key(|record| (record.date, record.id));
        Ok(matches)
    }

    fn len(&self) -> usize {
        self.inner.read().records.len()
    }
}
