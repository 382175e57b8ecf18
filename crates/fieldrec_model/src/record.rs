//! Record and symptom types with their transition operations.

use crate::id::RecordId;
use crate::status::{AckOutcome, InvalidTransition, SyncStatus, Transition};
use crate::validate::{self, check_len, check_non_empty, ValidationError};
use serde::{Deserialize, Serialize};

/// Symptom severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Noticeable but not limiting.
    Mild,
    /// Limiting normal activity.
    Moderate,
    /// Requires urgent attention.
    Severe,
}

/// A single observed symptom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symptom {
    /// Symptom name, at most 100 characters.
    pub name: String,
    /// Severity grade.
    pub severity: Severity,
    /// How long the symptom has been present, free text.
    pub duration: String,
    /// Optional details, at most 500 characters.
    pub description: Option<String>,
}

impl Symptom {
    /// Creates a symptom without a description.
    pub fn new(name: impl Into<String>, severity: Severity, duration: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            severity,
            duration: duration.into(),
            description: None,
        }
    }

    /// Checks the symptom's field bounds.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_non_empty("symptom.name", &self.name)?;
        check_len("symptom.name", &self.name, validate::MAX_SYMPTOM_NAME_LEN)?;
        check_len(
            "symptom.duration",
            &self.duration,
            validate::MAX_SYMPTOM_DURATION_LEN,
        )?;
        if let Some(description) = &self.description {
            check_len(
                "symptom.description",
                description,
                validate::MAX_SYMPTOM_DESCRIPTION_LEN,
            )?;
        }
        Ok(())
    }
}

/// Where a record was captured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Latitude in degrees, `[-90, 90]`.
    pub latitude: f64,
    /// Longitude in degrees, `[-180, 180]`.
    pub longitude: f64,
    /// Optional human-readable address, at most 200 characters.
    pub address: Option<String>,
}

impl Location {
    /// Creates a location from coordinates.
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            address: None,
        }
    }

    /// Sets the address.
    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Checks the coordinate ranges and address bound.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(ValidationError::LatitudeOutOfRange {
                value: self.latitude,
            });
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(ValidationError::LongitudeOutOfRange {
                value: self.longitude,
            });
        }
        if let Some(address) = &self.address {
            check_len("location.address", address, validate::MAX_ADDRESS_LEN)?;
        }
        Ok(())
    }
}

/// A field record captured in the field.
///
/// Records are immutable except through the transition operations
/// ([`mark_synced`](Record::mark_synced), [`mark_error`](Record::mark_error),
/// [`retry`](Record::retry), [`apply_edit`](Record::apply_edit)), each of
/// which produces a new version with a refreshed `updated_at`. Deletion is
/// not a sync concern and has no operation here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Client-assigned id, stable across the offline period.
    pub id: RecordId,
    /// Patient identifier, stamped by the caller's identity service.
    pub patient_id: String,
    /// Doctor identifier, stamped by the caller's identity service.
    pub doctor_id: String,
    /// Patient name, at most 100 characters.
    pub patient_name: String,
    /// Patient age in years, `0..=150`.
    pub age: u8,
    /// Diagnosis, at most 200 characters.
    pub diagnosis: String,
    /// Ordered symptoms, at most 20.
    pub symptoms: Vec<Symptom>,
    /// Optional free-text description, at most 1000 characters.
    pub description: Option<String>,
    /// Consultation date, unix milliseconds.
    pub date: u64,
    /// Optional capture location.
    pub location: Option<Location>,
    /// Image URIs, at most 10.
    pub images: Vec<String>,
    /// Optional audio-note reference, at most 500 characters.
    pub audio_notes: Option<String>,
    /// Whether the record was captured without connectivity.
    pub is_offline: bool,
    /// Position in the sync state machine.
    pub sync_status: SyncStatus,
    /// Creation time, unix milliseconds.
    pub created_at: u64,
    /// Last transition time, unix milliseconds. Drives last-write-wins.
    pub updated_at: u64,
}

/// The business fields supplied when creating a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordDraft {
    /// Patient identifier.
    pub patient_id: String,
    /// Doctor identifier.
    pub doctor_id: String,
    /// Patient name.
    pub patient_name: String,
    /// Patient age in years.
    pub age: u8,
    /// Diagnosis.
    pub diagnosis: String,
    /// Ordered symptoms.
    pub symptoms: Vec<Symptom>,
    /// Optional description.
    pub description: Option<String>,
    /// Consultation date, unix milliseconds.
    pub date: u64,
    /// Optional capture location.
    pub location: Option<Location>,
    /// Image URIs.
    pub images: Vec<String>,
    /// Optional audio-note reference.
    pub audio_notes: Option<String>,
    /// Whether the record was captured without connectivity.
    pub is_offline: bool,
}

/// A set of field updates applied through the edit transition.
///
/// `None` fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordEdit {
    /// New patient name.
    pub patient_name: Option<String>,
    /// New age.
    pub age: Option<u8>,
    /// New diagnosis.
    pub diagnosis: Option<String>,
    /// Replacement symptom list.
    pub symptoms: Option<Vec<Symptom>>,
    /// New description.
    pub description: Option<String>,
    /// New consultation date.
    pub date: Option<u64>,
    /// New location.
    pub location: Option<Location>,
    /// Replacement image list.
    pub images: Option<Vec<String>>,
    /// New audio-note reference.
    pub audio_notes: Option<String>,
}

impl Record {
    /// Creates a validated record from a draft.
    ///
    /// The record gets a fresh client-assigned id, starts `Pending`, and has
    /// `created_at == updated_at == now_ms`.
    pub fn create(draft: RecordDraft, now_ms: u64) -> Result<Self, ValidationError> {
        let record = Self {
            id: RecordId::new(),
            patient_id: draft.patient_id,
            doctor_id: draft.doctor_id,
            patient_name: draft.patient_name,
            age: draft.age,
            diagnosis: draft.diagnosis,
            symptoms: draft.symptoms,
            description: draft.description,
            date: draft.date,
            location: draft.location,
            images: draft.images,
            audio_notes: draft.audio_notes,
            is_offline: draft.is_offline,
            sync_status: SyncStatus::Pending,
            created_at: now_ms,
            updated_at: now_ms,
        };
        record.validate()?;
        Ok(record)
    }

    /// Checks every field bound from the data model.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_non_empty("patient_id", &self.patient_id)?;
        check_non_empty("doctor_id", &self.doctor_id)?;
        check_non_empty("patient_name", &self.patient_name)?;
        check_len(
            "patient_name",
            &self.patient_name,
            validate::MAX_PATIENT_NAME_LEN,
        )?;
        if self.age > validate::MAX_AGE {
            return Err(ValidationError::AgeOutOfRange {
                age: self.age,
                max: validate::MAX_AGE,
            });
        }
        check_len("diagnosis", &self.diagnosis, validate::MAX_DIAGNOSIS_LEN)?;
        if self.symptoms.len() > validate::MAX_SYMPTOMS {
            return Err(ValidationError::TooManySymptoms {
                count: self.symptoms.len(),
                max: validate::MAX_SYMPTOMS,
            });
        }
        for symptom in &self.symptoms {
            symptom.validate()?;
        }
        if let Some(description) = &self.description {
            check_len("description", description, validate::MAX_DESCRIPTION_LEN)?;
        }
        if let Some(location) = &self.location {
            location.validate()?;
        }
        if self.images.len() > validate::MAX_IMAGES {
            return Err(ValidationError::TooManyImages {
                count: self.images.len(),
                max: validate::MAX_IMAGES,
            });
        }
        if let Some(audio_notes) = &self.audio_notes {
            check_len("audio_notes", audio_notes, validate::MAX_AUDIO_NOTES_LEN)?;
        }
        Ok(())
    }

    /// Transition: the server acknowledged this record by id.
    pub fn mark_synced(&self, now_ms: u64) -> Result<Self, InvalidTransition> {
        self.transitioned(Transition::AckSuccess, now_ms)
    }

    /// Transition: the sync attempt failed for this record.
    pub fn mark_error(&self, now_ms: u64) -> Result<Self, InvalidTransition> {
        self.transitioned(Transition::AckFailure, now_ms)
    }

    /// Transition: a retry was requested for an errored record.
    pub fn retry(&self, now_ms: u64) -> Result<Self, InvalidTransition> {
        self.transitioned(Transition::Retry, now_ms)
    }

    /// Applies a server acknowledgment, advancing the state machine.
    pub fn apply_ack(&self, outcome: &AckOutcome, now_ms: u64) -> Result<Self, InvalidTransition> {
        self.transitioned(outcome.transition(), now_ms)
    }

    /// Transition: a user edit. Re-validates and re-enters `Pending` from
    /// any state; the conflict, if any, resolves by last-write-wins at
    /// reconciliation time.
    pub fn apply_edit(&self, edit: &RecordEdit, now_ms: u64) -> Result<Self, ValidationError> {
        let mut edited = self.clone();
        if let Some(patient_name) = &edit.patient_name {
            edited.patient_name = patient_name.clone();
        }
        if let Some(age) = edit.age {
            edited.age = age;
        }
        if let Some(diagnosis) = &edit.diagnosis {
            edited.diagnosis = diagnosis.clone();
        }
        if let Some(symptoms) = &edit.symptoms {
            edited.symptoms = symptoms.clone();
        }
        if let Some(description) = &edit.description {
            edited.description = Some(description.clone());
        }
        if let Some(date) = edit.date {
            edited.date = date;
        }
        if let Some(location) = &edit.location {
            edited.location = Some(location.clone());
        }
        if let Some(images) = &edit.images {
            edited.images = images.clone();
        }
        if let Some(audio_notes) = &edit.audio_notes {
            edited.audio_notes = Some(audio_notes.clone());
        }
        edited.validate()?;
        // Edit is legal from every state.
        edited.sync_status = SyncStatus::Pending;
        edited.updated_at = now_ms;
        Ok(edited)
    }

    /// The canonical server-side copy of this record.
    ///
    /// Forces `Synced` without touching timestamps; reserved for the
    /// reconciliation endpoint's store. Timestamps must stay as submitted
    /// because last-write-wins compares the client's `updated_at`.
    #[must_use]
    pub fn into_server_copy(mut self) -> Self {
        self.sync_status = SyncStatus::Synced;
        self
    }

    fn transitioned(&self, transition: Transition, now_ms: u64) -> Result<Self, InvalidTransition> {
        let sync_status = self.sync_status.apply(transition)?;
        Ok(Self {
            sync_status,
            updated_at: now_ms,
            ..self.clone()
        })
    }
}
