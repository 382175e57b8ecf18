//! Typed query criteria for the record store.
//!
//! Criteria are a closed set of operators (equality, date range, text
//! match) resolved by the store itself; callers never pass opaque query
//! blobs through the seam.

use fieldrec_model::Record;

/// An inclusive date range in unix milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    /// Earliest date, inclusive.
    pub start: u64,
    /// Latest date, inclusive.
    pub end: u64,
}

impl DateRange {
    /// Creates a range; `start` and `end` are both inclusive.
    #[must_use]
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    /// Returns true if the timestamp falls inside the range.
    #[must_use]
    pub fn contains(&self, ms: u64) -> bool {
        (self.start..=self.end).contains(&ms)
    }
}

/// A conjunction of typed search operators.
///
/// Empty criteria match every record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryCriteria {
    /// Equality on `patient_id`.
    pub patient_id: Option<String>,
    /// Equality on `doctor_id`.
    pub doctor_id: Option<String>,
    /// Range on the consultation date.
    pub date_range: Option<DateRange>,
    /// Case-insensitive substring match over patient name, diagnosis, and
    /// description.
    pub text: Option<String>,
}

impl QueryCriteria {
    /// Creates empty criteria (matches everything).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts to one patient.
    #[must_use]
    pub fn with_patient(mut self, patient_id: impl Into<String>) -> Self {
        self.patient_id = Some(patient_id.into());
        self
    }

    /// Restricts to one doctor.
    #[must_use]
    pub fn with_doctor(mut self, doctor_id: impl Into<String>) -> Self {
        self.doctor_id = Some(doctor_id.into());
        self
    }

    /// Restricts to a consultation-date range (inclusive).
    #[must_use]
    pub fn with_date_range(mut self, start: u64, end: u64) -> Self {
        self.date_range = Some(DateRange::new(start, end));
        self
    }

    /// Adds a case-insensitive text match.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Evaluates the criteria against a record.
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        if let Some(patient_id) = &self.patient_id {
            if record.patient_id != *patient_id {
                return false;
            }
        }
        if let Some(doctor_id) = &self.doctor_id {
            if record.doctor_id != *doctor_id {
                return false;
            }
        }
        if let Some(range) = &self.date_range {
            if !range.contains(record.date) {
                return false;
            }
        }
        if let Some(text) = &self.text {
            let needle = text.to_lowercase();
            let in_name = record.patient_name.to_lowercase().contains(&needle);
            let in_diagnosis = record.diagnosis.to_lowercase().contains(&needle);
            let in_description = record
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&needle));
            if !(in_name || in_diagnosis || in_description) {
                return false;
            }
        }
        true
    }
}
