//! Field bounds and validation errors.
//!
//! The reconciliation endpoint applies the same checks server-side, so the
//! bounds live here rather than in either the client or server crate.

use thiserror::Error;

/// Maximum length of a patient name, in characters.
pub const MAX_PATIENT_NAME_LEN: usize = 100;
/// Maximum length of a diagnosis, in characters.
pub const MAX_DIAGNOSIS_LEN: usize = 200;
/// Maximum number of symptoms on a record.
pub const MAX_SYMPTOMS: usize = 20;
/// Maximum length of a record description, in characters.
pub const MAX_DESCRIPTION_LEN: usize = 1000;
/// Maximum length of a location address, in characters.
pub const MAX_ADDRESS_LEN: usize = 200;
/// Maximum number of image URIs on a record.
pub const MAX_IMAGES: usize = 10;
/// Maximum length of audio notes, in characters.
pub const MAX_AUDIO_NOTES_LEN: usize = 500;
/// Maximum patient age, in years.
pub const MAX_AGE: u8 = 150;
/// Maximum length of a symptom name, in characters.
pub const MAX_SYMPTOM_NAME_LEN: usize = 100;
/// Maximum length of a symptom duration, in characters.
pub const MAX_SYMPTOM_DURATION_LEN: usize = 100;
/// Maximum length of a symptom description, in characters.
pub const MAX_SYMPTOM_DESCRIPTION_LEN: usize = 500;

/// A field that violates one of the model invariants.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A text field exceeds its length bound.
    #[error("{field} is {len} characters, limit is {max}")]
    FieldTooLong {
        /// Field name.
        field: &'static str,
        /// Actual length.
        len: usize,
        /// Maximum allowed length.
        max: usize,
    },

    /// A required text field is empty.
    #[error("{field} must not be empty")]
    FieldEmpty {
        /// Field name.
        field: &'static str,
    },

    /// Age outside `0..=150`.
    #[error("age {age} is outside 0..={max}")]
    AgeOutOfRange {
        /// Submitted age.
        age: u8,
        /// Maximum allowed age.
        max: u8,
    },

    /// More symptoms than the record bound allows.
    #[error("{count} symptoms exceeds limit of {max}")]
    TooManySymptoms {
        /// Submitted symptom count.
        count: usize,
        /// Maximum allowed count.
        max: usize,
    },

    /// More image URIs than the record bound allows.
    #[error("{count} images exceeds limit of {max}")]
    TooManyImages {
        /// Submitted image count.
        count: usize,
        /// Maximum allowed count.
        max: usize,
    },

    /// Latitude outside `[-90, 90]`.
    #[error("latitude {value} is outside [-90, 90]")]
    LatitudeOutOfRange {
        /// Submitted latitude.
        value: f64,
    },

    /// Longitude outside `[-180, 180]`.
    #[error("longitude {value} is outside [-180, 180]")]
    LongitudeOutOfRange {
        /// Submitted longitude.
        value: f64,
    },
}

/// Checks a text field against a length bound.
pub(crate) fn check_len(
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len > max {
        return Err(ValidationError::FieldTooLong { field, len, max });
    }
    Ok(())
}

/// Checks that a required text field is non-empty.
pub(crate) fn check_non_empty(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::FieldEmpty { field });
    }
    Ok(())
}
