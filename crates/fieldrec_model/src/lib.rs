//! # Fieldrec Model
//!
//! The record model for offline-first field capture:
//! - Record and symptom types with their field bounds
//! - Validation against those bounds
//! - The per-record sync-status state machine (pending → synced / error)
//!
//! ## Key Invariants
//!
//! - Record ids are client-assigned before any server contact
//! - A record is only mutated through its transition operations, each of
//!   which produces a new version with a refreshed `updated_at`
//! - Transitions never alter business fields

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod id;
mod record;
mod status;
pub mod time;
pub mod validate;

pub use id::RecordId;
pub use record::{Location, Record, RecordDraft, RecordEdit, Severity, Symptom};
pub use status::{AckOutcome, InvalidTransition, SyncStatus, Transition};
pub use validate::ValidationError;
