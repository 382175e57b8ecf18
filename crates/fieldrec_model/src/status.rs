//! Sync-status state machine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The synchronization status of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    /// Created or edited locally, not yet acknowledged by the server.
    Pending,
    /// Durably stored on the server and acknowledged per id.
    Synced,
    /// Last sync attempt failed validation or exceeded the retry ceiling.
    Error,
}

impl SyncStatus {
    /// Returns true if the record still needs to reach the server.
    #[must_use]
    pub fn needs_sync(&self) -> bool {
        !matches!(self, SyncStatus::Synced)
    }

    /// Applies a transition, returning the resulting status.
    ///
    /// The only legal transitions are:
    /// - `AckSuccess`: Pending → Synced
    /// - `AckFailure`: Pending → Error
    /// - `Retry`: Error → Pending
    /// - `Edit`: any → Pending
    pub fn apply(self, transition: Transition) -> Result<SyncStatus, InvalidTransition> {
        match (self, transition) {
            (SyncStatus::Pending, Transition::AckSuccess) => Ok(SyncStatus::Synced),
            (SyncStatus::Pending, Transition::AckFailure) => Ok(SyncStatus::Error),
            (SyncStatus::Error, Transition::Retry) => Ok(SyncStatus::Pending),
            (_, Transition::Edit) => Ok(SyncStatus::Pending),
            (from, transition) => Err(InvalidTransition { from, transition }),
        }
    }
}

/// An event that moves a record through the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The server acknowledged the record by id.
    AckSuccess,
    /// The server rejected the record, or the retry ceiling was exceeded.
    AckFailure,
    /// A retry was explicitly requested for an errored record.
    Retry,
    /// The user edited a business field.
    Edit,
}

/// A transition that is not permitted from the current status.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("invalid transition: {transition:?} from {from:?}")]
pub struct InvalidTransition {
    /// The status the record was in.
    pub from: SyncStatus,
    /// The transition that was attempted.
    pub transition: Transition,
}

/// A per-record server acknowledgment, in its typed form.
///
/// `Superseded` means the server already held a copy with an equal or newer
/// `updated_at`; the submission was logically redundant and the server copy
/// is canonical. It advances the record to `Synced` just like a plain ack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AckOutcome {
    /// The server stored the submitted version.
    Synced,
    /// The server kept its own, newer-or-equal copy.
    Superseded,
    /// The server rejected the record, with a reason.
    Error(String),
}

impl AckOutcome {
    /// The state-machine transition this acknowledgment drives.
    #[must_use]
    pub fn transition(&self) -> Transition {
        match self {
            AckOutcome::Synced | AckOutcome::Superseded => Transition::AckSuccess,
            AckOutcome::Error(_) => Transition::AckFailure,
        }
    }
}
