//! # Fieldrec Protocol
//!
//! The wire types exchanged between the sync orchestrator and the
//! reconciliation endpoint: a bounded batch of records in, a 1:1 aligned
//! array of per-record outcomes back.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod messages;

pub use messages::{
    BatchSizeError, BatchSyncRequest, BatchSyncResponse, OutcomeStatus, RecordOutcome,
    MAX_BATCH_RECORDS, MIN_BATCH_RECORDS,
};
