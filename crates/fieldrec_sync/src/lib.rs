//! # Fieldrec Sync
//!
//! The client-side sync orchestrator: drains the durable queue and submits
//! bounded batches to the reconciliation endpoint when connectivity allows.
//!
//! ## Architecture
//!
//! Triggers (connectivity regained, timer, manual) all funnel into one
//! non-reentrant cycle:
//!
//! 1. If a cycle is already in flight, the trigger is dropped, not queued
//! 2. If offline, the cycle is a no-op
//! 3. Otherwise the pending snapshot is batched and submitted sequentially,
//!    and each per-id acknowledgment is applied back into the queue
//!
//! ## Key Invariants
//!
//! - A record is marked `Synced` only on an explicit per-id server
//!   acknowledgment, never optimistically
//! - A network failure terminates the cycle; unacknowledged records stay
//!   `Pending`, which is safe to resubmit because the endpoint is
//!   idempotent per id
//! - At most one sync attempt per record id is outstanding at any time

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod connectivity;
mod error;
mod orchestrator;
mod transport;

pub use config::SyncConfig;
pub use connectivity::{ConnectivitySignal, StaticConnectivity};
pub use error::{SyncError, SyncResult};
pub use orchestrator::{CycleOutcome, SyncCycleReport, SyncOrchestrator, SyncStats, SyncTrigger};
pub use transport::{MockTransport, SyncTransport};
