//! # Fieldrec Queue
//!
//! The local durable queue: every record is persisted keyed by id, so client
//! state is reconstructible after a process restart without relying on
//! transient memory.
//!
//! ## Architecture
//!
//! Mutations go through an explicit serialize/deserialize boundary: each
//! write produces a versioned [`QueueSnapshot`] handed to a [`QueueStore`].
//! The file store writes snapshots atomically (temp file + rename), so a
//! crash mid-write leaves the previous snapshot intact.
//!
//! ## Key Invariants
//!
//! - Insertion order is preserved; `drain_pending` reports it
//! - A record is never silently dropped: anything not `Synced` stays
//!   visible to `drain_pending` until it is
//! - Status changes route through the model's transition operations

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod queue;
mod snapshot;
mod store;

pub use error::{QueueError, QueueResult};
pub use queue::RecordQueue;
pub use snapshot::{QueueSnapshot, SNAPSHOT_VERSION};
pub use store::{FileQueueStore, MemoryQueueStore, QueueStore};
