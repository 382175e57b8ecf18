//! # Fieldrec Server
//!
//! The server side of reconciliation: an idempotent batch upsert with
//! per-record partial-success semantics and last-write-wins conflict
//! resolution by `updated_at`.
//!
//! ## Key Invariants
//!
//! - Each record in a batch is validated and upserted independently; one
//!   record's failure never blocks or rolls back its siblings
//! - A stored record is only overwritten by a strictly newer `updated_at`
//! - Resubmitting the same id with the same `updated_at` is a no-op that
//!   still reports success

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod auth;
mod config;
mod error;
mod handler;
mod query;
mod store;

pub use auth::{CallerIdentity, IdentityProvider, StaticIdentityProvider};
pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use handler::ReconciliationHandler;
pub use query::{DateRange, QueryCriteria};
pub use store::{MemoryRecordStore, RecordStore};
