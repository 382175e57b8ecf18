//! Versioned queue snapshots.

use crate::error::{QueueError, QueueResult};
use fieldrec_model::Record;
use serde::{Deserialize, Serialize};

/// Current snapshot schema version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// A point-in-time serialization of the whole queue.
///
/// Snapshots carry a schema version so older on-disk data can be migrated
/// forward when the record shape changes. Migrations are forward-only;
/// a snapshot from a newer build is rejected rather than guessed at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueSnapshot {
    /// Schema version this snapshot was written with.
    pub schema_version: u32,
    /// All records, in insertion order.
    pub records: Vec<Record>,
}

impl QueueSnapshot {
    /// Creates a snapshot at the current schema version.
    #[must_use]
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            schema_version: SNAPSHOT_VERSION,
            records,
        }
    }

    /// Encodes the snapshot to CBOR.
    pub fn encode(&self) -> QueueResult<Vec<u8>> {
        let mut bytes = Vec::new();
        ciborium::into_writer(self, &mut bytes).map_err(|e| QueueError::Encode(e.to_string()))?;
        Ok(bytes)
    }

    /// Decodes a snapshot from CBOR and migrates it to the current version.
    pub fn decode(bytes: &[u8]) -> QueueResult<Self> {
        let snapshot: Self =
            ciborium::from_reader(bytes).map_err(|e| QueueError::Decode(e.to_string()))?;
        snapshot.migrate()
    }

    /// Upgrades an older snapshot to the current schema version.
    ///
    /// Version 1 is the first schema; future versions chain their upgrade
    /// steps here.
    pub fn migrate(self) -> QueueResult<Self> {
        match self.schema_version {
            SNAPSHOT_VERSION => Ok(self),
            found => Err(QueueError::UnsupportedVersion {
                found,
                supported: SNAPSHOT_VERSION,
            }),
        }
    }
}
