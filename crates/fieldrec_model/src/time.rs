//! Timestamp helpers.
//!
//! All timestamps in the model are unix milliseconds. Transition operations
//! take the current time as a parameter so callers (and tests) control it.

use std::time::{SystemTime, UNIX_EPOCH};

/// Returns the current unix time in milliseconds.
#[must_use]
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
