//! Connectivity signal boundary.
//!
//! The platform layer owns the actual reachability detection; it exposes the
//! current state here and calls
//! [`SyncOrchestrator::trigger`](crate::SyncOrchestrator::trigger) with
//! [`SyncTrigger::ConnectivityRegained`](crate::SyncTrigger) when the state
//! flips to online.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Exposes whether the device currently has connectivity.
pub trait ConnectivitySignal: Send + Sync {
    /// Returns true if the device is online.
    fn is_online(&self) -> bool;
}

/// A manually toggled connectivity signal.
///
/// Clones share state, so a handle kept by the host (or a test) can flip
/// the signal after the orchestrator takes its copy.
#[derive(Debug, Clone)]
pub struct StaticConnectivity {
    online: Arc<AtomicBool>,
}

impl StaticConnectivity {
    /// Creates a signal in the given state.
    #[must_use]
    pub fn new(online: bool) -> Self {
        Self {
            online: Arc::new(AtomicBool::new(online)),
        }
    }

    /// Creates an online signal.
    #[must_use]
    pub fn online() -> Self {
        Self::new(true)
    }

    /// Creates an offline signal.
    #[must_use]
    pub fn offline() -> Self {
        Self::new(false)
    }

    /// Updates the state.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }
}

impl ConnectivitySignal for StaticConnectivity {
    fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}
