//! Caller-identity boundary.
//!
//! Token issuance and validation belong to the authentication collaborator;
//! this module only defines the identity the endpoint consumes to check
//! who a batch is being submitted as.

use crate::error::{ServerError, ServerResult};
use std::collections::HashMap;

/// The authenticated caller of a batch-sync request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    /// The doctor id this caller submits records as.
    pub doctor_id: String,
}

impl CallerIdentity {
    /// Creates an identity for a doctor.
    #[must_use]
    pub fn doctor(doctor_id: impl Into<String>) -> Self {
        Self {
            doctor_id: doctor_id.into(),
        }
    }
}

/// Resolves an opaque token to a caller identity.
pub trait IdentityProvider: Send + Sync {
    /// Resolves the token, or fails with [`ServerError::UnknownCaller`].
    fn identify(&self, token: &str) -> ServerResult<CallerIdentity>;
}

/// A fixed token table, for tests and single-tenant deployments.
#[derive(Debug, Default)]
pub struct StaticIdentityProvider {
    identities: HashMap<String, CallerIdentity>,
}

impl StaticIdentityProvider {
    /// Creates an empty provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a token for an identity.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>, identity: CallerIdentity) -> Self {
        self.identities.insert(token.into(), identity);
        self
    }
}

impl IdentityProvider for StaticIdentityProvider {
    fn identify(&self, token: &str) -> ServerResult<CallerIdentity> {
        self.identities
            .get(token)
            .cloned()
            .ok_or_else(|| ServerError::UnknownCaller(token.into()))
    }
}
