//! Identity provider trait.

use crate::result::AppResult;
use crate::types::OwnerId;

/// Resolves the actor on whose behalf an operation runs.
///
/// Callers resolve the owner once at the edge and thread it through every
/// repository and service call explicitly.
pub trait IdentityProvider: Send + Sync {
    /// The id of the current actor.
    fn current_owner_id(&self) -> AppResult<OwnerId>;
}

/// An identity provider that always reports the same owner.
#[derive(Debug, Clone, Copy)]
pub struct StaticIdentity(pub OwnerId);

impl IdentityProvider for StaticIdentity {
    fn current_owner_id(&self) -> AppResult<OwnerId> {
        Ok(self.0)
    }
}
