use crate::error::IdentityError;
use crate::ids::UserId;

/// Supplies the current principal when a list is created
///
/// The editing engine never caches or refreshes credentials; it asks the
/// provider once per list creation.
pub trait IdentityProvider {
    /// Id of the authenticated user, if any
    fn current_user(&self) -> Result<UserId, IdentityError>;
}

/// Identity provider with a fixed, already-authenticated user
#[derive(Debug, Clone, Copy)]
pub struct StaticIdentity {
    user_id: UserId,
}

impl StaticIdentity {
    pub fn new(user_id: UserId) -> Self {
        Self { user_id }
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_user(&self) -> Result<UserId, IdentityError> {
        Ok(self.user_id)
    }
}

/// Identity provider for a signed-out session
#[derive(Debug, Clone, Copy, Default)]
pub struct NoIdentity;

impl IdentityProvider for NoIdentity {
    fn current_user(&self) -> Result<UserId, IdentityError> {
        Err(IdentityError::NotAuthenticated)
    }
}
