use thiserror::Error;

/// Raised when a list is created without an authenticated principal
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("No authenticated user")]
    NotAuthenticated,
}
