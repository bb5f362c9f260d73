//! Error types for the editor

use reclist_common::IdentityError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Structural error: {0}")]
    Structural(#[from] crate::mutations::StructuralError),

    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    #[error("Invalid command script: {0}")]
    Script(#[from] serde_json::Error),
}
