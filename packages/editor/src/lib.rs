//! # Reclist Editor
//!
//! Core editing engine for recommendation lists.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ view: field events (Enter, Backspace, ...)  │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: EditCommand → Transition            │
//! │  - Resolve focus against latest snapshot    │
//! │  - Apply primitive mutations atomically     │
//! │  - Compute next focus + post-effects        │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ workspace: observers, autosave, persistence │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Snapshots are values**: an edit publishes a new snapshot, old ones never change
//! 2. **All or nothing**: a refused command leaves document and focus untouched
//! 3. **Always focusable**: a list never ends up with zero items and zero sections
//!
//! ## Usage
//!
//! ```rust,ignore
//! use reclist_editor::{EditCommand, EditSession, ListDocument};
//!
//! let doc = ListDocument::create(&identity)?;
//! let mut session = EditSession::new(doc);
//!
//! session.apply(&EditCommand::SetText("Tacos".to_string()))?;
//! let change = session.apply(&EditCommand::Commit)?;
//!
//! assert_eq!(change.version, 2);
//! ```

mod document;
mod errors;
mod focus;
mod mutations;
mod post_effects;
mod processor;
mod session;

pub use document::{
    ContainerRef, Item, ItemPatch, ItemRef, ListDocument, PriceTier, Section, Visibility,
};
pub use errors::EditorError;
pub use focus::{next_focus, FocusTarget, ItemField};
pub use mutations::{MergeResult, Mutation, MutationOutcome, StructuralError, StructuralResult};
pub use post_effects::{PostEffect, PostEffectEngine, RevealFocusedDescription};
pub use processor::{EditCommand, EditCommandProcessor, Transition};
pub use session::{Change, EditSession};

// Re-export common types for convenience
pub use reclist_common::{IdentityError, IdentityProvider, ItemId, ListId, SectionId, UserId};
