//! # Edit Session
//!
//! Holds the latest published snapshot of one list together with the
//! current focus target.
//!
//! Every accepted command bumps the session version and publishes the new
//! document and focus as one [`Change`]. A refused command leaves the
//! snapshot, focus and version untouched.

use crate::document::ListDocument;
use crate::errors::EditorError;
use crate::focus::FocusTarget;
use crate::mutations::Mutation;
use crate::processor::{EditCommand, EditCommandProcessor};
use std::sync::Arc;
use tracing::{debug, warn};

/// One published state of a list
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    /// Monotonic counter, bumped once per accepted command
    pub version: u64,

    pub document: Arc<ListDocument>,

    pub focus: FocusTarget,

    /// Primitive mutations that produced this state
    pub mutations: Vec<Mutation>,
}

/// Single-writer editing state for one list
#[derive(Debug)]
pub struct EditSession {
    document: Arc<ListDocument>,
    focus: FocusTarget,
    version: u64,
    processor: EditCommandProcessor,
}

impl EditSession {
    /// Open a session focused on the first editable field
    pub fn new(document: ListDocument) -> Self {
        let focus = FocusTarget::first(&document);
        Self::with_focus(document, focus)
    }

    pub fn with_focus(document: ListDocument, focus: FocusTarget) -> Self {
        let focus = if focus.resolves(&document) {
            focus
        } else {
            FocusTarget::None
        };

        Self {
            document: Arc::new(document),
            focus,
            version: 0,
            processor: EditCommandProcessor::new(),
        }
    }

    pub fn with_processor(mut self, processor: EditCommandProcessor) -> Self {
        self.processor = processor;
        self
    }

    pub fn document(&self) -> &Arc<ListDocument> {
        &self.document
    }

    pub fn focus(&self) -> FocusTarget {
        self.focus
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Apply a command and publish the result
    pub fn apply(&mut self, command: &EditCommand) -> Result<Change, EditorError> {
        let transition = self
            .processor
            .process(&self.document, &self.focus, command)
            .map_err(|e| {
                warn!(list_id = %self.document.id(), ?command, error = %e, "edit command refused");
                e
            })?;

        self.version += 1;
        self.document = Arc::new(transition.document);
        self.focus = transition.focus;

        debug!(
            list_id = %self.document.id(),
            version = self.version,
            "published list snapshot"
        );

        Ok(Change {
            version: self.version,
            document: Arc::clone(&self.document),
            focus: self.focus,
            mutations: transition.mutations,
        })
    }

    /// Current state without any mutations attached
    pub fn snapshot(&self) -> Change {
        Change {
            version: self.version,
            document: Arc::clone(&self.document),
            focus: self.focus,
            mutations: Vec::new(),
        }
    }
}
