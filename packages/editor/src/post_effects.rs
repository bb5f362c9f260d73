//! # Post-Effect System
//!
//! Some edits need a follow-up change so the new focus target lands on a
//! field that actually exists. Post-effects inspect the document and focus
//! produced by a command and return secondary mutations, which are applied
//! inside the same transition.
//!
//! Post-effects are:
//! - **Deterministic**: same focus and document always produce same effects
//! - **Minimal**: only generate necessary secondary mutations

use crate::document::{ItemPatch, ListDocument};
use crate::focus::{FocusTarget, ItemField};
use crate::mutations::Mutation;

/// Follow-up rule applied after a command settles focus
pub trait PostEffect: std::fmt::Debug + Send + Sync {
    fn analyze(&self, focus: &FocusTarget, doc: &ListDocument) -> Vec<Mutation>;
}

/// Show a hidden description field when focus moves onto it
#[derive(Debug)]
pub struct RevealFocusedDescription;

impl PostEffect for RevealFocusedDescription {
    fn analyze(&self, focus: &FocusTarget, doc: &ListDocument) -> Vec<Mutation> {
        let FocusTarget::Field {
            field: ItemField::Description,
            ..
        } = focus
        else {
            return vec![];
        };

        match focus.item_ref() {
            Some(target) if doc.item(target).map_or(false, |i| i.description.is_none()) => {
                vec![Mutation::SetItemField {
                    item: target,
                    patch: ItemPatch::default().description(Some(String::new())),
                }]
            }
            _ => vec![],
        }
    }
}

/// Runs every registered effect
#[derive(Debug)]
pub struct PostEffectEngine {
    effects: Vec<Box<dyn PostEffect>>,
}

impl Default for PostEffectEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PostEffectEngine {
    /// Create engine with default effects
    pub fn new() -> Self {
        Self {
            effects: vec![Box::new(RevealFocusedDescription)],
        }
    }

    /// Create engine with no effects
    pub fn empty() -> Self {
        Self { effects: vec![] }
    }

    pub fn register(&mut self, effect: Box<dyn PostEffect>) {
        self.effects.push(effect);
    }

    /// Collect secondary mutations from every effect
    pub fn analyze(&self, focus: &FocusTarget, doc: &ListDocument) -> Vec<Mutation> {
        let mut secondary_mutations = Vec::new();

        for effect in &self.effects {
            let mut effect_mutations = effect.analyze(focus, doc);
            secondary_mutations.append(&mut effect_mutations);
        }

        secondary_mutations
    }
}
