//! # Edit Command Processor
//!
//! Turns field-level events from a view (Enter, Backspace on an empty field,
//! toolbar buttons, typed text) into one atomic transition:
//!
//! 1. Resolve the focused field against the latest snapshot
//! 2. Plan the primitive mutations the command implies
//! 3. Apply them to a working copy
//! 4. Compute the next focus target
//! 5. Apply post-effects for the new focus
//!
//! Nothing is published unless every step succeeds.

use crate::document::{ContainerRef, Item, ItemPatch, ItemRef, ListDocument, PriceTier, Section, Visibility};
use crate::focus::{self, FocusTarget, ItemField};
use crate::mutations::{Mutation, StructuralError, StructuralResult};
use crate::post_effects::PostEffectEngine;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Events a view routes into the editor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EditCommand {
    /// Enter: finish this field and advance
    Commit,

    /// Backspace on an already-empty field
    DeleteEmpty,

    /// Start a new section after the focused item
    CreateSection,

    /// Fold the focused section into the container above it
    DeleteSection,

    ToggleStar,

    SetPrice(Option<PriceTier>),

    /// Replace the text of the focused field
    SetText(String),

    /// Move focus without editing
    TapFocus(FocusTarget),

    /// Drag-and-drop reordering
    MoveItem { from: ItemRef, to: ItemRef },

    SetListName(String),

    SetListEmoji(Option<String>),

    SetVisibility(Visibility),

    /// Set the emoji of the focused section
    SetSectionEmoji(Option<String>),
}

impl EditCommand {
    /// Parse a JSON array of commands
    pub fn parse_script(source: &str) -> Result<Vec<EditCommand>, serde_json::Error> {
        serde_json::from_str(source)
    }
}

/// Result of processing one command
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub document: ListDocument,
    pub focus: FocusTarget,
    /// Primitive mutations applied, in order
    pub mutations: Vec<Mutation>,
}

/// Interprets edit commands against a document and focus target
#[derive(Debug)]
pub struct EditCommandProcessor {
    effects: PostEffectEngine,
}

impl Default for EditCommandProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl EditCommandProcessor {
    pub fn new() -> Self {
        Self {
            effects: PostEffectEngine::new(),
        }
    }

    pub fn with_effects(effects: PostEffectEngine) -> Self {
        Self { effects }
    }

    /// Compute the transition for `command`, or refuse it
    pub fn process(
        &self,
        doc: &ListDocument,
        focus: &FocusTarget,
        command: &EditCommand,
    ) -> StructuralResult<Transition> {
        let mut mutations = self.plan(doc, focus, command)?;

        let mut next = doc.clone();
        for mutation in &mutations {
            mutation.apply(&mut next)?;
        }

        // An emptied list gets its placeholder back as a recorded mutation
        if next.sections().is_empty() && next.item_count() == 0 {
            let reseed = Mutation::InsertItem {
                container: ContainerRef::Unsectioned,
                item: Item::empty(),
                index: None,
            };
            reseed.apply(&mut next)?;
            mutations.push(reseed);
        }

        let next_focus = focus::next_focus(command, focus, doc, &next);

        for effect in self.effects.analyze(&next_focus, &next) {
            effect.apply(&mut next)?;
            mutations.push(effect);
        }

        debug!(
            list_id = %doc.id(),
            ?command,
            ?next_focus,
            mutations = mutations.len(),
            "processed edit command"
        );

        Ok(Transition {
            document: next,
            focus: next_focus,
            mutations,
        })
    }

    fn plan(
        &self,
        doc: &ListDocument,
        focus: &FocusTarget,
        command: &EditCommand,
    ) -> StructuralResult<Vec<Mutation>> {
        match command {
            EditCommand::Commit => plan_commit(doc, focus),
            EditCommand::DeleteEmpty => plan_delete_empty(doc, focus),

            EditCommand::CreateSection => match focus {
                FocusTarget::Field { container, item, .. } => {
                    resolve_item(doc, focus)?;
                    Ok(vec![Mutation::SplitSection {
                        container: *container,
                        item_index: *item,
                    }])
                }
                FocusTarget::None => Ok(vec![Mutation::AddSection {
                    section: Section::new(String::new()),
                    index: None,
                }]),
                FocusTarget::SectionTitle(_) => Err(StructuralError::StaleReference(
                    "creating a section needs a focused item".to_string(),
                )),
            },

            EditCommand::DeleteSection => {
                let index = resolve_section(doc, focus)?;
                Ok(vec![Mutation::MergeSectionIntoPredecessor { index }])
            }

            EditCommand::ToggleStar => {
                let (target, item) = resolve_item(doc, focus)?;
                Ok(vec![Mutation::SetItemField {
                    item: target,
                    patch: ItemPatch::default().starred(!item.is_starred),
                }])
            }

            EditCommand::SetPrice(price) => {
                let (target, _) = resolve_item(doc, focus)?;
                Ok(vec![Mutation::SetItemField {
                    item: target,
                    patch: ItemPatch::default().price(*price),
                }])
            }

            EditCommand::SetText(text) => match focus {
                FocusTarget::SectionTitle(_) => {
                    let index = resolve_section(doc, focus)?;
                    Ok(vec![Mutation::SetSectionName {
                        index,
                        name: text.clone(),
                    }])
                }
                FocusTarget::Field { field, .. } => {
                    let (target, _) = resolve_item(doc, focus)?;
                    let patch = match field {
                        ItemField::Name => ItemPatch::default().name(text.clone()),
                        ItemField::Description => ItemPatch::default().description(Some(text.clone())),
                    };
                    Ok(vec![Mutation::SetItemField { item: target, patch }])
                }
                FocusTarget::None => Err(no_focus()),
            },

            EditCommand::TapFocus(target) => {
                if target.resolves(doc) {
                    Ok(vec![])
                } else {
                    Err(StructuralError::StaleReference(format!("{:?}", target)))
                }
            }

            EditCommand::MoveItem { from, to } => Ok(vec![Mutation::MoveItem {
                from: *from,
                to: *to,
            }]),

            EditCommand::SetListName(name) => Ok(vec![Mutation::SetListName { name: name.clone() }]),

            EditCommand::SetListEmoji(emoji) => Ok(vec![Mutation::SetListEmoji {
                emoji: emoji.clone(),
            }]),

            EditCommand::SetVisibility(visibility) => Ok(vec![Mutation::SetVisibility {
                visibility: *visibility,
            }]),

            EditCommand::SetSectionEmoji(emoji) => {
                let index = resolve_section(doc, focus)?;
                Ok(vec![Mutation::SetSectionEmoji {
                    index,
                    emoji: emoji.clone(),
                }])
            }
        }
    }
}

fn plan_commit(doc: &ListDocument, focus: &FocusTarget) -> StructuralResult<Vec<Mutation>> {
    match focus {
        FocusTarget::SectionTitle(_) => {
            let index = resolve_section(doc, focus)?;
            let empty = doc.section(index).map_or(true, |s| s.items.is_empty());
            if empty {
                Ok(vec![Mutation::InsertItem {
                    container: ContainerRef::Section(index),
                    item: Item::empty(),
                    index: Some(0),
                }])
            } else {
                Ok(vec![])
            }
        }

        FocusTarget::Field {
            field: ItemField::Name,
            ..
        } => {
            let (target, item) = resolve_item(doc, focus)?;
            if item.description.is_none() {
                Ok(vec![Mutation::SetItemField {
                    item: target,
                    patch: ItemPatch::default().description(Some(String::new())),
                }])
            } else {
                Ok(vec![])
            }
        }

        FocusTarget::Field {
            field: ItemField::Description,
            ..
        } => {
            let (target, _) = resolve_item(doc, focus)?;
            let len = doc.container(target.container).map_or(0, <[Item]>::len);
            if target.index + 1 == len {
                Ok(vec![Mutation::InsertItem {
                    container: target.container,
                    item: Item::empty(),
                    index: Some(target.index + 1),
                }])
            } else {
                Ok(vec![])
            }
        }

        FocusTarget::None => Err(no_focus()),
    }
}

fn plan_delete_empty(doc: &ListDocument, focus: &FocusTarget) -> StructuralResult<Vec<Mutation>> {
    match focus {
        FocusTarget::SectionTitle(_) => {
            let index = resolve_section(doc, focus)?;
            if doc.section(index).map_or(false, |s| !s.name.is_empty()) {
                return Err(StructuralError::FieldNotEmpty);
            }
            Ok(vec![Mutation::MergeSectionIntoPredecessor { index }])
        }

        FocusTarget::Field {
            field: ItemField::Name,
            ..
        } => {
            let (target, item) = resolve_item(doc, focus)?;
            if !item.name.is_empty() {
                return Err(StructuralError::FieldNotEmpty);
            }
            // the only item anywhere stays, whatever sections exist
            if doc.item_count() == 1 {
                return Err(StructuralError::CannotRemoveLastItem);
            }
            Ok(vec![Mutation::RemoveItem {
                container: target.container,
                index: target.index,
            }])
        }

        FocusTarget::Field {
            field: ItemField::Description,
            ..
        } => {
            let (target, item) = resolve_item(doc, focus)?;
            if item.description.as_deref().map_or(false, |d| !d.is_empty()) {
                return Err(StructuralError::FieldNotEmpty);
            }
            Ok(vec![Mutation::SetItemField {
                item: target,
                patch: ItemPatch::default().description(None),
            }])
        }

        FocusTarget::None => Err(no_focus()),
    }
}

fn no_focus() -> StructuralError {
    StructuralError::StaleReference("no focused field".to_string())
}

fn resolve_item<'a>(doc: &'a ListDocument, focus: &FocusTarget) -> StructuralResult<(ItemRef, &'a Item)> {
    let target = focus.item_ref().ok_or_else(no_focus)?;
    doc.item(target)
        .map(|item| (target, item))
        .ok_or_else(|| StructuralError::StaleReference(format!("no item at {}", target)))
}

fn resolve_section(doc: &ListDocument, focus: &FocusTarget) -> StructuralResult<usize> {
    let index = focus.section_index().ok_or_else(|| {
        StructuralError::StaleReference("focus is not inside a section".to_string())
    })?;
    doc.section(index)
        .map(|_| index)
        .ok_or_else(|| StructuralError::StaleReference(format!("no section {}", index)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reclist_common::{ListId, UserId};

    fn doc_with(sections: Vec<Section>, unsectioned: Vec<Item>) -> ListDocument {
        ListDocument::from_parts(
            ListId::new(),
            "Processor".to_string(),
            UserId::new(),
            None,
            Visibility::Global,
            sections,
            unsectioned,
        )
        .unwrap()
    }

    fn process(doc: &ListDocument, focus: FocusTarget, command: EditCommand) -> StructuralResult<Transition> {
        EditCommandProcessor::new().process(doc, &focus, &command)
    }

    #[test]
    fn test_delete_empty_keeps_only_item_inside_section() {
        let doc = doc_with(vec![Section::with_items("S", vec![Item::empty()])], vec![]);
        let focus = FocusTarget::name(ContainerRef::Section(0), 0);

        let err = process(&doc, focus, EditCommand::DeleteEmpty).unwrap_err();

        assert_eq!(err, StructuralError::CannotRemoveLastItem);
    }

    #[test]
    fn test_removing_last_section_records_reseed() {
        let doc = doc_with(vec![Section::new("")], vec![]);
        let t = process(&doc, FocusTarget::SectionTitle(0), EditCommand::DeleteEmpty).unwrap();

        assert!(t.document.is_placeholder());
        assert!(matches!(
            t.mutations.last(),
            Some(Mutation::InsertItem { container: ContainerRef::Unsectioned, index: None, .. })
        ));

        // replaying the recorded mutations reproduces the document
        let mut replayed = doc.clone();
        for mutation in &t.mutations {
            mutation.apply(&mut replayed).unwrap();
        }
        assert_eq!(replayed, t.document);
    }

    #[test]
    fn test_commit_on_name_reveals_description() {
        let doc = doc_with(vec![], vec![Item::named("x")]);
        let t = process(&doc, FocusTarget::name(ContainerRef::Unsectioned, 0), EditCommand::Commit).unwrap();

        assert_eq!(t.focus, FocusTarget::description(ContainerRef::Unsectioned, 0));
        assert_eq!(
            t.document.item(ItemRef::unsectioned(0)).unwrap().description.as_deref(),
            Some("")
        );
    }

    #[test]
    fn test_commit_on_existing_description_keeps_text() {
        let doc = doc_with(vec![], vec![Item::named("x").with_description("kept")]);
        let t = process(&doc, FocusTarget::name(ContainerRef::Unsectioned, 0), EditCommand::Commit).unwrap();

        assert!(t.mutations.is_empty());
        assert_eq!(
            t.document.item(ItemRef::unsectioned(0)).unwrap().description.as_deref(),
            Some("kept")
        );
    }

    #[test]
    fn test_commit_on_last_description_appends_item() {
        let doc = doc_with(
            vec![Section::with_items("S", vec![Item::named("a").with_description("d")])],
            vec![],
        );
        let focus = FocusTarget::description(ContainerRef::Section(0), 0);
        let t = process(&doc, focus, EditCommand::Commit).unwrap();

        assert_eq!(t.document.sections()[0].items.len(), 2);
        assert!(t.document.sections()[0].items[1].is_blank());
        assert_eq!(t.focus, FocusTarget::name(ContainerRef::Section(0), 1));
    }

    #[test]
    fn test_commit_on_middle_description_moves_to_next_item() {
        let doc = doc_with(vec![], vec![Item::named("a").with_description(""), Item::named("b")]);
        let focus = FocusTarget::description(ContainerRef::Unsectioned, 0);
        let t = process(&doc, focus, EditCommand::Commit).unwrap();

        assert_eq!(t.document.item_count(), 2);
        assert_eq!(t.focus, FocusTarget::name(ContainerRef::Unsectioned, 1));
    }

    #[test]
    fn test_commit_on_empty_section_title_creates_first_item() {
        let doc = doc_with(vec![Section::new("Coffee")], vec![Item::named("a")]);
        let t = process(&doc, FocusTarget::SectionTitle(0), EditCommand::Commit).unwrap();

        assert_eq!(t.document.sections()[0].items.len(), 1);
        assert_eq!(t.focus, FocusTarget::name(ContainerRef::Section(0), 0));
    }

    #[test]
    fn test_delete_empty_refuses_non_empty_name() {
        let doc = doc_with(vec![], vec![Item::named("a"), Item::named("b")]);
        let err = process(
            &doc,
            FocusTarget::name(ContainerRef::Unsectioned, 1),
            EditCommand::DeleteEmpty,
        )
        .unwrap_err();
        assert_eq!(err, StructuralError::FieldNotEmpty);
    }

    #[test]
    fn test_delete_empty_on_sole_item_is_refused() {
        let doc = ListDocument::new(UserId::new());
        let err = process(
            &doc,
            FocusTarget::name(ContainerRef::Unsectioned, 0),
            EditCommand::DeleteEmpty,
        )
        .unwrap_err();
        assert_eq!(err, StructuralError::CannotRemoveLastItem);
    }

    #[test]
    fn test_delete_empty_description_hides_field() {
        let doc = doc_with(vec![], vec![Item::named("a").with_description("")]);
        let t = process(
            &doc,
            FocusTarget::description(ContainerRef::Unsectioned, 0),
            EditCommand::DeleteEmpty,
        )
        .unwrap();

        assert_eq!(t.document.item(ItemRef::unsectioned(0)).unwrap().description, None);
        assert_eq!(t.focus, FocusTarget::name(ContainerRef::Unsectioned, 0));
    }

    #[test]
    fn test_removed_item_reveals_previous_description() {
        let doc = doc_with(vec![], vec![Item::named("x"), Item::empty()]);
        let t = process(
            &doc,
            FocusTarget::name(ContainerRef::Unsectioned, 1),
            EditCommand::DeleteEmpty,
        )
        .unwrap();

        assert_eq!(t.focus, FocusTarget::description(ContainerRef::Unsectioned, 0));
        assert_eq!(
            t.document.item(ItemRef::unsectioned(0)).unwrap().description.as_deref(),
            Some("")
        );
    }

    #[test]
    fn test_toggle_star_keeps_focus() {
        let doc = doc_with(vec![], vec![Item::named("a")]);
        let focus = FocusTarget::name(ContainerRef::Unsectioned, 0);
        let t = process(&doc, focus, EditCommand::ToggleStar).unwrap();

        assert!(t.document.item(ItemRef::unsectioned(0)).unwrap().is_starred);
        assert_eq!(t.focus, focus);
    }

    #[test]
    fn test_set_price_without_focus_is_stale() {
        let doc = doc_with(vec![], vec![Item::named("a")]);
        let err = process(&doc, FocusTarget::None, EditCommand::SetPrice(Some(PriceTier::One))).unwrap_err();
        assert!(matches!(err, StructuralError::StaleReference(_)));
    }

    #[test]
    fn test_set_text_on_title_renames_section() {
        let doc = doc_with(vec![Section::new("")], vec![Item::named("a")]);
        let t = process(
            &doc,
            FocusTarget::SectionTitle(0),
            EditCommand::SetText("Brunch".to_string()),
        )
        .unwrap();

        assert_eq!(t.document.sections()[0].name, "Brunch");
        assert_eq!(t.focus, FocusTarget::SectionTitle(0));
    }

    #[test]
    fn test_create_section_without_focus_appends() {
        let doc = doc_with(vec![Section::new("A")], vec![Item::named("a")]);
        let t = process(&doc, FocusTarget::None, EditCommand::CreateSection).unwrap();

        assert_eq!(t.document.sections().len(), 2);
        assert_eq!(t.focus, FocusTarget::SectionTitle(1));
    }

    #[test]
    fn test_script_parses_commands() {
        let script = r#"["commit", {"setText": "Tacos"}, {"setPrice": "two"}, {"tapFocus": {"sectionTitle": 0}}, "toggleStar"]"#;
        let commands = EditCommand::parse_script(script).unwrap();

        assert_eq!(commands.len(), 5);
        assert_eq!(commands[0], EditCommand::Commit);
        assert_eq!(commands[2], EditCommand::SetPrice(Some(PriceTier::Two)));
        assert_eq!(commands[3], EditCommand::TapFocus(FocusTarget::SectionTitle(0)));
    }
}
