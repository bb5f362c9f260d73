//! # Focus Controller
//!
//! Tracks which field holds editing attention and where it goes after an
//! edit. Focus placement is a pure function of the command, the current
//! target and the snapshots before and after the edit, so it can be tested
//! without any view attached.
//!
//! ## Transitions
//!
//! ```text
//! SectionTitle(s)          commit       → Field(s, 0, Name)
//! SectionTitle(s) empty    deleteEmpty  → last merged item's Description
//! Field(c, i, Name)        commit       → Field(c, i, Description)
//! Field(c, i, Name) empty  deleteEmpty  → SectionTitle(c) if i == 0
//!                                         else Field(c, i-1, Description)
//! Field(c, i, Desc)        commit       → Field(c, i+1, Name)
//! Field(c, i, Desc) empty  deleteEmpty  → Field(c, i, Name)
//! Field(c, i, _)           createSection→ SectionTitle(new section)
//! ```

use crate::document::{ContainerRef, ItemRef, ListDocument};
use crate::processor::EditCommand;
use serde::{Deserialize, Serialize};

/// Editable text field of an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ItemField {
    Name,
    Description,
}

/// The field currently holding editing attention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FocusTarget {
    #[default]
    None,
    SectionTitle(usize),
    Field {
        container: ContainerRef,
        item: usize,
        field: ItemField,
    },
}

impl FocusTarget {
    pub fn name(container: ContainerRef, item: usize) -> Self {
        FocusTarget::Field {
            container,
            item,
            field: ItemField::Name,
        }
    }

    pub fn description(container: ContainerRef, item: usize) -> Self {
        FocusTarget::Field {
            container,
            item,
            field: ItemField::Description,
        }
    }

    /// The focused item, if focus is on an item field
    pub fn item_ref(&self) -> Option<ItemRef> {
        match self {
            FocusTarget::Field { container, item, .. } => Some(ItemRef::new(*container, *item)),
            _ => None,
        }
    }

    /// The section owning the focused field, if any
    pub fn section_index(&self) -> Option<usize> {
        match self {
            FocusTarget::SectionTitle(section) => Some(*section),
            FocusTarget::Field { container, .. } => container.section_index(),
            FocusTarget::None => None,
        }
    }

    /// True if the target addresses something that exists in `doc`
    pub fn resolves(&self, doc: &ListDocument) -> bool {
        match self {
            FocusTarget::None => true,
            FocusTarget::SectionTitle(section) => doc.section(*section).is_some(),
            FocusTarget::Field { .. } => self.item_ref().and_then(|r| doc.item(r)).is_some(),
        }
    }

    /// The first editable field of `doc`, used when a session opens
    pub fn first(doc: &ListDocument) -> Self {
        if !doc.unsectioned_items().is_empty() {
            FocusTarget::name(ContainerRef::Unsectioned, 0)
        } else if !doc.sections().is_empty() {
            FocusTarget::SectionTitle(0)
        } else {
            FocusTarget::None
        }
    }
}

/// Compute focus after `command` turned `before` into `after`
pub fn next_focus(
    command: &EditCommand,
    current: &FocusTarget,
    before: &ListDocument,
    after: &ListDocument,
) -> FocusTarget {
    let target = match (command, *current) {
        (EditCommand::TapFocus(target), _) => *target,

        (EditCommand::Commit, FocusTarget::SectionTitle(section)) => {
            FocusTarget::name(ContainerRef::Section(section), 0)
        }
        (
            EditCommand::Commit,
            FocusTarget::Field {
                container,
                item,
                field: ItemField::Name,
            },
        ) => FocusTarget::description(container, item),
        (
            EditCommand::Commit,
            FocusTarget::Field {
                container,
                item,
                field: ItemField::Description,
            },
        ) => FocusTarget::name(container, item + 1),

        (EditCommand::DeleteEmpty, FocusTarget::SectionTitle(section))
        | (EditCommand::DeleteSection, FocusTarget::SectionTitle(section))
        | (
            EditCommand::DeleteSection,
            FocusTarget::Field {
                container: ContainerRef::Section(section),
                ..
            },
        ) => after_merge(section, before, after),
        (
            EditCommand::DeleteEmpty,
            FocusTarget::Field {
                container,
                item,
                field: ItemField::Name,
            },
        ) => after_item_removed(container, item, after),
        (
            EditCommand::DeleteEmpty,
            FocusTarget::Field {
                container,
                item,
                field: ItemField::Description,
            },
        ) => FocusTarget::name(container, item),

        (EditCommand::CreateSection, FocusTarget::Field { container, .. }) => {
            FocusTarget::SectionTitle(container.section_index().map_or(0, |s| s + 1))
        }
        (EditCommand::CreateSection, FocusTarget::None) => after
            .sections()
            .len()
            .checked_sub(1)
            .map_or(FocusTarget::None, FocusTarget::SectionTitle),

        _ => retarget(current, before, after),
    };

    if target.resolves(after) {
        target
    } else {
        FocusTarget::None
    }
}

fn after_item_removed(container: ContainerRef, index: usize, after: &ListDocument) -> FocusTarget {
    if index > 0 {
        return FocusTarget::description(container, index - 1);
    }

    match container {
        ContainerRef::Section(section) => FocusTarget::SectionTitle(section),
        ContainerRef::Unsectioned if !after.unsectioned_items().is_empty() => {
            FocusTarget::name(ContainerRef::Unsectioned, 0)
        }
        ContainerRef::Unsectioned if !after.sections().is_empty() => FocusTarget::SectionTitle(0),
        ContainerRef::Unsectioned => FocusTarget::None,
    }
}

fn after_merge(section: usize, before: &ListDocument, after: &ListDocument) -> FocusTarget {
    let into = ContainerRef::predecessor_of(section);
    let before_len = before.container(into).map_or(0, <[_]>::len);
    let merged = before.section(section).map_or(0, |s| s.items.len());

    if merged > 0 {
        return FocusTarget::description(into, before_len + merged - 1);
    }

    let after_len = after.container(into).map_or(0, <[_]>::len);
    if after_len > 0 {
        return FocusTarget::description(into, after_len - 1);
    }

    match into {
        ContainerRef::Section(previous) => FocusTarget::SectionTitle(previous),
        ContainerRef::Unsectioned if !after.sections().is_empty() => FocusTarget::SectionTitle(0),
        ContainerRef::Unsectioned => FocusTarget::None,
    }
}

/// Keep focus on the same entity, wherever it moved to
fn retarget(current: &FocusTarget, before: &ListDocument, after: &ListDocument) -> FocusTarget {
    match *current {
        FocusTarget::None => FocusTarget::None,
        FocusTarget::SectionTitle(section) => before
            .section(section)
            .and_then(|s| after.locate_section(s.id))
            .map_or(FocusTarget::None, FocusTarget::SectionTitle),
        FocusTarget::Field { container, item, field } => before
            .item(ItemRef::new(container, item))
            .and_then(|i| after.locate_item(i.id))
            .map_or(FocusTarget::None, |r| FocusTarget::Field {
                container: r.container,
                item: r.index,
                field,
            }),
    }
}
