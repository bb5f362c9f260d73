//! # Structural Mutations
//!
//! Primitive edits of a [`ListDocument`].
//!
//! ## Design Principles
//!
//! 1. **Atomic**: every reference is checked before anything is touched, so a
//!    refused mutation leaves the document exactly as it was
//! 2. **Positional**: containers and items are addressed by index; indices
//!    must be resolved against the latest snapshot before each mutation
//! 3. **Transfer, never copy**: moving an item removes it from its source
//!    before inserting it at the destination
//!
//! ## Mutation Semantics
//!
//! ### SplitSection
//! - Items after `item_index` leave their container, in order, and become the
//!   items of a new untitled section
//! - The new section lands right after the source section, or first when the
//!   source was the unsectioned bucket
//!
//! ### MergeSectionIntoPredecessor
//! - Items are appended to the previous section, or to the unsectioned
//!   bucket for the first section
//! - The section itself is dropped
//!
//! ### Emptied lists
//! - `apply` never re-seeds a list left with no sections and no items; the
//!   processor records that as an explicit `InsertItem`, so replaying a
//!   change's mutations reproduces its document exactly
//!
//! ### RemoveItem
//! - Refused with `CannotRemoveLastItem` when the list holds one item and no
//!   sections

use crate::document::{ContainerRef, Item, ItemPatch, ItemRef, ListDocument, Section, Visibility};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Primitive edits of a list document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Mutation {
    /// Insert a section at `index`, or append it
    AddSection {
        section: Section,
        index: Option<usize>,
    },

    /// Drop a section together with its items
    RemoveSection {
        index: usize,
    },

    /// Move items after `item_index` into a new section
    SplitSection {
        container: ContainerRef,
        item_index: usize,
    },

    /// Append a section's items onto the preceding container
    MergeSectionIntoPredecessor {
        index: usize,
    },

    InsertItem {
        container: ContainerRef,
        item: Item,
        index: Option<usize>,
    },

    RemoveItem {
        container: ContainerRef,
        index: usize,
    },

    /// Transfer an item; `to.index` is measured after removal from `from`
    MoveItem {
        from: ItemRef,
        to: ItemRef,
    },

    SetItemField {
        item: ItemRef,
        patch: ItemPatch,
    },

    SetListName {
        name: String,
    },

    SetListEmoji {
        emoji: Option<String>,
    },

    SetVisibility {
        visibility: Visibility,
    },

    SetSectionName {
        index: usize,
        name: String,
    },

    SetSectionEmoji {
        index: usize,
        emoji: Option<String>,
    },
}

/// Reasons a structural edit is refused
///
/// These indicate a race between the view and the engine. They are handled
/// by refusing the edit and keeping the document unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructuralError {
    #[error("Index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Item not found: {0}")]
    ItemNotFound(ItemRef),

    #[error("Cannot remove the last item of a list")]
    CannotRemoveLastItem,

    #[error("Stale reference: {0}")]
    StaleReference(String),

    #[error("Field is not empty")]
    FieldNotEmpty,

    #[error("Duplicate id: {0}")]
    DuplicateId(String),
}

pub type StructuralResult<T> = Result<T, StructuralError>;

/// Where merged items landed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeResult {
    /// Container the items were appended to
    pub into: ContainerRef,
    /// Index of the first appended item in `into`
    pub first_index: usize,
    /// Number of items appended
    pub count: usize,
}

impl MergeResult {
    /// Index of the last appended item, if any were appended
    pub fn last_index(&self) -> Option<usize> {
        (self.count > 0).then(|| self.first_index + self.count - 1)
    }
}

/// What a mutation produced, for callers that need the affected entity
#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutcome {
    Updated,
    SectionAdded(usize),
    SectionRemoved(Section),
    SectionSplit(usize),
    SectionMerged(MergeResult),
    ItemInserted(ItemRef),
    ItemRemoved(Item),
    ItemMoved(ItemRef),
}

impl Mutation {
    /// Apply mutation to the document in place
    pub fn apply(&self, doc: &mut ListDocument) -> StructuralResult<MutationOutcome> {
        match self {
            Mutation::AddSection { section, index } => doc
                .insert_section_in_place(section.clone(), *index)
                .map(MutationOutcome::SectionAdded),

            Mutation::RemoveSection { index } => doc
                .remove_section_in_place(*index)
                .map(MutationOutcome::SectionRemoved),

            Mutation::SplitSection { container, item_index } => doc
                .split_in_place(*container, *item_index)
                .map(MutationOutcome::SectionSplit),

            Mutation::MergeSectionIntoPredecessor { index } => doc
                .merge_in_place(*index)
                .map(MutationOutcome::SectionMerged),

            Mutation::InsertItem { container, item, index } => doc
                .insert_item_in_place(*container, item.clone(), *index)
                .map(MutationOutcome::ItemInserted),

            Mutation::RemoveItem { container, index } => doc
                .remove_item_in_place(*container, *index)
                .map(MutationOutcome::ItemRemoved),

            Mutation::MoveItem { from, to } => doc
                .move_item_in_place(*from, *to)
                .map(MutationOutcome::ItemMoved),

            Mutation::SetItemField { item, patch } => doc
                .patch_item_in_place(*item, patch)
                .map(|_| MutationOutcome::Updated),

            Mutation::SetListName { name } => {
                doc.name = name.clone();
                Ok(MutationOutcome::Updated)
            }

            Mutation::SetListEmoji { emoji } => {
                doc.emoji = emoji.clone();
                Ok(MutationOutcome::Updated)
            }

            Mutation::SetVisibility { visibility } => {
                doc.visibility = *visibility;
                Ok(MutationOutcome::Updated)
            }

            Mutation::SetSectionName { index, name } => {
                doc.section_mut(*index)?.name = name.clone();
                Ok(MutationOutcome::Updated)
            }

            Mutation::SetSectionEmoji { index, emoji } => {
                doc.section_mut(*index)?.emoji = emoji.clone();
                Ok(MutationOutcome::Updated)
            }
        }
    }

    /// Debug name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Mutation::AddSection { .. } => "add_section",
            Mutation::RemoveSection { .. } => "remove_section",
            Mutation::SplitSection { .. } => "split_section",
            Mutation::MergeSectionIntoPredecessor { .. } => "merge_section",
            Mutation::InsertItem { .. } => "insert_item",
            Mutation::RemoveItem { .. } => "remove_item",
            Mutation::MoveItem { .. } => "move_item",
            Mutation::SetItemField { .. } => "set_item_field",
            Mutation::SetListName { .. } => "set_list_name",
            Mutation::SetListEmoji { .. } => "set_list_emoji",
            Mutation::SetVisibility { .. } => "set_visibility",
            Mutation::SetSectionName { .. } => "set_section_name",
            Mutation::SetSectionEmoji { .. } => "set_section_emoji",
        }
    }

    /// True if the mutation changes which containers or items exist
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Mutation::AddSection { .. }
                | Mutation::RemoveSection { .. }
                | Mutation::SplitSection { .. }
                | Mutation::MergeSectionIntoPredecessor { .. }
                | Mutation::InsertItem { .. }
                | Mutation::RemoveItem { .. }
                | Mutation::MoveItem { .. }
        )
    }
}

/// In-place primitives. Each one validates fully before changing anything.
impl ListDocument {
    fn section_mut(&mut self, index: usize) -> StructuralResult<&mut Section> {
        let len = self.sections.len();
        self.sections
            .get_mut(index)
            .ok_or(StructuralError::IndexOutOfRange { index, len })
    }

    fn container_len(&self, container: ContainerRef) -> StructuralResult<usize> {
        self.container(container)
            .map(<[Item]>::len)
            .ok_or_else(|| StructuralError::StaleReference(format!("no {}", container)))
    }

    fn container_mut(&mut self, container: ContainerRef) -> StructuralResult<&mut Vec<Item>> {
        match container {
            ContainerRef::Unsectioned => Ok(&mut self.unsectioned_items),
            ContainerRef::Section(index) => self
                .sections
                .get_mut(index)
                .map(|s| &mut s.items)
                .ok_or_else(|| StructuralError::StaleReference(format!("no {}", container))),
        }
    }

    fn check_item_id_free(&self, item: &Item) -> StructuralResult<()> {
        match self.locate_item(item.id) {
            Some(_) => Err(StructuralError::DuplicateId(item.id.to_string())),
            None => Ok(()),
        }
    }

    pub(crate) fn insert_section_in_place(
        &mut self,
        section: Section,
        at: Option<usize>,
    ) -> StructuralResult<usize> {
        let len = self.sections.len();
        let index = at.unwrap_or(len);
        if index > len {
            return Err(StructuralError::IndexOutOfRange { index, len });
        }
        if self.locate_section(section.id).is_some() {
            return Err(StructuralError::DuplicateId(section.id.to_string()));
        }
        for item in &section.items {
            self.check_item_id_free(item)?;
        }

        self.sections.insert(index, section);
        Ok(index)
    }

    pub(crate) fn remove_section_in_place(&mut self, index: usize) -> StructuralResult<Section> {
        let len = self.sections.len();
        if index >= len {
            return Err(StructuralError::IndexOutOfRange { index, len });
        }

        Ok(self.sections.remove(index))
    }

    pub(crate) fn split_in_place(
        &mut self,
        container: ContainerRef,
        item_index: usize,
    ) -> StructuralResult<usize> {
        let len = self.container_len(container)?;
        if item_index >= len {
            return Err(StructuralError::ItemNotFound(ItemRef::new(container, item_index)));
        }

        let tail = self.container_mut(container)?.split_off(item_index + 1);
        let new_index = match container {
            ContainerRef::Unsectioned => 0,
            ContainerRef::Section(index) => index + 1,
        };
        self.sections
            .insert(new_index, Section::with_items(String::new(), tail));
        Ok(new_index)
    }

    pub(crate) fn merge_in_place(&mut self, section_index: usize) -> StructuralResult<MergeResult> {
        let len = self.sections.len();
        if section_index >= len {
            return Err(StructuralError::IndexOutOfRange {
                index: section_index,
                len,
            });
        }

        let into = ContainerRef::predecessor_of(section_index);
        let section = self.sections.remove(section_index);
        let target = self.container_mut(into)?;
        let first_index = target.len();
        let count = section.items.len();
        target.extend(section.items);

        Ok(MergeResult {
            into,
            first_index,
            count,
        })
    }

    pub(crate) fn insert_item_in_place(
        &mut self,
        container: ContainerRef,
        item: Item,
        at: Option<usize>,
    ) -> StructuralResult<ItemRef> {
        let len = self.container_len(container)?;
        let index = at.unwrap_or(len);
        if index > len {
            return Err(StructuralError::IndexOutOfRange { index, len });
        }
        self.check_item_id_free(&item)?;

        self.container_mut(container)?.insert(index, item);
        Ok(ItemRef::new(container, index))
    }

    pub(crate) fn remove_item_in_place(
        &mut self,
        container: ContainerRef,
        index: usize,
    ) -> StructuralResult<Item> {
        let len = self.container_len(container)?;
        if index >= len {
            return Err(StructuralError::ItemNotFound(ItemRef::new(container, index)));
        }
        if self.sections.is_empty() && self.item_count() == 1 {
            return Err(StructuralError::CannotRemoveLastItem);
        }

        Ok(self.container_mut(container)?.remove(index))
    }

    pub(crate) fn move_item_in_place(&mut self, from: ItemRef, to: ItemRef) -> StructuralResult<ItemRef> {
        let from_len = self.container_len(from.container)?;
        if from.index >= from_len {
            return Err(StructuralError::ItemNotFound(from));
        }
        let to_len = self.container_len(to.container)?;
        let to_len_after = if to.container == from.container {
            to_len - 1
        } else {
            to_len
        };
        if to.index > to_len_after {
            return Err(StructuralError::IndexOutOfRange {
                index: to.index,
                len: to_len_after,
            });
        }

        let item = self.container_mut(from.container)?.remove(from.index);
        self.container_mut(to.container)?.insert(to.index, item);
        Ok(to)
    }

    pub(crate) fn patch_item_in_place(&mut self, item: ItemRef, patch: &ItemPatch) -> StructuralResult<()> {
        let target = self
            .container_mut(item.container)?
            .get_mut(item.index)
            .ok_or(StructuralError::ItemNotFound(item))?;
        patch.apply_to(target);
        Ok(())
    }
}
