//! # List Document
//!
//! The recommendation list tree: a list holds an ordered sequence of
//! sections, each holding an ordered sequence of items, plus one unsectioned
//! bucket of items that sits above the first section.
//!
//! ## Structure
//!
//! ```text
//! ListDocument
//!   ├─ unsectioned_items: [Item, Item, ...]
//!   └─ sections
//!        ├─ Section { name, emoji, items: [Item, ...] }
//!        └─ Section { ... }
//! ```
//!
//! Snapshots are plain values. Every structural operation here takes `&self`
//! and returns a new snapshot, so a caller holding an older snapshot never
//! observes a half-applied edit. Fields are private: views read through the
//! accessors and change the tree only through these operations or
//! [`Mutation`](crate::Mutation)s.

use crate::mutations::{MergeResult, StructuralError, StructuralResult};
use reclist_common::{IdentityError, IdentityProvider, ItemId, ListId, SectionId, UserId};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Price tier of a recommended item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceTier {
    Free,
    One,
    Two,
    Three,
}

impl PriceTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceTier::Free => "free",
            PriceTier::One => "one",
            PriceTier::Two => "two",
            PriceTier::Three => "three",
        }
    }

    /// Display label used by text front ends
    pub fn symbol(&self) -> &'static str {
        match self {
            PriceTier::Free => "free",
            PriceTier::One => "$",
            PriceTier::Two => "$$",
            PriceTier::Three => "$$$",
        }
    }
}

/// Who can see a list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Global,
    Friends,
    Restricted,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Global => "global",
            Visibility::Friends => "friends",
            Visibility::Restricted => "restricted",
        }
    }
}

/// A single recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    /// `None` hides the description field; `Some("")` shows it empty
    pub description: Option<String>,
    pub price: Option<PriceTier>,
    pub is_starred: bool,
}

impl Item {
    /// A fresh item with every field empty
    pub fn empty() -> Self {
        Self {
            id: ItemId::new(),
            name: String::new(),
            description: None,
            price: None,
            is_starred: false,
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::empty()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// True when the user has entered nothing into this item
    pub fn is_blank(&self) -> bool {
        self.name.is_empty()
            && self.description.as_deref().map_or(true, str::is_empty)
            && self.price.is_none()
            && !self.is_starred
    }
}

/// A titled group of items
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: SectionId,
    pub name: String,
    pub emoji: Option<String>,
    pub items: Vec<Item>,
}

impl Section {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: SectionId::new(),
            name: name.into(),
            emoji: None,
            items: Vec::new(),
        }
    }

    pub fn with_items(name: impl Into<String>, items: Vec<Item>) -> Self {
        Self {
            items,
            ..Self::new(name)
        }
    }
}

/// Addresses one container: the unsectioned bucket or a section by position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContainerRef {
    Unsectioned,
    Section(usize),
}

impl ContainerRef {
    pub fn section_index(&self) -> Option<usize> {
        match self {
            ContainerRef::Unsectioned => None,
            ContainerRef::Section(index) => Some(*index),
        }
    }

    /// Container that a section at `section_index` merges into
    pub fn predecessor_of(section_index: usize) -> Self {
        match section_index {
            0 => ContainerRef::Unsectioned,
            n => ContainerRef::Section(n - 1),
        }
    }
}

impl From<Option<usize>> for ContainerRef {
    fn from(section: Option<usize>) -> Self {
        section.map_or(ContainerRef::Unsectioned, ContainerRef::Section)
    }
}

impl fmt::Display for ContainerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerRef::Unsectioned => write!(f, "unsectioned"),
            ContainerRef::Section(index) => write!(f, "section {}", index),
        }
    }
}

/// Addresses one item by container and position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemRef {
    pub container: ContainerRef,
    pub index: usize,
}

impl ItemRef {
    pub fn new(container: ContainerRef, index: usize) -> Self {
        Self { container, index }
    }

    pub fn unsectioned(index: usize) -> Self {
        Self::new(ContainerRef::Unsectioned, index)
    }

    pub fn in_section(section: usize, index: usize) -> Self {
        Self::new(ContainerRef::Section(section), index)
    }
}

impl fmt::Display for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.container, self.index)
    }
}

/// Partial update of an item's editable fields
///
/// `description: Some(None)` clears the description (hides the field) while
/// `description: Some(Some(""))` shows it empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present_field"
    )]
    pub description: Option<Option<String>>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present_field"
    )]
    pub price: Option<Option<PriceTier>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_starred: Option<bool>,
}

/// Keeps an explicit `null` distinct from an absent field
fn present_field<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl ItemPatch {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = Some(description);
        self
    }

    pub fn price(mut self, price: Option<PriceTier>) -> Self {
        self.price = Some(price);
        self
    }

    pub fn starred(mut self, is_starred: bool) -> Self {
        self.is_starred = Some(is_starred);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.is_starred.is_none()
    }

    pub(crate) fn apply_to(&self, item: &mut Item) {
        if let Some(name) = &self.name {
            item.name = name.clone();
        }
        if let Some(description) = &self.description {
            item.description = description.clone();
        }
        if let Some(price) = self.price {
            item.price = price;
        }
        if let Some(is_starred) = self.is_starred {
            item.is_starred = is_starred;
        }
    }
}

/// A recommendation list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDocument {
    pub(crate) id: ListId,
    pub(crate) name: String,
    pub(crate) creator_id: UserId,
    pub(crate) emoji: Option<String>,
    pub(crate) visibility: Visibility,
    pub(crate) sections: Vec<Section>,
    pub(crate) unsectioned_items: Vec<Item>,
}

impl ListDocument {
    /// Create an empty list owned by `creator_id`
    ///
    /// The list starts with one blank unsectioned item so there is always a
    /// field to focus.
    pub fn new(creator_id: UserId) -> Self {
        Self {
            id: ListId::new(),
            name: String::new(),
            creator_id,
            emoji: None,
            visibility: Visibility::default(),
            sections: Vec::new(),
            unsectioned_items: vec![Item::empty()],
        }
    }

    /// Create an empty list owned by whoever `identity` reports
    pub fn create<P: IdentityProvider + ?Sized>(identity: &P) -> Result<Self, IdentityError> {
        identity.current_user().map(Self::new)
    }

    /// Rebuild a list from stored parts, checking id uniqueness
    pub fn from_parts(
        id: ListId,
        name: String,
        creator_id: UserId,
        emoji: Option<String>,
        visibility: Visibility,
        sections: Vec<Section>,
        unsectioned_items: Vec<Item>,
    ) -> StructuralResult<Self> {
        let mut doc = Self {
            id,
            name,
            creator_id,
            emoji,
            visibility,
            sections,
            unsectioned_items,
        };

        let mut seen = HashSet::new();
        for section in &doc.sections {
            if !seen.insert(*section.id.as_uuid()) {
                return Err(StructuralError::DuplicateId(section.id.to_string()));
            }
        }
        for item in doc.items() {
            if !seen.insert(*item.id.as_uuid()) {
                return Err(StructuralError::DuplicateId(item.id.to_string()));
            }
        }

        doc.ensure_focusable();
        Ok(doc)
    }

    pub fn id(&self) -> ListId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn creator_id(&self) -> UserId {
        self.creator_id
    }

    pub fn emoji(&self) -> Option<&str> {
        self.emoji.as_deref()
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section(&self, index: usize) -> Option<&Section> {
        self.sections.get(index)
    }

    pub fn unsectioned_items(&self) -> &[Item] {
        &self.unsectioned_items
    }

    /// Items of a container, or `None` if the section does not exist
    pub fn container(&self, container: ContainerRef) -> Option<&[Item]> {
        match container {
            ContainerRef::Unsectioned => Some(&self.unsectioned_items),
            ContainerRef::Section(index) => self.sections.get(index).map(|s| s.items.as_slice()),
        }
    }

    pub fn item(&self, item: ItemRef) -> Option<&Item> {
        self.container(item.container)
            .and_then(|items| items.get(item.index))
    }

    /// All items in display order: unsectioned first, then each section
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.unsectioned_items
            .iter()
            .chain(self.sections.iter().flat_map(|s| s.items.iter()))
    }

    pub fn item_count(&self) -> usize {
        self.unsectioned_items.len() + self.sections.iter().map(|s| s.items.len()).sum::<usize>()
    }

    /// Find where an item currently lives
    pub fn locate_item(&self, id: ItemId) -> Option<ItemRef> {
        if let Some(index) = self.unsectioned_items.iter().position(|i| i.id == id) {
            return Some(ItemRef::unsectioned(index));
        }

        self.sections.iter().enumerate().find_map(|(s, section)| {
            section
                .items
                .iter()
                .position(|i| i.id == id)
                .map(|index| ItemRef::in_section(s, index))
        })
    }

    pub fn locate_section(&self, id: SectionId) -> Option<usize> {
        self.sections.iter().position(|s| s.id == id)
    }

    /// True for the freshly created state: one blank unsectioned item and no
    /// sections. Lists in this state are never persisted.
    pub fn is_placeholder(&self) -> bool {
        self.sections.is_empty()
            && self.unsectioned_items.len() == 1
            && self.unsectioned_items[0].is_blank()
    }

    /// Re-seed the placeholder item if the list lost every focusable field
    pub(crate) fn ensure_focusable(&mut self) {
        if self.sections.is_empty() && self.unsectioned_items.is_empty() {
            self.unsectioned_items.push(Item::empty());
        }
    }

    // ------------------------------------------------------------------
    // Snapshot operations
    // ------------------------------------------------------------------

    /// Insert a section at `at`, or append it
    pub fn add_section(&self, section: Section, at: Option<usize>) -> StructuralResult<Self> {
        let mut next = self.clone();
        next.insert_section_in_place(section, at)?;
        Ok(next)
    }

    /// Remove a section and everything in it
    pub fn remove_section(&self, index: usize) -> StructuralResult<(Self, Section)> {
        let mut next = self.clone();
        let removed = next.remove_section_in_place(index)?;
        next.ensure_focusable();
        Ok((next, removed))
    }

    /// Move every item after `item_index` into a new section placed right
    /// after the container. Returns the new section's index.
    pub fn split_section_at(
        &self,
        container: ContainerRef,
        item_index: usize,
    ) -> StructuralResult<(Self, usize)> {
        let mut next = self.clone();
        let index = next.split_in_place(container, item_index)?;
        Ok((next, index))
    }

    /// Append a section's items to the preceding container and drop the section
    pub fn merge_section_into_predecessor(
        &self,
        section_index: usize,
    ) -> StructuralResult<(Self, MergeResult)> {
        let mut next = self.clone();
        let merged = next.merge_in_place(section_index)?;
        next.ensure_focusable();
        Ok((next, merged))
    }

    pub fn insert_item(
        &self,
        container: ContainerRef,
        item: Item,
        at: Option<usize>,
    ) -> StructuralResult<Self> {
        let mut next = self.clone();
        next.insert_item_in_place(container, item, at)?;
        Ok(next)
    }

    pub fn remove_item(&self, container: ContainerRef, index: usize) -> StructuralResult<(Self, Item)> {
        let mut next = self.clone();
        let removed = next.remove_item_in_place(container, index)?;
        Ok((next, removed))
    }

    /// Transfer an item; `to.index` is a position in the destination after
    /// the item has left its source.
    pub fn move_item(&self, from: ItemRef, to: ItemRef) -> StructuralResult<Self> {
        let mut next = self.clone();
        next.move_item_in_place(from, to)?;
        Ok(next)
    }

    pub fn set_item_field(&self, item: ItemRef, patch: &ItemPatch) -> StructuralResult<Self> {
        let mut next = self.clone();
        next.patch_item_in_place(item, patch)?;
        Ok(next)
    }
}
