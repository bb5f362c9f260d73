//! Persisted shape of a list
//!
//! `display_order` is the positional index at conversion time. It is never
//! kept on the model itself; loading sorts by it and then drops it.

use reclist_common::{ItemId, ListId, SectionId, UserId};
use reclist_editor::{Item, ListDocument, PriceTier, Section, StructuralResult, Visibility};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPayload {
    pub id: ListId,
    pub name: String,
    pub creator_id: UserId,
    pub emoji: Option<String>,
    pub visibility: Visibility,
    pub sections: Vec<SectionPayload>,
    pub unsectioned_items: Vec<ItemPayload>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionPayload {
    pub id: SectionId,
    pub name: String,
    pub emoji: Option<String>,
    pub display_order: usize,
    pub items: Vec<ItemPayload>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemPayload {
    pub id: ItemId,
    pub name: String,
    pub description: Option<String>,
    pub price: Option<PriceTier>,
    pub is_starred: bool,
    pub display_order: usize,
}

impl From<&ListDocument> for ListPayload {
    fn from(doc: &ListDocument) -> Self {
        Self {
            id: doc.id(),
            name: doc.name().to_string(),
            creator_id: doc.creator_id(),
            emoji: doc.emoji().map(str::to_string),
            visibility: doc.visibility(),
            sections: doc
                .sections()
                .iter()
                .enumerate()
                .map(|(order, section)| SectionPayload {
                    id: section.id,
                    name: section.name.clone(),
                    emoji: section.emoji.clone(),
                    display_order: order,
                    items: item_payloads(&section.items),
                })
                .collect(),
            unsectioned_items: item_payloads(doc.unsectioned_items()),
        }
    }
}

fn item_payloads(items: &[Item]) -> Vec<ItemPayload> {
    items
        .iter()
        .enumerate()
        .map(|(order, item)| ItemPayload {
            id: item.id,
            name: item.name.clone(),
            description: item.description.clone(),
            price: item.price,
            is_starred: item.is_starred,
            display_order: order,
        })
        .collect()
}

impl ItemPayload {
    fn into_item(self) -> Item {
        Item {
            id: self.id,
            name: self.name,
            description: self.description,
            price: self.price,
            is_starred: self.is_starred,
        }
    }
}

fn into_items(mut payloads: Vec<ItemPayload>) -> Vec<Item> {
    payloads.sort_by_key(|p| p.display_order);
    payloads.into_iter().map(ItemPayload::into_item).collect()
}

impl ListPayload {
    /// Rebuild the model, ordering by `display_order`
    pub fn into_document(self) -> StructuralResult<ListDocument> {
        let mut sections = self.sections;
        sections.sort_by_key(|s| s.display_order);

        let sections = sections
            .into_iter()
            .map(|s| Section {
                id: s.id,
                name: s.name,
                emoji: s.emoji,
                items: into_items(s.items),
            })
            .collect();

        ListDocument::from_parts(
            self.id,
            self.name,
            self.creator_id,
            self.emoji,
            self.visibility,
            sections,
            into_items(self.unsectioned_items),
        )
    }
}
