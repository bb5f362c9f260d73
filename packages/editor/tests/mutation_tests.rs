//! Tests for snapshot operations on ListDocument

use reclist_editor::{
    ContainerRef, Item, ItemPatch, ItemRef, ListDocument, ListId, PriceTier, Section,
    StructuralError, UserId, Visibility,
};

fn names(items: &[Item]) -> Vec<&str> {
    items.iter().map(|i| i.name.as_str()).collect()
}

fn list(sections: Vec<Section>, unsectioned: Vec<Item>) -> ListDocument {
    ListDocument::from_parts(
        ListId::new(),
        "Snapshots".to_string(),
        UserId::new(),
        None,
        Visibility::Global,
        sections,
        unsectioned,
    )
    .unwrap()
}

#[test]
fn test_operations_leave_original_untouched() {
    let doc = list(vec![], vec![Item::named("a"), Item::named("b")]);

    let (split, new_index) = doc.split_section_at(ContainerRef::Unsectioned, 0).unwrap();

    assert_eq!(new_index, 0);
    assert_eq!(names(split.unsectioned_items()), vec!["a"]);
    assert_eq!(names(&split.sections()[0].items), vec!["b"]);
    assert_eq!(names(doc.unsectioned_items()), vec!["a", "b"]);
    assert!(doc.sections().is_empty());
}

#[test]
fn test_add_section_appends_or_inserts() {
    let doc = list(vec![Section::new("A"), Section::new("C")], vec![Item::named("x")]);

    let appended = doc.add_section(Section::new("D"), None).unwrap();
    assert_eq!(appended.sections()[2].name, "D");

    let inserted = doc.add_section(Section::new("B"), Some(1)).unwrap();
    let section_names: Vec<_> = inserted.sections().iter().map(|s| s.name.as_str()).collect();
    assert_eq!(section_names, vec!["A", "B", "C"]);

    let err = doc.add_section(Section::new("Z"), Some(5)).unwrap_err();
    assert_eq!(err, StructuralError::IndexOutOfRange { index: 5, len: 2 });
}

#[test]
fn test_remove_section_returns_it() {
    let doc = list(
        vec![Section::with_items("A", vec![Item::named("p")]), Section::new("B")],
        vec![Item::named("x")],
    );

    let (next, removed) = doc.remove_section(0).unwrap();

    assert_eq!(removed.name, "A");
    assert_eq!(names(&removed.items), vec!["p"]);
    assert_eq!(next.sections().len(), 1);
    assert_eq!(next.sections()[0].name, "B");

    assert_eq!(
        doc.remove_section(2).unwrap_err(),
        StructuralError::IndexOutOfRange { index: 2, len: 2 }
    );
}

#[test]
fn test_split_section_inserts_after_source() {
    let doc = list(
        vec![
            Section::with_items("A", vec![Item::named("a1"), Item::named("a2"), Item::named("a3")]),
            Section::new("B"),
        ],
        vec![],
    );

    let (next, new_index) = doc.split_section_at(ContainerRef::Section(0), 0).unwrap();

    assert_eq!(new_index, 1);
    assert_eq!(next.sections().len(), 3);
    assert_eq!(names(&next.sections()[0].items), vec!["a1"]);
    assert_eq!(names(&next.sections()[1].items), vec!["a2", "a3"]);
    assert_eq!(next.sections()[1].name, "");
    assert_eq!(next.sections()[2].name, "B");
}

#[test]
fn test_merge_into_previous_section() {
    let doc = list(
        vec![
            Section::with_items("A", vec![Item::named("a1")]),
            Section::with_items("B", vec![Item::named("b1"), Item::named("b2")]),
        ],
        vec![],
    );

    let (next, merged) = doc.merge_section_into_predecessor(1).unwrap();

    assert_eq!(merged.into, ContainerRef::Section(0));
    assert_eq!(merged.first_index, 1);
    assert_eq!(merged.count, 2);
    assert_eq!(merged.last_index(), Some(2));
    assert_eq!(names(&next.sections()[0].items), vec!["a1", "b1", "b2"]);
}

#[test]
fn test_insert_and_remove_item() {
    let doc = list(vec![Section::new("S")], vec![Item::named("x")]);

    let inserted = doc
        .insert_item(ContainerRef::Section(0), Item::named("s1"), None)
        .unwrap();
    assert_eq!(names(&inserted.sections()[0].items), vec!["s1"]);

    let (removed_doc, removed) = inserted.remove_item(ContainerRef::Unsectioned, 0).unwrap();
    assert_eq!(removed.name, "x");
    assert!(removed_doc.unsectioned_items().is_empty());

    let err = inserted
        .insert_item(ContainerRef::Section(3), Item::empty(), None)
        .unwrap_err();
    assert!(matches!(err, StructuralError::StaleReference(_)));
}

#[test]
fn test_remove_sole_item_is_refused() {
    let doc = ListDocument::new(UserId::new());

    let err = doc.remove_item(ContainerRef::Unsectioned, 0).unwrap_err();

    assert_eq!(err, StructuralError::CannotRemoveLastItem);
    assert_eq!(doc.item_count(), 1);
}

#[test]
fn test_remove_last_item_allowed_when_sections_exist() {
    let doc = list(vec![Section::new("S")], vec![Item::named("x")]);

    let (next, _) = doc.remove_item(ContainerRef::Unsectioned, 0).unwrap();

    assert_eq!(next.item_count(), 0);
    assert_eq!(next.sections().len(), 1);
}

#[test]
fn test_remove_item_out_of_range() {
    let doc = list(vec![], vec![Item::named("x"), Item::named("y")]);

    let err = doc.remove_item(ContainerRef::Unsectioned, 2).unwrap_err();

    assert_eq!(err, StructuralError::ItemNotFound(ItemRef::unsectioned(2)));
}

#[test]
fn test_set_item_field_partial_update() {
    let doc = list(vec![], vec![Item::named("Pizza").with_description("thin crust")]);
    let target = ItemRef::unsectioned(0);

    let next = doc
        .set_item_field(target, &ItemPatch::default().price(Some(PriceTier::Three)).starred(true))
        .unwrap();
    let item = next.item(target).unwrap();

    assert_eq!(item.name, "Pizza");
    assert_eq!(item.description.as_deref(), Some("thin crust"));
    assert_eq!(item.price, Some(PriceTier::Three));
    assert!(item.is_starred);

    let cleared = next
        .set_item_field(target, &ItemPatch::default().description(None).price(None))
        .unwrap();
    assert_eq!(cleared.item(target).unwrap().description, None);
    assert_eq!(cleared.item(target).unwrap().price, None);
}

#[test]
fn test_patch_from_json_keeps_null_and_empty_apart() {
    let doc = list(vec![], vec![Item::named("x").with_description("d")]);
    let target = ItemRef::unsectioned(0);

    let hide: ItemPatch = serde_json::from_str(r#"{"description": null}"#).unwrap();
    let show: ItemPatch = serde_json::from_str(r#"{"description": ""}"#).unwrap();

    let hidden = doc.set_item_field(target, &hide).unwrap();
    let shown = doc.set_item_field(target, &show).unwrap();

    assert_eq!(hidden.item(target).unwrap().description, None);
    assert_eq!(shown.item(target).unwrap().description.as_deref(), Some(""));
}
