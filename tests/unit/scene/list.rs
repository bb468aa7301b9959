use super::*;
use crate::host::memory::MemoryHost;

fn list_of(names: &[&str]) -> SceneList {
    let mut list = SceneList::new();
    for name in names {
        list.insert(None, SceneListEntry::new(*name, None));
    }
    list
}

#[test]
fn insert_appends_or_places_before_row() {
    let mut list = list_of(&["A", "C"]);
    assert_eq!(list.insert(Some(1), SceneListEntry::new("B", None)), 1);
    assert_eq!(list.insert(Some(99), SceneListEntry::new("D", None)), 3);
    assert_eq!(list.names(), vec!["A", "B", "C", "D"]);
}

#[test]
fn insert_before_selection_keeps_selected_entry() {
    let mut list = list_of(&["A", "B"]);
    assert!(list.select(Some(1)));
    list.insert(Some(0), SceneListEntry::new("Z", None));
    assert_eq!(list.selected(), Some(2));
    assert_eq!(list.selected_name(), Some("B"));
}

#[test]
fn remove_clears_or_shifts_selection() {
    let mut list = list_of(&["A", "B", "C"]);
    list.select(Some(2));
    list.remove(0);
    assert_eq!(list.selected_name(), Some("C"));

    list.remove(1);
    assert_eq!(list.selected(), None);
    assert!(list.remove(5).is_none());
}

#[test]
fn select_reports_changes_and_ignores_out_of_range() {
    let mut list = list_of(&["A"]);
    assert!(list.select(Some(0)));
    assert!(!list.select(Some(0)));
    assert!(list.select(Some(3)));
    assert_eq!(list.selected(), None);
    assert!(!list.select(None));
}

#[test]
fn move_selected_carries_selection() {
    let mut list = list_of(&["A", "B", "C"]);
    assert!(!list.move_selected(1));

    list.select(Some(0));
    assert!(!list.move_selected(-1));
    assert!(list.move_selected(1));
    assert_eq!(list.names(), vec!["B", "A", "C"]);
    assert_eq!(list.selected_name(), Some("A"));

    list.select(Some(2));
    assert!(!list.move_selected(1));
}

#[test]
fn rename_keeps_position_and_hotkey() {
    let mut list = SceneList::new();
    list.insert(None, SceneListEntry::new("A", Some(HotkeyPairId(1))));
    list.insert(None, SceneListEntry::new("B", Some(HotkeyPairId(2))));
    list.select(Some(1));

    assert_eq!(list.rename("B", "Bee"), 1);
    assert_eq!(list.rename("nope", "x"), 0);
    assert_eq!(list.names(), vec!["A", "Bee"]);
    assert_eq!(list.entries()[1].hotkey(), Some(HotkeyPairId(2)));
    assert_eq!(list.selected_name(), Some("Bee"));
    assert_eq!(list.position_of_hotkey(HotkeyPairId(2)), Some(1));
}

#[test]
fn remove_named_drops_duplicates_in_order() {
    let mut list = SceneList::new();
    list.insert(None, SceneListEntry::new("A", Some(HotkeyPairId(1))));
    list.insert(None, SceneListEntry::new("B", None));
    list.insert(None, SceneListEntry::new("A", Some(HotkeyPairId(3))));
    list.select(Some(1));

    let removed = list.remove_named("A");
    let hotkeys: Vec<_> = removed.iter().map(SceneListEntry::hotkey).collect();
    assert_eq!(hotkeys, vec![Some(HotkeyPairId(1)), Some(HotkeyPairId(3))]);
    assert_eq!(list.names(), vec!["B"]);
    assert_eq!(list.selected_name(), Some("B"));
}

#[test]
fn resolve_selected_is_none_when_scene_vanished() {
    let host = MemoryHost::new();
    let scene = host.add_scene("A");
    let mut list = list_of(&["A"]);
    assert_eq!(list.resolve_selected(&*host), None);

    list.select(Some(0));
    assert_eq!(list.resolve_selected(&*host), Some(scene));

    host.remove_source("A");
    assert_eq!(list.resolve_selected(&*host), None);
}
