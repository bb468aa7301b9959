use std::sync::Arc;

use super::*;
use crate::{host::memory::MemoryHost, output::binding::OutputTarget};

fn host() -> Arc<MemoryHost> {
    let host = MemoryHost::new();
    host.add_scene("A");
    host.add_scene("B");
    host
}

fn vertical() -> OutputSink {
    OutputSink::Alternate("vertical".to_string())
}

fn registry(host: &Arc<MemoryHost>) -> KeyerRegistry {
    let mut reg = KeyerRegistry::new();
    reg.attach(OutputSink::Main, host.context(), DockConfig::default())
        .unwrap();
    reg.attach(vertical(), host.context(), DockConfig::for_sink(&vertical()))
        .unwrap();
    reg
}

#[test]
fn attach_is_once_per_sink() {
    let host = host();
    let mut reg = registry(&host);
    assert!(matches!(
        reg.attach(OutputSink::Main, host.context(), DockConfig::default()),
        Err(DskError::Validation(_))
    ));
    assert_eq!(reg.docks().count(), 2);
    assert!(reg.dock(&vertical()).is_some());
}

#[test]
fn detach_tears_the_dock_down() {
    let host = host();
    let mut reg = registry(&host);
    reg.keyer_mut(&OutputSink::Main, "Default").unwrap().add_scene("A", None);
    reg.keyer_mut(&OutputSink::Main, "Default")
        .unwrap()
        .switch_to_scene("A");
    assert!(!host.channel_content(&OutputTarget::main(7)).is_empty());

    assert!(reg.detach(&OutputSink::Main));
    assert!(!reg.detach(&OutputSink::Main));
    assert!(host.channel_content(&OutputTarget::main(7)).is_empty());
    assert!(matches!(
        reg.keyer_mut(&OutputSink::Main, "Default"),
        Err(DskError::NotFound(_))
    ));
}

#[test]
fn program_changes_are_per_sink_and_renames_are_global() {
    let host = host();
    let mut reg = registry(&host);
    for sink in [OutputSink::Main, vertical()] {
        let k = reg.keyer_mut(&sink, "Default").unwrap();
        k.add_scene("A", None);
        k.add_exclude_scene("B");
        k.switch_to_scene("A");
    }

    reg.program_changed(&vertical(), "B").unwrap();
    assert!(host.channel_content(&OutputTarget::alternate("vertical", 1)).is_empty());
    assert!(!host.channel_content(&OutputTarget::main(7)).is_empty());
    assert!(reg.program_changed(&OutputSink::Alternate("nope".into()), "B").is_err());

    host.rename_source("A", "Alpha");
    reg.scene_renamed("A", "Alpha");
    for dock in reg.docks() {
        assert_eq!(dock.keyers()[0].scene_list().names(), vec!["Alpha"]);
    }

    reg.scene_removed("Alpha");
    for dock in reg.docks() {
        assert!(dock.keyers()[0].scene_list().is_empty());
    }
}

#[test]
fn save_and_load_share_one_blob() {
    let host = host();
    let mut reg = registry(&host);
    reg.dock_mut(&vertical()).unwrap().add_keyer("Second").unwrap();

    let mut blob = serde_json::Map::new();
    reg.save_all(&mut blob).unwrap();
    assert!(blob.contains_key("downstream_keyers"));
    assert!(blob.contains_key("vertical_downstream_keyers"));

    let mut fresh = registry(&host);
    fresh.load_all(&blob).unwrap();
    let keyers: Vec<_> = fresh
        .dock(&vertical())
        .unwrap()
        .keyers()
        .iter()
        .map(|k| k.name().to_string())
        .collect();
    assert_eq!(keyers, vec!["Default", "Second"]);
}

#[test]
fn malformed_section_resets_that_dock() {
    let host = host();
    let mut reg = registry(&host);
    reg.dock_mut(&OutputSink::Main).unwrap().add_keyer("Extra").unwrap();

    let blob = match serde_json::json!({ "downstream_keyers": "oops" }) {
        serde_json::Value::Object(map) => map,
        _ => unreachable!(),
    };
    assert!(matches!(reg.load_all(&blob), Err(DskError::Serde(_))));
    assert_eq!(reg.dock(&OutputSink::Main).unwrap().keyers().len(), 1);
}
