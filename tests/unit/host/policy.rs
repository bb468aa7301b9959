use super::*;

fn fade(ms: u32) -> TransitionOverride {
    TransitionOverride {
        name: "Fade".to_string(),
        duration_ms: ms,
    }
}

#[test]
fn scene_overrides_match_destination_only() {
    let mut overrides = SceneOverrides::new();
    overrides.insert("Logo", fade(700));

    assert_eq!(overrides.transition_override("", "Logo"), Some(fade(700)));
    assert_eq!(overrides.transition_override("Logo", "Other"), None);

    assert_eq!(overrides.remove("Logo"), Some(fade(700)));
    assert_eq!(overrides.transition_override("", "Logo"), None);
}

#[test]
fn closures_are_policies() {
    let policy = |from: &str, _to: &str| (from == "A").then(|| fade(100));
    let policy: &dyn OverridePolicy = &policy;
    assert_eq!(policy.transition_override("A", "B"), Some(fade(100)));
    assert_eq!(policy.transition_override("B", "A"), None);
    assert_eq!(NoOverride.transition_override("A", "B"), None);
}

#[test]
fn scene_changed_event_serializes_flat() {
    let event = SceneChangedEvent {
        keyer_name: "Default".to_string(),
        channel: 7,
        old_scene: String::new(),
        new_scene: "Bug".to_string(),
    };
    let v = serde_json::to_value(&event).unwrap();
    assert_eq!(
        v,
        serde_json::json!({
            "keyer_name": "Default",
            "channel": 7,
            "old_scene": "",
            "new_scene": "Bug",
        })
    );
}
