use std::sync::Arc;

use super::*;
use crate::{
    host::{HotkeyRegistrar, memory::MemoryHost},
    output::content::ChannelContent,
};

fn host() -> Arc<MemoryHost> {
    let host = MemoryHost::new();
    for scene in ["A", "B", "C"] {
        host.add_scene(scene);
    }
    host.add_input("Cam");
    host.add_transition_template("Fade");
    host.add_transition_template("Swipe");
    host
}

fn keyer(host: &Arc<MemoryHost>) -> Keyer {
    Keyer::new("Default", host.context(), OutputTarget::main(7))
}

fn shown(host: &MemoryHost, channel: u32) -> Option<String> {
    host.channel_content(&OutputTarget::main(channel))
        .leaf()
        .map(|s| s.name().to_string())
}

#[test]
fn add_scene_accepts_scenes_only() {
    let host = host();
    let mut k = keyer(&host);
    assert!(!k.add_scene("Cam", None));
    assert!(!k.add_scene("Nope", None));
    assert!(k.add_scene("B", None));
    assert!(k.add_scene("A", Some(0)));
    assert_eq!(k.scene_list().names(), vec!["A", "B"]);
    assert!(host.scene_pair_id("Default", "A").is_some());
}

#[test]
fn switching_cuts_onto_the_channel() {
    let host = host();
    let mut k = keyer(&host);
    k.add_scene("A", None);
    k.add_scene("B", None);

    assert!(k.switch_to_scene("A"));
    assert_eq!(shown(&host, 7).as_deref(), Some("A"));
    assert!(k.switch_to_scene("B"));
    assert_eq!(shown(&host, 7).as_deref(), Some("B"));
    assert!(!k.switch_to_scene("C"));
    assert!(k.switch_to_scene(""));
    assert_eq!(shown(&host, 7), None);
    assert_eq!(k.selected_scene(), None);
}

#[test]
fn tie_defers_selection_until_program_change() {
    let host = host();
    let mut k = keyer(&host);
    k.add_scene("A", None);
    k.add_scene("B", None);
    k.switch_to_scene("A");

    assert!(k.set_tie(true));
    assert!(!k.set_tie(true));
    k.switch_to_scene("B");
    assert_eq!(shown(&host, 7).as_deref(), Some("A"));

    assert!(k.scene_changed("Program").changed());
    assert_eq!(shown(&host, 7).as_deref(), Some("B"));
}

#[test]
fn untied_keyer_ignores_program_changes_while_showing() {
    let host = host();
    let mut k = keyer(&host);
    k.add_scene("A", None);
    k.switch_to_scene("A");
    assert_eq!(k.scene_changed("Program"), ApplyOutcome::Unchanged);
    assert_eq!(k.program_scene(), Some("Program"));
}

#[test]
fn rename_keeps_position_selection_and_hotkey() {
    let host = host();
    let mut k = keyer(&host);
    k.add_scene("A", None);
    k.add_scene("B", None);
    k.add_exclude_scene("B");
    k.switch_to_scene("B");
    let hotkey = k.scene_list().entries()[1].hotkey();

    assert!(host.rename_source("B", "Bee"));
    k.on_scene_renamed("B", "Bee");

    assert_eq!(k.scene_list().names(), vec!["A", "Bee"]);
    assert_eq!(k.selected_scene(), Some("Bee"));
    assert_eq!(k.scene_list().entries()[1].hotkey(), hotkey);
    assert!(k.is_scene_excluded("Bee"));
    assert!(!k.is_scene_excluded("B"));
    assert_eq!(k.selected_source().map(|s| s.name().to_string()).as_deref(), Some("Bee"));
}

#[test]
fn removed_scene_leaves_the_list_and_the_channel() {
    let host = host();
    let mut k = keyer(&host);
    k.add_scene("A", None);
    k.add_scene("B", None);
    k.switch_to_scene("A");
    let hotkey = host.scene_pair_id("Default", "A").unwrap();

    host.remove_source("A");
    k.on_scene_removed("A");

    assert_eq!(k.scene_list().names(), vec!["B"]);
    assert_eq!(k.selected_scene(), None);
    assert_eq!(shown(&host, 7), None);
    assert!(host.hotkey_binding(hotkey).is_none());
}

#[test]
fn hotkey_callbacks_ignore_releases() {
    let host = host();
    let mut k = keyer(&host);
    k.add_scene("A", None);
    k.add_scene("B", None);
    let b = host.scene_pair_id("Default", "B").unwrap();

    assert!(!k.on_scene_hotkey(b, HotkeyAction::Enable, false));
    assert!(k.on_scene_hotkey(b, HotkeyAction::Enable, true));
    assert_eq!(k.selected_scene(), Some("B"));
    assert!(!k.on_scene_hotkey(b, HotkeyAction::Enable, true));
    assert!(k.on_scene_hotkey(b, HotkeyAction::Disable, true));
    assert_eq!(k.selected_scene(), None);
    assert!(!k.on_scene_hotkey(b, HotkeyAction::Disable, true));
    assert!(!k.on_scene_hotkey(HotkeyPairId(9999), HotkeyAction::Enable, true));

    k.switch_to_scene("A");
    k.on_null_hotkey(false);
    assert_eq!(k.selected_scene(), Some("A"));
    k.on_null_hotkey(true);
    assert_eq!(k.selected_scene(), None);

    assert!(!k.on_tie_hotkey(HotkeyAction::Enable, false));
    assert!(k.on_tie_hotkey(HotkeyAction::Enable, true));
    assert!(k.tie());
    assert!(!k.on_tie_hotkey(HotkeyAction::Enable, true));
    assert!(k.on_tie_hotkey(HotkeyAction::Disable, true));
    assert!(!k.tie());
}

#[test]
fn exclusion_overrides_tie_and_applies_immediately() {
    let host = host();
    let mut k = keyer(&host);
    k.add_scene("A", None);
    k.switch_to_scene("A");
    k.set_tie(true);
    k.scene_changed("Break");
    assert_eq!(shown(&host, 7).as_deref(), Some("A"));

    assert!(k.add_exclude_scene("Break"));
    assert!(!k.add_exclude_scene("Break"));
    assert_eq!(shown(&host, 7), None);

    // Selecting during the excluded scene resolves to nothing.
    k.set_tie(false);
    k.switch_to_scene("");
    k.switch_to_scene("A");
    assert_eq!(k.selected_source(), None);
    assert_eq!(shown(&host, 7), None);

    assert!(k.remove_exclude_scene("Break"));
    assert_eq!(shown(&host, 7).as_deref(), Some("A"));
}

#[test]
fn hide_after_fires_on_tick() {
    let host = host();
    let mut k = keyer(&host);
    k.add_scene("A", None);
    k.add_scene("B", None);
    k.set_hide_after(Some(Duration::from_secs(2)));

    k.switch_to_scene("A");
    let deadline = k.hide_deadline().unwrap();
    // Scene to scene does not re-arm.
    k.switch_to_scene("B");
    assert_eq!(k.hide_deadline(), Some(deadline));

    assert!(!k.tick(deadline - Duration::from_millis(1)));
    assert_eq!(shown(&host, 7).as_deref(), Some("B"));
    assert!(k.tick(deadline));
    assert_eq!(k.selected_scene(), None);
    assert_eq!(shown(&host, 7), None);
    assert_eq!(k.hide_deadline(), None);
    assert!(!k.tick(deadline + Duration::from_secs(10)));
}

#[test]
fn manual_hide_disarms_the_timer() {
    let host = host();
    let mut k = keyer(&host);
    k.add_scene("A", None);
    k.set_hide_after(Some(Duration::from_secs(1)));
    k.switch_to_scene("A");
    k.select_none();
    assert_eq!(k.hide_deadline(), None);

    k.switch_to_scene("A");
    assert!(k.hide_deadline().is_some());
    k.set_hide_after(None);
    assert_eq!(k.hide_deadline(), None);
}

#[test]
fn move_selected_reorders_list() {
    let host = host();
    let mut k = keyer(&host);
    for s in ["A", "B", "C"] {
        k.add_scene(s, None);
    }
    assert!(!k.move_selected_up());
    k.switch_to_scene("C");
    assert!(k.move_selected_up());
    assert!(k.move_selected_up());
    assert!(!k.move_selected_up());
    assert_eq!(k.scene_list().names(), vec!["C", "A", "B"]);
    assert!(k.move_selected_down());
    assert_eq!(k.scene_list().names(), vec!["A", "C", "B"]);
    assert_eq!(k.selected_scene(), Some("C"));
}

#[test]
fn transitions_are_stored_per_role() {
    let host = host();
    let mut k = keyer(&host);
    k.set_transition(TransitionRole::Show, "Swipe");
    k.set_transition_duration(TransitionRole::Show, TransitionDuration::new(900).unwrap());
    k.add_scene("A", None);
    k.switch_to_scene("A");

    assert_eq!(k.transition_name(TransitionRole::Show), "Swipe");
    assert_eq!(k.transition_name(TransitionRole::Match), "");
    let probe = host.render(k.target(), std::time::Instant::now());
    assert_eq!(probe.transition.as_deref(), Some("Swipe"));
    assert_eq!(probe.source.as_deref(), Some("A"));
}

#[test]
fn save_load_round_trip() {
    let host = host();
    let mut k = keyer(&host);
    for s in ["A", "B", "C"] {
        k.add_scene(s, None);
    }
    k.switch_to_scene("B");
    k.set_transition(TransitionRole::Match, "Fade");
    k.set_transition_duration(TransitionRole::Match, TransitionDuration::new(700).unwrap());
    k.set_transition(TransitionRole::Show, "Swipe");
    k.set_transition_duration(TransitionRole::Show, TransitionDuration::new(1500).unwrap());
    k.set_transition(TransitionRole::Hide, "Fade");
    k.set_transition_duration(TransitionRole::Hide, TransitionDuration::new(200).unwrap());
    k.add_exclude_scene("X");
    k.add_exclude_scene("Y");
    k.set_tie(true);
    k.set_hide_after(Some(Duration::from_millis(5000)));
    let null_blob = serde_json::json!([{ "key": "OBS_KEY_F9" }]);
    host.load(k.null_hotkey().unwrap(), &null_blob);

    let state = k.save();
    assert_eq!(state.scene, "B");
    assert_eq!(state.show_transition, "Swipe");
    assert_eq!(state.show_transition_duration, 1500);
    assert_eq!(state.hide_after, 5000);
    assert_eq!(state.null_hotkey, null_blob);

    let text = serde_json::to_string(&state).unwrap();
    let reread: KeyerState = serde_json::from_str(&text).unwrap();
    assert_eq!(reread, state);

    let mut restored = Keyer::new("Default", host.context(), OutputTarget::main(8));
    restored.load(&reread);
    assert_eq!(restored.save(), state);
    assert_eq!(restored.scene_list().names(), vec!["A", "B", "C"]);
    assert!(restored.tie());
    assert_eq!(shown(&host, 8).as_deref(), Some("B"));
}

#[test]
fn load_clamps_durations_and_keeps_unresolved_entries() {
    let host = host();
    let mut k = keyer(&host);
    let state = KeyerState {
        transition: "Fade".to_string(),
        transition_duration: 5,
        show_transition_duration: 1_000_000,
        scenes: vec![NamedEntry::new("A"), NamedEntry::new("Gone")],
        scene: "Gone".to_string(),
        hide_after: -3,
        ..KeyerState::default()
    };
    k.load(&state);

    assert_eq!(k.transition_duration(TransitionRole::Match).as_millis(), 50);
    assert_eq!(k.transition_duration(TransitionRole::Show).as_millis(), 20_000);
    assert_eq!(k.scene_list().names(), vec!["A", "Gone"]);
    assert_eq!(k.selected_scene(), Some("Gone"));
    assert_eq!(k.selected_source(), None);
    assert!(host.scene_pair_id("Default", "Gone").is_none());
    assert_eq!(k.hide_after(), None);
    assert_eq!(shown(&host, 7), None);
}

#[test]
fn load_replaces_previous_entries_and_hotkeys() {
    let host = host();
    let mut k = keyer(&host);
    k.add_scene("A", None);
    let old = host.scene_pair_id("Default", "A").unwrap();

    k.load(&KeyerState {
        scenes: vec![NamedEntry::new("C")],
        ..KeyerState::default()
    });
    assert_eq!(k.scene_list().names(), vec!["C"]);
    assert!(host.hotkey_binding(old).is_none());
    assert!(host.scene_pair_id("Default", "C").is_some());
}

#[test]
fn moving_channel_moves_the_selection() {
    let host = host();
    let mut k = keyer(&host);
    k.add_scene("A", None);
    k.switch_to_scene("A");
    k.set_output_channel(12).unwrap();
    assert_eq!(k.channel(), 12);
    assert_eq!(shown(&host, 7), None);
    assert_eq!(shown(&host, 12).as_deref(), Some("A"));
}

#[test]
fn drop_releases_channel_assets_and_hotkeys() {
    let host = host();
    {
        let mut k = keyer(&host);
        k.set_transition(TransitionRole::Match, "Fade");
        k.set_transition(TransitionRole::Hide, "Swipe");
        k.add_scene("A", None);
        k.add_scene("B", None);
        k.switch_to_scene("A");
        assert!(matches!(
            host.channel_content(&OutputTarget::main(7)),
            ChannelContent::Transition(_)
        ));
        assert!(!host.hotkeys().is_empty());
    }
    assert!(host.channel_content(&OutputTarget::main(7)).is_empty());
    assert!(host.hotkeys().is_empty());
    assert_eq!(host.live_transitions(), 0);
}

#[test]
fn auto_hide_ignores_tie() {
    let host = host();
    let mut k = keyer(&host);
    k.add_scene("A", None);
    k.set_hide_after(Some(Duration::from_millis(100)));
    k.switch_to_scene("A");
    k.set_tie(true);

    let deadline = k.hide_deadline().unwrap();
    assert!(k.tick(deadline));
    assert_eq!(shown(&host, 7), None);
}
