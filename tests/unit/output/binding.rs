use super::*;
use crate::host::memory::MemoryHost;
use crate::host::TransitionRegistry;

#[test]
fn base_channel_floor_depends_on_sink() {
    let main = OutputSink::Main;
    let alt = OutputSink::Alternate("vertical".to_string());
    assert_eq!(main.clamp_base_channel(3), 7);
    assert_eq!(main.clamp_base_channel(12), 12);
    assert_eq!(main.clamp_base_channel(64), 7);
    assert_eq!(alt.clamp_base_channel(0), 1);
    assert_eq!(alt.clamp_base_channel(63), 63);
}

#[test]
fn alternate_sinks_prefix_their_keys() {
    assert_eq!(OutputSink::Main.key_prefix(), "");
    assert_eq!(OutputSink::Alternate("vertical".into()).key_prefix(), "vertical_");
    assert_eq!(OutputTarget::alternate("vertical", 2).to_string(), "vertical#2");
}

#[test]
fn swap_hands_over_state_and_mounts_new() {
    let host = MemoryHost::new();
    host.add_transition_template("Fade");
    let scene = host.add_scene("A");
    let binding = OutputChannelBinding::new(host.clone(), OutputTarget::main(7));

    let old = host.duplicate("Fade").unwrap();
    old.set_endpoint(None);
    old.start_auto(std::time::Duration::from_millis(400), Some(scene.clone()));
    binding.mount(ChannelContent::Transition(old.clone()));

    let new = host.duplicate("Fade").unwrap();
    binding.swap(&new, &old);
    assert!(binding.content().holds(&new));
    assert_eq!(binding.content().leaf(), Some(scene));
    assert_eq!(new.snapshot().duration, std::time::Duration::from_millis(400));
}
