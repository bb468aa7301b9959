//! Collaborator seams between the keyer engine and the host application.
//!
//! The engine never talks to a compositor, scene directory or hotkey system
//! directly; it goes through the traits below. Host notifications (scene
//! renamed, scene removed, program scene changed) are pushed by calling the
//! matching methods on [`crate::Dock`] or [`crate::KeyerRegistry`] from the
//! control thread.
//!
//! [`memory::MemoryHost`] implements every trait in-process and is what the
//! tests and the `dsk` binary run against.

use std::{
    collections::HashMap,
    fmt,
    sync::Arc,
    time::{Duration, Instant},
};

use crate::{
    foundation::core::{HotkeyId, HotkeyPairId},
    output::{binding::OutputTarget, content::ChannelContent},
    scene::reference::SceneHandle,
};

pub mod memory;

/// Owned transition object duplicated from a host template.
pub type TransitionHandle = Arc<dyn Transition>;

/// Read/mount access to the host's output channels.
///
/// A mount is visible to the render thread as soon as the call returns; the
/// render thread only ever observes whole [`ChannelContent`] values.
pub trait Compositor: Send + Sync {
    fn channel(&self, target: &OutputTarget) -> ChannelContent;
    fn mount(&self, target: &OutputTarget, content: ChannelContent);
}

/// Name-keyed lookup of host sources.
pub trait SceneDirectory: Send + Sync {
    fn resolve_by_name(&self, name: &str) -> Option<SceneHandle>;
    fn is_scene(&self, handle: &SceneHandle) -> bool;
}

/// Registered transition templates.
pub trait TransitionRegistry: Send + Sync {
    fn template_names(&self) -> Vec<String>;

    /// Duplicate the template called `name` into a new, exclusively owned instance.
    fn duplicate(&self, name: &str) -> Option<TransitionHandle>;
}

#[derive(Clone, Debug, Default)]
/// Playback state of a transition, as handed over during a swap.
pub struct TransitionSnapshot {
    /// Source the transition fades away from.
    pub from: Option<SceneHandle>,
    /// Source the transition fades towards.
    pub to: Option<SceneHandle>,
    /// Length of the automatic fade.
    pub duration: Duration,
    /// Set once the automatic fade has been started.
    pub started_at: Option<Instant>,
}

/// A live transition asset. Playback timing is owned by the asset once started.
pub trait Transition: Send + Sync + fmt::Debug {
    /// Template name the asset was duplicated from.
    fn name(&self) -> &str;

    fn set_endpoint(&self, old: Option<SceneHandle>);

    /// Start an automatic timed fade toward `new`, restarting any fade in flight.
    fn start_auto(&self, duration: Duration, new: Option<SceneHandle>);

    /// Terminal source currently shown (the fade target once started).
    fn active_source(&self) -> Option<SceneHandle>;

    fn snapshot(&self) -> TransitionSnapshot;

    /// First phase of a hot swap: take over `old`'s in-flight state.
    fn swap_begin(&self, old: &dyn Transition);

    /// Second phase of a hot swap, called once `self` is mounted.
    fn swap_end(&self, old: &dyn Transition);

    /// Drop every source reference held by the asset.
    fn clear(&self);
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
/// Transition chosen by an [`OverridePolicy`].
pub struct TransitionOverride {
    /// Template name to duplicate.
    pub name: String,
    /// Fade length in milliseconds.
    pub duration_ms: u32,
}

/// Per-switch transition override, queried only when neither show nor hide applies.
pub trait OverridePolicy: Send + Sync {
    fn transition_override(&self, from: &str, to: &str) -> Option<TransitionOverride>;
}

impl<F> OverridePolicy for F
where
    F: Fn(&str, &str) -> Option<TransitionOverride> + Send + Sync,
{
    fn transition_override(&self, from: &str, to: &str) -> Option<TransitionOverride> {
        self(from, to)
    }
}

#[derive(Clone, Copy, Debug, Default)]
/// Policy that never overrides.
pub struct NoOverride;

impl OverridePolicy for NoOverride {
    fn transition_override(&self, _from: &str, _to: &str) -> Option<TransitionOverride> {
        None
    }
}

#[derive(Clone, Debug, Default)]
/// Overrides keyed by destination scene, like a scene's own "transition override" setting.
pub struct SceneOverrides {
    by_scene: HashMap<String, TransitionOverride>,
}

impl SceneOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, scene: impl Into<String>, transition: TransitionOverride) {
        self.by_scene.insert(scene.into(), transition);
    }

    pub fn remove(&mut self, scene: &str) -> Option<TransitionOverride> {
        self.by_scene.remove(scene)
    }
}

impl OverridePolicy for SceneOverrides {
    fn transition_override(&self, _from: &str, to: &str) -> Option<TransitionOverride> {
        self.by_scene.get(to).cloned()
    }
}

/// Hotkey registration plumbing. The engine only implements the callback bodies
/// (see [`crate::Keyer::on_scene_hotkey`] and friends).
pub trait HotkeyRegistrar: Send + Sync {
    /// Enable/disable pair bound to one scene list entry.
    fn register_scene_pair(&self, keyer: &str, scene: &SceneHandle) -> Option<HotkeyPairId>;
    /// Tie on/off pair for a keyer.
    fn register_tie_pair(&self, keyer: &str) -> Option<HotkeyPairId>;
    /// "Select none" hotkey for a keyer.
    fn register_null(&self, keyer: &str) -> Option<HotkeyId>;
    fn unregister_pair(&self, id: HotkeyPairId);
    fn unregister(&self, id: HotkeyId);
    /// Opaque bindings blob for `(enable, disable)`.
    fn save_pair(&self, id: HotkeyPairId) -> (serde_json::Value, serde_json::Value);
    fn load_pair(&self, id: HotkeyPairId, enable: &serde_json::Value, disable: &serde_json::Value);
    fn save(&self, id: HotkeyId) -> serde_json::Value;
    fn load(&self, id: HotkeyId, blob: &serde_json::Value);
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
/// Emitted after every switch that changed what a keyer's channel shows.
pub struct SceneChangedEvent {
    pub keyer_name: String,
    pub channel: u32,
    /// Empty when the channel was empty.
    pub old_scene: String,
    /// Empty when the channel goes empty.
    pub new_scene: String,
}

/// Fire-and-forget observer of keyer switches. Implementations must not block.
pub trait EventSink: Send + Sync {
    fn scene_changed(&self, event: &SceneChangedEvent);
}

#[derive(Clone, Copy, Debug, Default)]
/// Sink that drops every event.
pub struct NoEvents;

impl EventSink for NoEvents {
    fn scene_changed(&self, _event: &SceneChangedEvent) {}
}

#[derive(Clone)]
/// Bundle of host collaborators shared by every keyer of a dock.
pub struct HostContext {
    pub compositor: Arc<dyn Compositor>,
    pub scenes: Arc<dyn SceneDirectory>,
    pub transitions: Arc<dyn TransitionRegistry>,
    pub hotkeys: Arc<dyn HotkeyRegistrar>,
    pub overrides: Arc<dyn OverridePolicy>,
    pub events: Arc<dyn EventSink>,
}

impl HostContext {
    /// Context without override policy or event observer.
    pub fn new(
        compositor: Arc<dyn Compositor>,
        scenes: Arc<dyn SceneDirectory>,
        transitions: Arc<dyn TransitionRegistry>,
        hotkeys: Arc<dyn HotkeyRegistrar>,
    ) -> Self {
        Self {
            compositor,
            scenes,
            transitions,
            hotkeys,
            overrides: Arc::new(NoOverride),
            events: Arc::new(NoEvents),
        }
    }

    pub fn with_overrides(mut self, overrides: Arc<dyn OverridePolicy>) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }
}

impl fmt::Debug for HostContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostContext")
            .field("compositor_ptr", &Arc::as_ptr(&self.compositor))
            .field("scenes_ptr", &Arc::as_ptr(&self.scenes))
            .field("transitions_ptr", &Arc::as_ptr(&self.transitions))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../tests/unit/host/policy.rs"]
mod tests;
