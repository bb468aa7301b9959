//! In-process host: scene directory, mixer channels, transition templates,
//! hotkeys and an event log, all behind `std::sync` locks so a render thread
//! can read channels while the control thread mutates them.

use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    sync::{
        Arc, Mutex, RwLock, Weak,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};

use crate::{
    foundation::core::{HotkeyId, HotkeyPairId},
    host::{
        Compositor, EventSink, HostContext, HotkeyRegistrar, OverridePolicy, SceneChangedEvent,
        SceneDirectory, Transition, TransitionHandle, TransitionRegistry, TransitionSnapshot,
    },
    output::{binding::OutputTarget, content::ChannelContent},
    scene::reference::{SceneHandle, SceneId},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Kind of a source known to the [`MemoryHost`] directory.
pub enum SourceKind {
    Scene,
    Input,
}

#[derive(Clone, Debug)]
struct SourceRecord {
    id: SceneId,
    name: String,
    kind: SourceKind,
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// What a registered hotkey is bound to.
pub enum HotkeyBinding {
    ScenePair { keyer: String, scene: String },
    TiePair { keyer: String },
    Null { keyer: String },
}

#[derive(Clone, Debug)]
struct HotkeyRecord {
    binding: HotkeyBinding,
    blobs: (serde_json::Value, serde_json::Value),
}

#[derive(Clone, Debug, PartialEq)]
/// What the render thread saw on a channel for one frame.
pub struct FrameProbe {
    /// Terminal scene being drawn (fade target while a transition runs).
    pub source: Option<String>,
    /// Template name of the mounted transition, if any.
    pub transition: Option<String>,
    /// Fade progress in `0.0..=1.0` while a transition is mounted and started.
    pub progress: Option<f32>,
}

/// Reference host used by tests and the `dsk` binary.
pub struct MemoryHost {
    next_id: AtomicU64,
    sources: RwLock<Vec<SourceRecord>>,
    templates: RwLock<Vec<String>>,
    channels: RwLock<HashMap<OutputTarget, ChannelContent>>,
    mounts: Mutex<HashMap<OutputTarget, usize>>,
    hotkeys: Mutex<BTreeMap<u64, HotkeyRecord>>,
    events: Mutex<Vec<SceneChangedEvent>>,
    duplicates: Mutex<Vec<Weak<MemoryTransition>>>,
}

impl MemoryHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            next_id: AtomicU64::new(1),
            sources: RwLock::new(Vec::new()),
            templates: RwLock::new(Vec::new()),
            channels: RwLock::new(HashMap::new()),
            mounts: Mutex::new(HashMap::new()),
            hotkeys: Mutex::new(BTreeMap::new()),
            events: Mutex::new(Vec::new()),
            duplicates: Mutex::new(Vec::new()),
        })
    }

    /// Context wiring every collaborator to this host, without overrides.
    pub fn context(self: &Arc<Self>) -> HostContext {
        HostContext::new(self.clone(), self.clone(), self.clone(), self.clone())
            .with_events(self.clone())
    }

    /// Same as [`MemoryHost::context`] with an override policy installed.
    pub fn context_with_overrides(self: &Arc<Self>, overrides: Arc<dyn OverridePolicy>) -> HostContext {
        self.context().with_overrides(overrides)
    }

    fn fresh_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    pub fn add_scene(&self, name: &str) -> SceneHandle {
        self.add_source(name, SourceKind::Scene)
    }

    pub fn add_input(&self, name: &str) -> SceneHandle {
        self.add_source(name, SourceKind::Input)
    }

    fn add_source(&self, name: &str, kind: SourceKind) -> SceneHandle {
        let id = SceneId(self.fresh_id());
        write_lock(&self.sources).push(SourceRecord {
            id,
            name: name.to_string(),
            kind,
        });
        SceneHandle::new(id, name)
    }

    /// Rename a source in the directory. Keyers learn about it only when the
    /// caller forwards the notification.
    pub fn rename_source(&self, prev: &str, new: &str) -> bool {
        let mut sources = write_lock(&self.sources);
        match sources.iter_mut().find(|s| s.name == prev) {
            Some(record) => {
                record.name = new.to_string();
                true
            }
            None => false,
        }
    }

    pub fn remove_source(&self, name: &str) -> Option<SceneHandle> {
        let mut sources = write_lock(&self.sources);
        let idx = sources.iter().position(|s| s.name == name)?;
        let record = sources.remove(idx);
        Some(SceneHandle::new(record.id, record.name))
    }

    pub fn add_transition_template(&self, name: &str) {
        let mut templates = write_lock(&self.templates);
        if !templates.iter().any(|t| t == name) {
            templates.push(name.to_string());
        }
    }

    /// Number of times `target` has been written to.
    pub fn mount_count(&self, target: &OutputTarget) -> usize {
        lock(&self.mounts).get(target).copied().unwrap_or(0)
    }

    pub fn channel_content(&self, target: &OutputTarget) -> ChannelContent {
        self.channel(target)
    }

    /// Render-thread view of a channel for one frame.
    pub fn render(&self, target: &OutputTarget, now: Instant) -> FrameProbe {
        let content = self.channel(target);
        match &content {
            ChannelContent::Empty => FrameProbe {
                source: None,
                transition: None,
                progress: None,
            },
            ChannelContent::Scene(scene) => FrameProbe {
                source: Some(scene.name().to_string()),
                transition: None,
                progress: None,
            },
            ChannelContent::Transition(asset) => {
                let snapshot = asset.snapshot();
                FrameProbe {
                    source: asset.active_source().map(|s| s.name().to_string()),
                    transition: Some(asset.name().to_string()),
                    progress: snapshot_progress(&snapshot, now),
                }
            }
        }
    }

    pub fn events(&self) -> Vec<SceneChangedEvent> {
        lock(&self.events).clone()
    }

    pub fn take_events(&self) -> Vec<SceneChangedEvent> {
        std::mem::take(&mut *lock(&self.events))
    }

    /// Registered hotkeys, in registration order.
    pub fn hotkeys(&self) -> Vec<HotkeyBinding> {
        lock(&self.hotkeys)
            .values()
            .map(|r| r.binding.clone())
            .collect()
    }

    /// Binding of a registered scene pair, if it is still registered.
    pub fn hotkey_binding(&self, id: HotkeyPairId) -> Option<HotkeyBinding> {
        lock(&self.hotkeys).get(&id.0).map(|r| r.binding.clone())
    }

    /// Id of the scene pair registered for `(keyer, scene)`.
    pub fn scene_pair_id(&self, keyer: &str, scene: &str) -> Option<HotkeyPairId> {
        lock(&self.hotkeys).iter().find_map(|(id, r)| match &r.binding {
            HotkeyBinding::ScenePair { keyer: k, scene: s } if k == keyer && s == scene => {
                Some(HotkeyPairId(*id))
            }
            _ => None,
        })
    }

    /// Transition instances duplicated by this host that are still alive.
    pub fn live_transitions(&self) -> usize {
        let mut duplicates = lock(&self.duplicates);
        duplicates.retain(|w| w.strong_count() > 0);
        duplicates.len()
    }
}

impl fmt::Debug for MemoryHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryHost")
            .field("sources", &read_lock(&self.sources).len())
            .field("templates", &*read_lock(&self.templates))
            .field("channels", &read_lock(&self.channels).len())
            .finish_non_exhaustive()
    }
}

impl Compositor for MemoryHost {
    fn channel(&self, target: &OutputTarget) -> ChannelContent {
        read_lock(&self.channels)
            .get(target)
            .cloned()
            .unwrap_or_default()
    }

    fn mount(&self, target: &OutputTarget, content: ChannelContent) {
        // Swap under the lock, drop the previous content after releasing it.
        let previous = {
            let mut channels = write_lock(&self.channels);
            if content.is_empty() {
                channels.remove(target)
            } else {
                channels.insert(target.clone(), content)
            }
        };
        *lock(&self.mounts).entry(target.clone()).or_default() += 1;
        drop(previous);
    }
}

impl SceneDirectory for MemoryHost {
    fn resolve_by_name(&self, name: &str) -> Option<SceneHandle> {
        read_lock(&self.sources)
            .iter()
            .find(|s| s.name == name)
            .map(|s| SceneHandle::new(s.id, s.name.as_str()))
    }

    fn is_scene(&self, handle: &SceneHandle) -> bool {
        read_lock(&self.sources)
            .iter()
            .any(|s| s.id == handle.id() && s.kind == SourceKind::Scene)
    }
}

impl TransitionRegistry for MemoryHost {
    fn template_names(&self) -> Vec<String> {
        read_lock(&self.templates).clone()
    }

    fn duplicate(&self, name: &str) -> Option<TransitionHandle> {
        if !read_lock(&self.templates).iter().any(|t| t == name) {
            return None;
        }
        let asset = Arc::new(MemoryTransition::new(self.fresh_id(), name));
        lock(&self.duplicates).push(Arc::downgrade(&asset));
        Some(asset)
    }
}

impl HotkeyRegistrar for MemoryHost {
    fn register_scene_pair(&self, keyer: &str, scene: &SceneHandle) -> Option<HotkeyPairId> {
        let id = self.fresh_id();
        lock(&self.hotkeys).insert(
            id,
            HotkeyRecord {
                binding: HotkeyBinding::ScenePair {
                    keyer: keyer.to_string(),
                    scene: scene.name().to_string(),
                },
                blobs: Default::default(),
            },
        );
        Some(HotkeyPairId(id))
    }

    fn register_tie_pair(&self, keyer: &str) -> Option<HotkeyPairId> {
        let id = self.fresh_id();
        lock(&self.hotkeys).insert(
            id,
            HotkeyRecord {
                binding: HotkeyBinding::TiePair {
                    keyer: keyer.to_string(),
                },
                blobs: Default::default(),
            },
        );
        Some(HotkeyPairId(id))
    }

    fn register_null(&self, keyer: &str) -> Option<HotkeyId> {
        let id = self.fresh_id();
        lock(&self.hotkeys).insert(
            id,
            HotkeyRecord {
                binding: HotkeyBinding::Null {
                    keyer: keyer.to_string(),
                },
                blobs: Default::default(),
            },
        );
        Some(HotkeyId(id))
    }

    fn unregister_pair(&self, id: HotkeyPairId) {
        lock(&self.hotkeys).remove(&id.0);
    }

    fn unregister(&self, id: HotkeyId) {
        lock(&self.hotkeys).remove(&id.0);
    }

    fn save_pair(&self, id: HotkeyPairId) -> (serde_json::Value, serde_json::Value) {
        lock(&self.hotkeys)
            .get(&id.0)
            .map(|r| r.blobs.clone())
            .unwrap_or_default()
    }

    fn load_pair(&self, id: HotkeyPairId, enable: &serde_json::Value, disable: &serde_json::Value) {
        if let Some(record) = lock(&self.hotkeys).get_mut(&id.0) {
            record.blobs = (enable.clone(), disable.clone());
        }
    }

    fn save(&self, id: HotkeyId) -> serde_json::Value {
        lock(&self.hotkeys)
            .get(&id.0)
            .map(|r| r.blobs.0.clone())
            .unwrap_or_default()
    }

    fn load(&self, id: HotkeyId, blob: &serde_json::Value) {
        if let Some(record) = lock(&self.hotkeys).get_mut(&id.0) {
            record.blobs.0 = blob.clone();
        }
    }
}

impl EventSink for MemoryHost {
    fn scene_changed(&self, event: &SceneChangedEvent) {
        lock(&self.events).push(event.clone());
    }
}

/// Transition asset duplicated by [`MemoryHost`].
pub struct MemoryTransition {
    id: u64,
    name: String,
    playback: Mutex<TransitionSnapshot>,
}

impl MemoryTransition {
    fn new(id: u64, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            playback: Mutex::new(TransitionSnapshot::default()),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

impl fmt::Debug for MemoryTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryTransition")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl Transition for MemoryTransition {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_endpoint(&self, old: Option<SceneHandle>) {
        let mut playback = lock(&self.playback);
        playback.from = old;
        playback.to = None;
        playback.started_at = None;
    }

    fn start_auto(&self, duration: Duration, new: Option<SceneHandle>) {
        let mut playback = lock(&self.playback);
        playback.to = new;
        playback.duration = duration;
        playback.started_at = Some(Instant::now());
    }

    fn active_source(&self) -> Option<SceneHandle> {
        let playback = lock(&self.playback);
        if playback.started_at.is_some() {
            playback.to.clone()
        } else {
            playback.from.clone()
        }
    }

    fn snapshot(&self) -> TransitionSnapshot {
        lock(&self.playback).clone()
    }

    fn swap_begin(&self, old: &dyn Transition) {
        let adopted = old.snapshot();
        *lock(&self.playback) = adopted;
    }

    fn swap_end(&self, _old: &dyn Transition) {}

    fn clear(&self) {
        *lock(&self.playback) = TransitionSnapshot::default();
    }
}

fn snapshot_progress(snapshot: &TransitionSnapshot, now: Instant) -> Option<f32> {
    let started = snapshot.started_at?;
    if snapshot.duration.is_zero() {
        return Some(1.0);
    }
    let elapsed = now.saturating_duration_since(started);
    Some((elapsed.as_secs_f32() / snapshot.duration.as_secs_f32()).min(1.0))
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

fn read_lock<T>(m: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    m.read().unwrap_or_else(|e| e.into_inner())
}

fn write_lock<T>(m: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    m.write().unwrap_or_else(|e| e.into_inner())
}

#[cfg(test)]
#[path = "../../tests/unit/host/memory.rs"]
mod tests;
