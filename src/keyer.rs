//! A keyer: one scene list switched onto one output channel.

use std::time::{Duration, Instant};

use crate::{
    foundation::{
        core::{HotkeyId, HotkeyPairId, TransitionDuration, TransitionRole},
        error::DskResult,
    },
    host::HostContext,
    output::binding::OutputTarget,
    scene::{
        exclusion::ExclusionSet,
        list::{SceneList, SceneListEntry},
        reference::SceneHandle,
    },
    transition::engine::{ApplyOutcome, TransitionEngine},
};

pub(crate) mod dock;
pub(crate) mod persist;
pub(crate) mod registry;

use persist::{KeyerState, NamedEntry};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Which half of a hotkey pair fired.
pub enum HotkeyAction {
    Enable,
    Disable,
}

/// One downstream keyer: scene list, transition slots, channel binding, tie
/// flag and exclusions. Owned by its dock and addressed by name.
///
/// Dropping a keyer empties its channel, releases its transition assets and
/// unregisters every hotkey it registered.
pub struct Keyer {
    name: String,
    host: HostContext,
    scenes: SceneList,
    exclusions: ExclusionSet,
    engine: TransitionEngine,
    tie: bool,
    program_scene: Option<String>,
    hide_after: Option<Duration>,
    hide_deadline: Option<Instant>,
    null_hotkey: Option<HotkeyId>,
    tie_hotkey: Option<HotkeyPairId>,
}

impl Keyer {
    pub fn new(name: impl Into<String>, host: HostContext, target: OutputTarget) -> Self {
        let name = name.into();
        let engine = TransitionEngine::new(host.clone(), target, name.clone());
        let null_hotkey = host.hotkeys.register_null(&name);
        let tie_hotkey = host.hotkeys.register_tie_pair(&name);
        Self {
            name,
            host,
            scenes: SceneList::new(),
            exclusions: ExclusionSet::new(),
            engine,
            tie: false,
            program_scene: None,
            hide_after: None,
            hide_deadline: None,
            null_hotkey,
            tie_hotkey,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.engine.set_keyer_name(self.name.clone());
    }

    pub fn target(&self) -> &OutputTarget {
        self.engine.binding().target()
    }

    pub fn channel(&self) -> u32 {
        self.engine.binding().channel()
    }

    pub fn engine(&self) -> &TransitionEngine {
        &self.engine
    }

    pub fn scene_list(&self) -> &SceneList {
        &self.scenes
    }

    pub fn exclusions(&self) -> &ExclusionSet {
        &self.exclusions
    }

    pub fn tie(&self) -> bool {
        self.tie
    }

    pub fn null_hotkey(&self) -> Option<HotkeyId> {
        self.null_hotkey
    }

    pub fn tie_hotkey(&self) -> Option<HotkeyPairId> {
        self.tie_hotkey
    }

    /// Name of the selected list entry, `None` when nothing is selected.
    pub fn selected_scene(&self) -> Option<&str> {
        self.scenes.selected_name()
    }

    /// Source the selection maps to right now: nothing while the program
    /// scene is excluded, or when the selected scene no longer resolves.
    pub fn selected_source(&self) -> Option<SceneHandle> {
        if self
            .program_scene
            .as_deref()
            .is_some_and(|p| self.exclusions.contains(p))
        {
            return None;
        }
        self.list_source()
    }

    fn list_source(&self) -> Option<SceneHandle> {
        let source = self.scenes.resolve_selected(self.host.scenes.as_ref());
        if source.is_none() {
            if let Some(name) = self.scenes.selected_name() {
                tracing::warn!(keyer = %self.name, scene = name, "selected scene does not resolve");
            }
        }
        source
    }

    /// Switch the channel to the current selection.
    pub fn apply_selected(&mut self) -> ApplyOutcome {
        let source = self.selected_source();
        self.tracked(|engine| engine.apply(source))
    }

    /// Run an engine switch and keep the auto-hide deadline in step with it.
    fn tracked(&mut self, f: impl FnOnce(&mut TransitionEngine) -> ApplyOutcome) -> ApplyOutcome {
        let was_empty = self.engine.current_leaf().is_none();
        let outcome = f(&mut self.engine);
        if outcome.changed() {
            let showing = self.engine.current_leaf().is_some();
            self.hide_deadline = match (was_empty, showing, self.hide_after) {
                (true, true, Some(delay)) => Some(Instant::now() + delay),
                (_, true, _) => self.hide_deadline,
                (_, false, _) => None,
            };
        }
        outcome
    }

    fn selection_changed(&mut self) -> ApplyOutcome {
        if self.tie {
            // A tied keyer only follows on the next program change.
            return ApplyOutcome::Unchanged;
        }
        self.apply_selected()
    }

    /// Select `row` (or nothing) as the operator would by clicking the list.
    pub fn select_row(&mut self, row: Option<usize>) -> bool {
        if !self.scenes.select(row) {
            return false;
        }
        self.selection_changed();
        true
    }

    pub fn select_none(&mut self) -> bool {
        self.select_row(None)
    }

    /// Add `name` before `insert_before` (or at the end). Fails when the name
    /// does not resolve to a scene.
    #[tracing::instrument(level = "debug", skip(self), fields(keyer = %self.name))]
    pub fn add_scene(&mut self, name: &str, insert_before: Option<usize>) -> bool {
        let Some(scene) = self
            .host
            .scenes
            .resolve_by_name(name)
            .filter(|s| self.host.scenes.is_scene(s))
        else {
            return false;
        };
        let hotkey = self.host.hotkeys.register_scene_pair(&self.name, &scene);
        self.scenes
            .insert(insert_before, SceneListEntry::new(scene.name(), hotkey));
        true
    }

    /// Remove the first entry called `name` and unregister its hotkeys.
    #[tracing::instrument(level = "debug", skip(self), fields(keyer = %self.name))]
    pub fn remove_scene(&mut self, name: &str) -> bool {
        let Some(row) = self.scenes.position(name) else {
            return false;
        };
        let was_selected = self.scenes.selected() == Some(row);
        if let Some(entry) = self.scenes.remove(row) {
            self.release_entry(&entry);
        }
        if was_selected {
            self.selection_changed();
        }
        true
    }

    /// Select the entry called `name`; `""` selects nothing.
    #[tracing::instrument(level = "debug", skip(self), fields(keyer = %self.name))]
    pub fn switch_to_scene(&mut self, name: &str) -> bool {
        if name.is_empty() {
            self.select_none();
            return true;
        }
        match self.scenes.position(name) {
            Some(row) => {
                self.select_row(Some(row));
                true
            }
            None => false,
        }
    }

    pub fn move_selected_up(&mut self) -> bool {
        self.scenes.move_selected(-1)
    }

    pub fn move_selected_down(&mut self) -> bool {
        self.scenes.move_selected(1)
    }

    pub fn set_tie(&mut self, tie: bool) -> bool {
        if self.tie == tie {
            return false;
        }
        self.tie = tie;
        tracing::debug!(keyer = %self.name, tie, "tie changed");
        true
    }

    pub fn transition_name(&self, role: TransitionRole) -> &str {
        self.engine.slot(role).name()
    }

    pub fn transition_duration(&self, role: TransitionRole) -> TransitionDuration {
        self.engine.slot(role).duration()
    }

    pub fn set_transition(&mut self, role: TransitionRole, name: &str) {
        let selected = self.selected_source();
        self.engine.set_transition_asset(role, name, selected);
    }

    pub fn set_transition_duration(&mut self, role: TransitionRole, duration: TransitionDuration) {
        self.engine.set_duration(role, duration);
    }

    pub fn hide_after(&self) -> Option<Duration> {
        self.hide_after
    }

    /// Auto-hide delay after showing from an empty channel; `None` disables it.
    pub fn set_hide_after(&mut self, delay: Option<Duration>) {
        self.hide_after = delay.filter(|d| !d.is_zero());
        if self.hide_after.is_none() {
            self.hide_deadline = None;
        }
    }

    pub fn hide_deadline(&self) -> Option<Instant> {
        self.hide_deadline
    }

    /// Drive the auto-hide timer; selects nothing once the deadline has passed.
    /// Auto-hide applies at once, even on a tied keyer.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.hide_deadline {
            Some(deadline) if deadline <= now => {
                self.hide_deadline = None;
                tracing::debug!(keyer = %self.name, "auto-hide");
                let changed = self.scenes.select(None);
                self.apply_selected();
                changed
            }
            _ => false,
        }
    }

    pub fn add_exclude_scene(&mut self, name: &str) -> bool {
        if !self.exclusions.insert(name) {
            return false;
        }
        self.reevaluate_program();
        true
    }

    pub fn remove_exclude_scene(&mut self, name: &str) -> bool {
        if !self.exclusions.remove(name) {
            return false;
        }
        self.reevaluate_program();
        true
    }

    pub fn is_scene_excluded(&self, name: &str) -> bool {
        self.exclusions.contains(name)
    }

    fn reevaluate_program(&mut self) {
        if let Some(program) = self.program_scene.clone() {
            self.scene_changed(&program);
        }
    }

    /// The host's program scene is now `scene`.
    pub fn scene_changed(&mut self, scene: &str) -> ApplyOutcome {
        self.program_scene = Some(scene.to_string());
        let selected = self.list_source();
        let tie = self.tie;
        let exclusions = self.exclusions.clone();
        self.tracked(|engine| engine.scene_changed(scene, &exclusions, tie, selected))
    }

    pub fn program_scene(&self) -> Option<&str> {
        self.program_scene.as_deref()
    }

    pub fn set_output_channel(&mut self, channel: u32) -> DskResult<()> {
        let selected = self.selected_source();
        self.engine.set_output_channel(channel, selected)
    }

    /// Host notification: a source was renamed.
    pub fn on_scene_renamed(&mut self, prev: &str, new: &str) {
        let renamed = self.scenes.rename(prev, new);
        self.exclusions.rename(prev, new);
        if self.program_scene.as_deref() == Some(prev) {
            self.program_scene = Some(new.to_string());
        }
        if renamed > 0 {
            tracing::debug!(keyer = %self.name, prev, new, renamed, "scene entries renamed");
        }
    }

    /// Host notification: a source was removed.
    pub fn on_scene_removed(&mut self, name: &str) {
        let was_selected = self.scenes.selected_name() == Some(name);
        let removed = self.scenes.remove_named(name);
        for entry in &removed {
            self.release_entry(entry);
        }
        if was_selected {
            self.selection_changed();
        }
    }

    /// Enable/disable half of an entry hotkey pair. Returns whether the
    /// selection changed; releases are ignored.
    pub fn on_scene_hotkey(&mut self, id: HotkeyPairId, action: HotkeyAction, pressed: bool) -> bool {
        if !pressed {
            return false;
        }
        let Some(row) = self.scenes.position_of_hotkey(id) else {
            return false;
        };
        let selected = self.scenes.selected() == Some(row);
        match action {
            HotkeyAction::Enable if !selected => self.select_row(Some(row)),
            HotkeyAction::Disable if selected => self.select_none(),
            _ => false,
        }
    }

    pub fn on_null_hotkey(&mut self, pressed: bool) {
        if pressed {
            self.select_none();
        }
    }

    pub fn on_tie_hotkey(&mut self, action: HotkeyAction, pressed: bool) -> bool {
        if !pressed {
            return false;
        }
        self.set_tie(action == HotkeyAction::Enable)
    }

    fn release_entry(&self, entry: &SceneListEntry) {
        if let Some(id) = entry.hotkey() {
            self.host.hotkeys.unregister_pair(id);
        }
    }

    pub fn save(&self) -> KeyerState {
        let slot_ms = |role| i64::from(self.transition_duration(role).as_millis());
        let (tie_enable_hotkey, tie_disable_hotkey) = self
            .tie_hotkey
            .map(|id| self.host.hotkeys.save_pair(id))
            .unwrap_or_default();
        KeyerState {
            name: self.name.clone(),
            transition: self.transition_name(TransitionRole::Match).to_string(),
            transition_duration: slot_ms(TransitionRole::Match),
            show_transition: self.transition_name(TransitionRole::Show).to_string(),
            show_transition_duration: slot_ms(TransitionRole::Show),
            hide_transition: self.transition_name(TransitionRole::Hide).to_string(),
            hide_transition_duration: slot_ms(TransitionRole::Hide),
            scenes: self
                .scenes
                .entries()
                .iter()
                .map(|e| NamedEntry::new(e.name()))
                .collect(),
            scene: self.selected_scene().unwrap_or_default().to_string(),
            exclude_scenes: self.exclusions.iter().map(NamedEntry::new).collect(),
            tie: self.tie,
            hide_after: self
                .hide_after
                .map_or(0, |d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX)),
            null_hotkey: self
                .null_hotkey
                .map(|id| self.host.hotkeys.save(id))
                .unwrap_or_default(),
            tie_enable_hotkey,
            tie_disable_hotkey,
        }
    }

    /// Replace this keyer's configuration with `state` and mount its selection.
    #[tracing::instrument(level = "debug", skip_all, fields(keyer = %self.name))]
    pub fn load(&mut self, state: &KeyerState) {
        let slots = [
            (TransitionRole::Match, &state.transition, state.transition_duration),
            (TransitionRole::Show, &state.show_transition, state.show_transition_duration),
            (TransitionRole::Hide, &state.hide_transition, state.hide_transition_duration),
        ];
        for (role, name, ms) in slots {
            self.set_transition(role, name);
            self.engine.set_duration(role, TransitionDuration::clamped(ms));
        }

        for entry in self.scenes.clear() {
            self.release_entry(&entry);
        }
        for entry in &state.scenes {
            let hotkey = self
                .host
                .scenes
                .resolve_by_name(&entry.name)
                .filter(|s| self.host.scenes.is_scene(s))
                .and_then(|s| self.host.hotkeys.register_scene_pair(&self.name, &s));
            let row = self
                .scenes
                .insert(None, SceneListEntry::new(entry.name.as_str(), hotkey));
            if !state.scene.is_empty() && entry.name == state.scene && self.scenes.selected().is_none() {
                self.scenes.select(Some(row));
            }
        }

        self.exclusions = state.exclude_scenes.iter().map(|e| e.name.as_str()).collect();
        self.tie = state.tie;
        self.set_hide_after(
            u64::try_from(state.hide_after)
                .ok()
                .map(Duration::from_millis),
        );

        if let Some(id) = self.null_hotkey {
            if !state.null_hotkey.is_null() {
                self.host.hotkeys.load(id, &state.null_hotkey);
            }
        }
        if let Some(id) = self.tie_hotkey {
            if !state.tie_enable_hotkey.is_null() || !state.tie_disable_hotkey.is_null() {
                self.host
                    .hotkeys
                    .load_pair(id, &state.tie_enable_hotkey, &state.tie_disable_hotkey);
            }
        }

        self.apply_selected();
    }
}

impl Drop for Keyer {
    fn drop(&mut self) {
        self.engine.shutdown();
        for entry in self.scenes.clear() {
            self.release_entry(&entry);
        }
        if let Some(id) = self.null_hotkey.take() {
            self.host.hotkeys.unregister(id);
        }
        if let Some(id) = self.tie_hotkey.take() {
            self.host.hotkeys.unregister_pair(id);
        }
    }
}

impl std::fmt::Debug for Keyer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keyer")
            .field("name", &self.name)
            .field("scenes", &self.scenes)
            .field("exclusions", &self.exclusions)
            .field("engine", &self.engine)
            .field("tie", &self.tie)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../tests/unit/keyer/keyer.rs"]
mod tests;
