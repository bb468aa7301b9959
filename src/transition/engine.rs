//! Switching decisions for one keyer channel.
//!
//! Every mutation runs on the control thread. The render thread only reads the
//! channel through the host compositor, so the engine's job is to make each
//! write a complete value: a scene, an empty channel, or a transition that has
//! already been configured (and, when replacing a mounted asset, has already
//! taken over the in-flight state of the one it replaces).

use crate::{
    foundation::{
        core::{MAX_CHANNELS, TransitionDuration, TransitionRole},
        error::{DskError, DskResult},
    },
    host::{HostContext, SceneChangedEvent, TransitionHandle},
    output::{
        binding::{OutputChannelBinding, OutputTarget},
        content::ChannelContent,
    },
    scene::{exclusion::ExclusionSet, reference::SceneHandle},
    transition::slot::{TransitionSlot, TransitionSlots},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Result of one switching decision.
pub enum ApplyOutcome {
    /// The channel already showed the requested source; nothing was written.
    Unchanged,
    /// The source was mounted directly.
    Cut,
    /// The asset in the given slot was started toward the source.
    Transition(TransitionRole),
}

impl ApplyOutcome {
    pub fn changed(self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

/// Decision/execution core of a keyer: owns the slots and the channel binding.
pub struct TransitionEngine {
    host: HostContext,
    binding: OutputChannelBinding,
    slots: TransitionSlots,
    keyer_name: String,
    /// Assets taken out of a slot while still mounted, cleared once the
    /// channel has been rewritten.
    retired: Vec<TransitionHandle>,
}

impl TransitionEngine {
    pub fn new(host: HostContext, target: OutputTarget, keyer_name: impl Into<String>) -> Self {
        let binding = OutputChannelBinding::new(host.compositor.clone(), target);
        Self {
            host,
            binding,
            slots: TransitionSlots::default(),
            keyer_name: keyer_name.into(),
            retired: Vec::new(),
        }
    }

    pub fn binding(&self) -> &OutputChannelBinding {
        &self.binding
    }

    pub fn slots(&self) -> &TransitionSlots {
        &self.slots
    }

    pub fn slot(&self, role: TransitionRole) -> &TransitionSlot {
        self.slots.get(role)
    }

    pub(crate) fn set_keyer_name(&mut self, name: impl Into<String>) {
        self.keyer_name = name.into();
    }

    /// Terminal scene currently shown on the channel.
    pub fn current_leaf(&self) -> Option<SceneHandle> {
        self.binding.content().leaf()
    }

    /// Switch the channel to `new_source`, cutting or cross-fading.
    ///
    /// Re-applying the source already shown writes nothing.
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(keyer = %self.keyer_name, target = %self.binding.target(), new = ?new_source)
    )]
    pub fn apply(&mut self, new_source: Option<SceneHandle>) -> ApplyOutcome {
        let current = self.binding.content();
        let prev_leaf = current.leaf();
        if prev_leaf == new_source {
            return ApplyOutcome::Unchanged;
        }
        drop(current);

        let outcome = match self.choose_transition(prev_leaf.as_ref(), new_source.as_ref()) {
            None => {
                self.binding
                    .mount(ChannelContent::from_source(new_source.clone()));
                ApplyOutcome::Cut
            }
            Some((role, asset, duration)) => {
                asset.set_endpoint(prev_leaf.clone());
                asset.start_auto(duration.as_duration(), new_source.clone());
                // Materializing an override may already have swapped it in.
                if !self.binding.content().holds(&asset) {
                    self.binding.mount(ChannelContent::Transition(asset));
                }
                ApplyOutcome::Transition(role)
            }
        };
        for asset in self.retired.drain(..) {
            asset.clear();
        }
        tracing::debug!(?outcome, "switched");

        self.emit_scene_changed(prev_leaf.as_ref(), new_source.as_ref());
        outcome
    }

    fn choose_transition(
        &mut self,
        prev: Option<&SceneHandle>,
        new: Option<&SceneHandle>,
    ) -> Option<(TransitionRole, TransitionHandle, TransitionDuration)> {
        let role = match (prev, new) {
            (None, Some(_)) if !self.slots.get(TransitionRole::Show).is_empty() => {
                Some(TransitionRole::Show)
            }
            (Some(_), None) if !self.slots.get(TransitionRole::Hide).is_empty() => {
                Some(TransitionRole::Hide)
            }
            _ => None,
        };
        let role = match role {
            Some(role) => role,
            None => match self.materialize_override(prev, new) {
                Some(role) => role,
                None if !self.slots.get(TransitionRole::Match).is_empty() => TransitionRole::Match,
                None => return None,
            },
        };
        let slot = self.slots.get(role);
        Some((role, slot.asset()?.clone(), slot.duration()))
    }

    fn materialize_override(
        &mut self,
        prev: Option<&SceneHandle>,
        new: Option<&SceneHandle>,
    ) -> Option<TransitionRole> {
        let from = prev.map_or("", SceneHandle::name);
        let to = new.map_or("", SceneHandle::name);
        let choice = self.host.overrides.transition_override(from, to)?;

        let role = TransitionRole::Override;
        if self.slots.get(role).name() != choice.name {
            let asset = self.duplicate_template(&choice.name);
            if let Some(old_asset) = self.install_asset(role, asset) {
                // The fallback below makes the one write that replaces it.
                self.retired.push(old_asset);
            }
        }
        self.slots
            .get_mut(role)
            .set_duration(TransitionDuration::unbounded(choice.duration_ms));
        (!self.slots.get(role).is_empty()).then_some(role)
    }

    /// Put a fresh duplicate of template `name` into `role`'s slot (`""` empties it).
    ///
    /// If the slot's previous asset is the mounted object it is hot-swapped for
    /// the new one, or, when there is no new one, the channel is cut to
    /// `selected`. The previous asset is cleared and released afterwards.
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(keyer = %self.keyer_name, role = %role, name = name)
    )]
    pub fn set_transition_asset(
        &mut self,
        role: TransitionRole,
        name: &str,
        selected: Option<SceneHandle>,
    ) {
        if self.slots.get(role).is_empty() && name.is_empty() {
            return;
        }

        let new_asset = if name.is_empty() {
            None
        } else {
            self.duplicate_template(name)
        };
        if let Some(old_asset) = self.install_asset(role, new_asset) {
            self.binding.mount(ChannelContent::from_source(selected));
            old_asset.clear();
        }
    }

    fn duplicate_template(&self, name: &str) -> Option<TransitionHandle> {
        let asset = self.host.transitions.duplicate(name);
        if asset.is_none() {
            tracing::warn!(name, "unknown transition template, falling back to cuts");
        }
        asset
    }

    /// Store `new_asset` in `role`'s slot, hot-swapping it in if the previous
    /// asset is mounted. Returns the previous asset when it is mounted and
    /// there is nothing to swap in; the caller must rewrite the channel, then
    /// clear it.
    fn install_asset(
        &mut self,
        role: TransitionRole,
        new_asset: Option<TransitionHandle>,
    ) -> Option<TransitionHandle> {
        let old_asset = self.slots.get_mut(role).replace(new_asset.clone())?;
        if self.binding.content().holds(&old_asset) {
            match new_asset.as_ref() {
                Some(new_asset) => self.binding.swap(new_asset, &old_asset),
                None => return Some(old_asset),
            }
        }
        old_asset.clear();
        None
    }

    pub fn set_duration(&mut self, role: TransitionRole, duration: TransitionDuration) {
        self.slots.get_mut(role).set_duration(duration);
    }

    /// React to the host's program scene changing to `scene_name`.
    ///
    /// Exclusion wins over everything; an empty channel is always resynced to
    /// the selection; otherwise only a tied keyer follows.
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(keyer = %self.keyer_name, scene = scene_name, tie = tie)
    )]
    pub fn scene_changed(
        &mut self,
        scene_name: &str,
        exclusions: &ExclusionSet,
        tie: bool,
        selected: Option<SceneHandle>,
    ) -> ApplyOutcome {
        if exclusions.contains(scene_name) {
            return self.apply(None);
        }
        if self.current_leaf().is_none() || tie {
            return self.apply(selected);
        }
        ApplyOutcome::Unchanged
    }

    /// Move the binding to `new_index` on the same sink.
    ///
    /// An asset owned by one of this keyer's slots is carried over; anything
    /// else is left behind and the new channel gets a cut to `selected`. The old
    /// channel is emptied before the new one is written.
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(keyer = %self.keyer_name, from = self.binding.channel(), to = new_index)
    )]
    pub fn set_output_channel(
        &mut self,
        new_index: u32,
        selected: Option<SceneHandle>,
    ) -> DskResult<()> {
        if new_index >= MAX_CHANNELS {
            return Err(DskError::validation(format!(
                "output channel {new_index} out of range (max {})",
                MAX_CHANNELS - 1
            )));
        }
        if new_index == self.binding.channel() {
            return Ok(());
        }

        let current = self.binding.content();
        let carried = current
            .transition()
            .filter(|asset| self.slots.owner_of(asset).is_some())
            .cloned();
        if !current.is_empty() {
            self.binding.mount(ChannelContent::Empty);
        }
        drop(current);

        self.binding.set_channel(new_index);
        match carried {
            Some(asset) => self.binding.mount(ChannelContent::Transition(asset)),
            None => self.binding.mount(ChannelContent::from_source(selected)),
        }
        Ok(())
    }

    /// Empty the channel and release every slot asset.
    pub(crate) fn shutdown(&mut self) {
        if !self.binding.content().is_empty() {
            self.binding.mount(ChannelContent::Empty);
        }
        for asset in self.slots.take_all() {
            asset.clear();
        }
    }

    fn emit_scene_changed(&self, prev: Option<&SceneHandle>, new: Option<&SceneHandle>) {
        let event = SceneChangedEvent {
            keyer_name: self.keyer_name.clone(),
            channel: self.binding.channel(),
            old_scene: prev.map_or_else(String::new, |s| s.name().to_string()),
            new_scene: new.map_or_else(String::new, |s| s.name().to_string()),
        };
        self.host.events.scene_changed(&event);
    }
}

impl std::fmt::Debug for TransitionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransitionEngine")
            .field("keyer_name", &self.keyer_name)
            .field("binding", &self.binding)
            .field("slots", &self.slots)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/transition/engine.rs"]
mod tests;
