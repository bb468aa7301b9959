use std::time::Instant;

use crate::{
    foundation::{
        core::{MAX_CHANNELS, TransitionDuration, TransitionRole},
        error::{DskError, DskResult},
    },
    host::HostContext,
    keyer::{
        Keyer,
        persist::{DockState, KeyerState},
    },
    output::binding::{OutputSink, OutputTarget},
};

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
/// Settings a dock starts from before anything is loaded.
pub struct DockConfig {
    /// Channel of the first keyer; later keyers take the following channels.
    pub base_channel: u32,
    /// Name given to the keyer a dock is never without.
    pub default_keyer_name: String,
    /// Duration put into the match/show/hide slots of new keyers.
    pub default_duration_ms: u32,
}

impl Default for DockConfig {
    fn default() -> Self {
        Self {
            base_channel: OutputSink::Main.min_base_channel(),
            default_keyer_name: "Default".to_string(),
            default_duration_ms: TransitionDuration::DEFAULT_MS,
        }
    }
}

impl DockConfig {
    pub fn for_sink(sink: &OutputSink) -> Self {
        Self {
            base_channel: sink.min_base_channel(),
            ..Self::default()
        }
    }
}

#[derive(Debug)]
/// The keyers of one output sink, in tab order. Keyer `i` is bound to
/// channel `base_channel + i`.
pub struct Dock {
    sink: OutputSink,
    host: HostContext,
    config: DockConfig,
    base_channel: u32,
    keyers: Vec<Keyer>,
    /// Last program scene reported for this sink; keyers created later start from it.
    program_scene: Option<String>,
}

impl Dock {
    /// New dock holding only the default keyer.
    pub fn new(sink: OutputSink, host: HostContext, config: DockConfig) -> DskResult<Self> {
        let base_channel = sink.clamp_base_channel(i64::from(config.base_channel));
        let mut dock = Self {
            sink,
            host,
            config,
            base_channel,
            keyers: Vec::new(),
            program_scene: None,
        };
        dock.add_default_keyer()?;
        Ok(dock)
    }

    pub fn sink(&self) -> &OutputSink {
        &self.sink
    }

    pub fn base_channel(&self) -> u32 {
        self.base_channel
    }

    pub fn program_scene(&self) -> Option<&str> {
        self.program_scene.as_deref()
    }

    pub fn keyers(&self) -> &[Keyer] {
        &self.keyers
    }

    pub fn keyer(&self, name: &str) -> Option<&Keyer> {
        self.keyers.iter().find(|k| k.name() == name)
    }

    pub fn keyer_mut(&mut self, name: &str) -> DskResult<&mut Keyer> {
        let sink = &self.sink;
        self.keyers
            .iter_mut()
            .find(|k| k.name() == name)
            .ok_or_else(|| DskError::not_found(format!("no downstream keyer '{name}' on {sink}")))
    }

    fn target_for(&self, position: usize) -> DskResult<OutputTarget> {
        let channel = u32::try_from(position)
            .ok()
            .and_then(|p| self.base_channel.checked_add(p))
            .filter(|c| *c < MAX_CHANNELS)
            .ok_or_else(|| {
                DskError::validation(format!(
                    "no free output channel for keyer #{position} (base {})",
                    self.base_channel
                ))
            })?;
        Ok(OutputTarget {
            sink: self.sink.clone(),
            channel,
        })
    }

    /// Append a keyer named `name` on the next channel.
    pub fn add_keyer(&mut self, name: &str) -> DskResult<&mut Keyer> {
        if name.trim().is_empty() {
            return Err(DskError::validation("keyer name must be non-empty"));
        }
        if self.keyer(name).is_some() {
            return Err(DskError::validation(format!(
                "downstream keyer '{name}' already exists on {}",
                self.sink
            )));
        }
        let target = self.target_for(self.keyers.len())?;
        let mut keyer = Keyer::new(name, self.host.clone(), target);
        let duration = TransitionDuration::clamped(i64::from(self.config.default_duration_ms));
        for role in [TransitionRole::Match, TransitionRole::Show, TransitionRole::Hide] {
            keyer.set_transition_duration(role, duration);
        }
        if let Some(program) = self.program_scene.as_deref() {
            keyer.scene_changed(program);
        }
        tracing::debug!(sink = %self.sink, keyer = name, channel = keyer.channel(), "keyer added");
        self.keyers.push(keyer);
        let idx = self.keyers.len() - 1;
        Ok(&mut self.keyers[idx])
    }

    fn add_default_keyer(&mut self) -> DskResult<()> {
        let name = self.config.default_keyer_name.clone();
        self.add_keyer(&name).map(|_| ())
    }

    pub fn rename_keyer(&mut self, name: &str, new_name: &str) -> DskResult<()> {
        if name == new_name {
            return Ok(());
        }
        if new_name.trim().is_empty() {
            return Err(DskError::validation("keyer name must be non-empty"));
        }
        if self.keyer(new_name).is_some() {
            return Err(DskError::validation(format!(
                "downstream keyer '{new_name}' already exists on {}",
                self.sink
            )));
        }
        self.keyer_mut(name)?.set_name(new_name);
        Ok(())
    }

    /// Remove a keyer; the remaining ones close the gap in the channel range.
    /// A dock left empty gets its default keyer back.
    pub fn remove_keyer(&mut self, name: &str) -> DskResult<()> {
        let idx = self
            .keyers
            .iter()
            .position(|k| k.name() == name)
            .ok_or_else(|| DskError::not_found(format!("no downstream keyer '{name}' on {}", self.sink)))?;
        drop(self.keyers.remove(idx));
        self.rebind_keyers(false)?;
        if self.keyers.is_empty() {
            self.add_default_keyer()?;
        }
        Ok(())
    }

    /// Drop every keyer.
    pub fn clear(&mut self) {
        // Tear down from the last tab so lower channels are released last.
        while let Some(keyer) = self.keyers.pop() {
            drop(keyer);
        }
    }

    /// Scene-collection cleanup: drop every keyer and start over with the default one.
    pub fn reset(&mut self) -> DskResult<()> {
        self.clear();
        self.add_default_keyer()
    }

    /// Move the whole channel range to start at `base_channel`.
    pub fn set_base_channel(&mut self, base_channel: u32) -> DskResult<()> {
        let min = self.sink.min_base_channel();
        let needed = u32::try_from(self.keyers.len()).unwrap_or(u32::MAX);
        if base_channel < min || base_channel.saturating_add(needed) > MAX_CHANNELS {
            return Err(DskError::validation(format!(
                "base channel {base_channel} invalid for {} keyers on {} (allowed {min}..{MAX_CHANNELS})",
                self.keyers.len(),
                self.sink
            )));
        }
        let moving_up = base_channel > self.base_channel;
        self.base_channel = base_channel;
        self.rebind_keyers(moving_up)
    }

    /// Re-bind keyer `i` to `base_channel + i`. Walking against the direction
    /// of travel keeps a keyer from landing on a channel a later one still uses.
    fn rebind_keyers(&mut self, moving_up: bool) -> DskResult<()> {
        let base = self.base_channel;
        let mut order: Vec<usize> = (0..self.keyers.len()).collect();
        if moving_up {
            order.reverse();
        }
        for idx in order {
            let channel = base + u32::try_from(idx).unwrap_or(u32::MAX);
            self.keyers[idx].set_output_channel(channel)?;
        }
        Ok(())
    }

    /// Fan the program scene change out to every keyer.
    pub fn scene_changed(&mut self, scene: &str) {
        self.program_scene = Some(scene.to_string());
        for keyer in &mut self.keyers {
            keyer.scene_changed(scene);
        }
    }

    pub fn scene_renamed(&mut self, prev: &str, new: &str) {
        if self.program_scene.as_deref() == Some(prev) {
            self.program_scene = Some(new.to_string());
        }
        for keyer in &mut self.keyers {
            keyer.on_scene_renamed(prev, new);
        }
    }

    pub fn scene_removed(&mut self, name: &str) {
        for keyer in &mut self.keyers {
            keyer.on_scene_removed(name);
        }
    }

    pub fn tick(&mut self, now: Instant) {
        for keyer in &mut self.keyers {
            keyer.tick(now);
        }
    }

    pub fn switch_scene(&mut self, keyer: &str, scene: &str) -> DskResult<bool> {
        Ok(self.keyer_mut(keyer)?.switch_to_scene(scene))
    }

    pub fn add_scene(&mut self, keyer: &str, scene: &str) -> DskResult<bool> {
        Ok(self.keyer_mut(keyer)?.add_scene(scene, None))
    }

    pub fn remove_scene(&mut self, keyer: &str, scene: &str) -> DskResult<bool> {
        Ok(self.keyer_mut(keyer)?.remove_scene(scene))
    }

    pub fn set_tie(&mut self, keyer: &str, tie: bool) -> DskResult<()> {
        self.keyer_mut(keyer)?.set_tie(tie);
        Ok(())
    }

    /// Set a slot's transition and duration; the duration is clamped into the
    /// operator range.
    pub fn set_transition(
        &mut self,
        keyer: &str,
        role: TransitionRole,
        transition: &str,
        duration_ms: i64,
    ) -> DskResult<()> {
        let keyer = self.keyer_mut(keyer)?;
        keyer.set_transition(role, transition);
        keyer.set_transition_duration(role, TransitionDuration::clamped(duration_ms));
        Ok(())
    }

    pub fn add_exclude_scene(&mut self, keyer: &str, scene: &str) -> DskResult<bool> {
        Ok(self.keyer_mut(keyer)?.add_exclude_scene(scene))
    }

    pub fn remove_exclude_scene(&mut self, keyer: &str, scene: &str) -> DskResult<bool> {
        Ok(self.keyer_mut(keyer)?.remove_exclude_scene(scene))
    }

    pub fn keyer_state(&self, keyer: &str) -> DskResult<KeyerState> {
        self.keyer(keyer)
            .map(Keyer::save)
            .ok_or_else(|| DskError::not_found(format!("no downstream keyer '{keyer}' on {}", self.sink)))
    }

    pub fn save(&self) -> DockState {
        DockState {
            channel: Some(i64::from(self.base_channel)),
            keyers: Some(self.keyers.iter().map(Keyer::save).collect()),
        }
    }

    /// Replace every keyer with the ones in `state`.
    #[tracing::instrument(level = "debug", skip_all, fields(sink = %self.sink))]
    pub fn load(&mut self, state: &DockState) -> DskResult<()> {
        self.clear();
        self.base_channel = match state.channel {
            Some(channel) => self.sink.clamp_base_channel(channel),
            None => self.sink.clamp_base_channel(i64::from(self.config.base_channel)),
        };

        for keyer_state in state.keyers.as_deref().unwrap_or_default() {
            let name = if keyer_state.name.trim().is_empty() {
                self.config.default_keyer_name.clone()
            } else {
                keyer_state.name.clone()
            };
            match self.add_keyer(&name) {
                Ok(keyer) => keyer.load(keyer_state),
                Err(err) => tracing::warn!(keyer = %name, %err, "skipping persisted keyer"),
            }
        }
        if self.keyers.is_empty() {
            self.add_default_keyer()?;
        }
        Ok(())
    }

    pub fn save_json(&self, blob: &mut serde_json::Map<String, serde_json::Value>) -> DskResult<()> {
        self.save().write_json(blob, &self.sink)
    }

    pub fn load_json(&mut self, blob: &serde_json::Map<String, serde_json::Value>) -> DskResult<()> {
        let state = DockState::from_json(blob, &self.sink)?;
        self.load(&state)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/keyer/dock.rs"]
mod tests;
