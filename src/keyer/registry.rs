use std::{collections::BTreeMap, time::Instant};

use crate::{
    foundation::error::{DskError, DskResult},
    host::HostContext,
    keyer::{
        Keyer,
        dock::{Dock, DockConfig},
    },
    output::binding::OutputSink,
};

#[derive(Debug, Default)]
/// Every dock the host has attached, keyed by output sink.
///
/// Scene-level notifications (renames, removals) reach all docks; program
/// changes are per sink since each sink has its own program scene.
pub struct KeyerRegistry {
    docks: BTreeMap<OutputSink, Dock>,
}

impl KeyerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a fresh dock for `sink`. Fails if the sink already has one.
    pub fn attach(&mut self, sink: OutputSink, host: HostContext, config: DockConfig) -> DskResult<&mut Dock> {
        if self.docks.contains_key(&sink) {
            return Err(DskError::validation(format!("output {sink} already has a keyer dock")));
        }
        let dock = Dock::new(sink.clone(), host, config)?;
        tracing::info!(sink = %sink, base_channel = dock.base_channel(), "keyer dock attached");
        Ok(self.docks.entry(sink).or_insert(dock))
    }

    /// Detach and tear down the dock for `sink`.
    pub fn detach(&mut self, sink: &OutputSink) -> bool {
        match self.docks.remove(sink) {
            Some(dock) => {
                tracing::info!(sink = %sink, "keyer dock detached");
                drop(dock);
                true
            }
            None => false,
        }
    }

    pub fn dock(&self, sink: &OutputSink) -> Option<&Dock> {
        self.docks.get(sink)
    }

    pub fn dock_mut(&mut self, sink: &OutputSink) -> DskResult<&mut Dock> {
        self.docks
            .get_mut(sink)
            .ok_or_else(|| DskError::not_found(format!("no keyer dock attached to {sink}")))
    }

    pub fn docks(&self) -> impl Iterator<Item = &Dock> {
        self.docks.values()
    }

    pub fn keyer_mut(&mut self, sink: &OutputSink, name: &str) -> DskResult<&mut Keyer> {
        self.dock_mut(sink)?.keyer_mut(name)
    }

    pub fn program_changed(&mut self, sink: &OutputSink, scene: &str) -> DskResult<()> {
        self.dock_mut(sink)?.scene_changed(scene);
        Ok(())
    }

    pub fn scene_renamed(&mut self, prev: &str, new: &str) {
        for dock in self.docks.values_mut() {
            dock.scene_renamed(prev, new);
        }
    }

    pub fn scene_removed(&mut self, name: &str) {
        for dock in self.docks.values_mut() {
            dock.scene_removed(name);
        }
    }

    pub fn tick(&mut self, now: Instant) {
        for dock in self.docks.values_mut() {
            dock.tick(now);
        }
    }

    /// Write every dock into one scene-collection blob.
    pub fn save_all(&self, blob: &mut serde_json::Map<String, serde_json::Value>) -> DskResult<()> {
        for dock in self.docks.values() {
            dock.save_json(blob)?;
        }
        Ok(())
    }

    /// Load every attached dock from `blob`. A dock whose section fails to
    /// parse is reset to defaults and the first error is returned.
    pub fn load_all(&mut self, blob: &serde_json::Map<String, serde_json::Value>) -> DskResult<()> {
        let mut first_err = None;
        for dock in self.docks.values_mut() {
            if let Err(err) = dock.load_json(blob) {
                tracing::warn!(sink = %dock.sink(), %err, "failed to load keyer dock");
                dock.reset()?;
                first_err.get_or_insert(err);
            }
        }
        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/keyer/registry.rs"]
mod tests;
