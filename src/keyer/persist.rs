use crate::{
    foundation::{
        core::TransitionDuration,
        error::{DskError, DskResult},
    },
    output::binding::OutputSink,
};

#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
/// `{ "name": ... }` element of the `scenes` and `exclude_scenes` arrays.
pub struct NamedEntry {
    pub name: String,
}

impl NamedEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

fn default_duration_ms() -> i64 {
    i64::from(TransitionDuration::DEFAULT_MS)
}

fn is_null(v: &serde_json::Value) -> bool {
    v.is_null()
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Persisted block of one keyer.
///
/// Durations and delays are kept as raw integers so out-of-range values in
/// old or hand-edited files can be clamped on load instead of rejected.
pub struct KeyerState {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub transition: String,
    #[serde(default = "default_duration_ms")]
    pub transition_duration: i64,
    #[serde(default)]
    pub show_transition: String,
    #[serde(default = "default_duration_ms")]
    pub show_transition_duration: i64,
    #[serde(default)]
    pub hide_transition: String,
    #[serde(default = "default_duration_ms")]
    pub hide_transition_duration: i64,
    /// Scene list in display order.
    #[serde(default)]
    pub scenes: Vec<NamedEntry>,
    /// Selected scene name, `""` for none.
    #[serde(default)]
    pub scene: String,
    #[serde(default)]
    pub exclude_scenes: Vec<NamedEntry>,
    #[serde(default)]
    pub tie: bool,
    /// Auto-hide delay in milliseconds, `0` when disabled.
    #[serde(default)]
    pub hide_after: i64,
    #[serde(default, skip_serializing_if = "is_null")]
    pub null_hotkey: serde_json::Value,
    #[serde(default, skip_serializing_if = "is_null")]
    pub tie_enable_hotkey: serde_json::Value,
    #[serde(default, skip_serializing_if = "is_null")]
    pub tie_disable_hotkey: serde_json::Value,
}

impl Default for KeyerState {
    fn default() -> Self {
        Self {
            name: String::new(),
            transition: String::new(),
            transition_duration: default_duration_ms(),
            show_transition: String::new(),
            show_transition_duration: default_duration_ms(),
            hide_transition: String::new(),
            hide_transition_duration: default_duration_ms(),
            scenes: Vec::new(),
            scene: String::new(),
            exclude_scenes: Vec::new(),
            tie: false,
            hide_after: 0,
            null_hotkey: serde_json::Value::Null,
            tie_enable_hotkey: serde_json::Value::Null,
            tie_disable_hotkey: serde_json::Value::Null,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
/// Persisted block of one dock: base channel plus its keyers in tab order.
pub struct DockState {
    /// Raw base channel; `None` when the key was missing.
    pub channel: Option<i64>,
    /// `None` when the keyers array was missing altogether.
    pub keyers: Option<Vec<KeyerState>>,
}

impl DockState {
    const CHANNEL_KEY: &'static str = "downstream_keyers_channel";
    const KEYERS_KEY: &'static str = "downstream_keyers";

    /// Read the dock's keys (prefixed for alternate sinks) out of a save blob.
    pub fn from_json(
        blob: &serde_json::Map<String, serde_json::Value>,
        sink: &OutputSink,
    ) -> DskResult<Self> {
        let prefix = sink.key_prefix();
        let channel = match blob.get(&format!("{prefix}{}", Self::CHANNEL_KEY)) {
            None | Some(serde_json::Value::Null) => None,
            Some(v) => Some(v.as_i64().ok_or_else(|| {
                DskError::serde(format!("'{prefix}{}' must be an integer", Self::CHANNEL_KEY))
            })?),
        };
        let keyers = match blob.get(&format!("{prefix}{}", Self::KEYERS_KEY)) {
            None | Some(serde_json::Value::Null) => None,
            Some(v) => Some(serde_json::from_value::<Vec<KeyerState>>(v.clone())?),
        };
        Ok(Self { channel, keyers })
    }

    /// Write the dock's keys into `blob`, leaving unrelated keys alone.
    pub fn write_json(
        &self,
        blob: &mut serde_json::Map<String, serde_json::Value>,
        sink: &OutputSink,
    ) -> DskResult<()> {
        let prefix = sink.key_prefix();
        if let Some(channel) = self.channel {
            blob.insert(
                format!("{prefix}{}", Self::CHANNEL_KEY),
                serde_json::Value::from(channel),
            );
        }
        let keyers = self.keyers.as_deref().unwrap_or_default();
        blob.insert(
            format!("{prefix}{}", Self::KEYERS_KEY),
            serde_json::to_value(keyers)?,
        );
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/keyer/persist.rs"]
mod tests;
