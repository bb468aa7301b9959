use std::{fmt, sync::Arc};

use crate::{
    foundation::core::MAX_CHANNELS,
    host::{Compositor, TransitionHandle},
    output::content::ChannelContent,
};

#[derive(
    Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
/// Which mixer a keyer's channel belongs to.
pub enum OutputSink {
    /// The host's global output mixer.
    Main,
    /// A named view or canvas with its own channel set.
    Alternate(String),
}

impl OutputSink {
    pub fn name(&self) -> &str {
        match self {
            Self::Main => "main",
            Self::Alternate(name) => name,
        }
    }

    /// Lowest channel a dock on this sink may start at. On the main mixer the
    /// channels below 7 carry the program scene and the global audio sources;
    /// on an alternate sink channel 0 is its own program scene.
    pub fn min_base_channel(&self) -> u32 {
        match self {
            Self::Main => 7,
            Self::Alternate(_) => 1,
        }
    }

    /// Clamp a persisted base channel into `min_base_channel()..MAX_CHANNELS`.
    pub fn clamp_base_channel(&self, channel: i64) -> u32 {
        let min = self.min_base_channel();
        if channel < i64::from(min) || channel >= i64::from(MAX_CHANNELS) {
            min
        } else {
            channel as u32
        }
    }

    /// Prefix applied to persisted dock keys.
    pub fn key_prefix(&self) -> String {
        match self {
            Self::Main => String::new(),
            Self::Alternate(name) => format!("{name}_"),
        }
    }
}

impl fmt::Display for OutputSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(
    Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
/// One numbered channel on one sink.
pub struct OutputTarget {
    pub sink: OutputSink,
    pub channel: u32,
}

impl OutputTarget {
    pub fn main(channel: u32) -> Self {
        Self {
            sink: OutputSink::Main,
            channel,
        }
    }

    pub fn alternate(sink: impl Into<String>, channel: u32) -> Self {
        Self {
            sink: OutputSink::Alternate(sink.into()),
            channel,
        }
    }
}

impl fmt::Display for OutputTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.sink, self.channel)
    }
}

#[derive(Clone)]
/// A keyer's attachment to one host output channel.
pub struct OutputChannelBinding {
    compositor: Arc<dyn Compositor>,
    target: OutputTarget,
}

impl OutputChannelBinding {
    pub fn new(compositor: Arc<dyn Compositor>, target: OutputTarget) -> Self {
        Self { compositor, target }
    }

    pub fn target(&self) -> &OutputTarget {
        &self.target
    }

    pub fn channel(&self) -> u32 {
        self.target.channel
    }

    pub fn content(&self) -> ChannelContent {
        self.compositor.channel(&self.target)
    }

    pub fn mount(&self, content: ChannelContent) {
        self.compositor.mount(&self.target, content);
    }

    /// Replace the mounted `old` asset by `new` in two phases.
    ///
    /// `new` takes over `old`'s in-flight state before it is mounted, so the
    /// render thread sees either the complete old or the complete new object.
    /// `old` stays alive (held by the caller) until `swap_end` has run.
    pub fn swap(&self, new: &TransitionHandle, old: &TransitionHandle) {
        new.swap_begin(old.as_ref());
        self.mount(ChannelContent::Transition(new.clone()));
        new.swap_end(old.as_ref());
    }

    pub(crate) fn set_channel(&mut self, channel: u32) {
        self.target.channel = channel;
    }
}

impl fmt::Debug for OutputChannelBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputChannelBinding")
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/output/binding.rs"]
mod tests;
