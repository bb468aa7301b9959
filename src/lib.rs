//! Downstream keyers: operator-controlled scene lists switched onto dedicated
//! output channels above the program scene.
//!
//! Each [`Keyer`] owns one channel on one output sink. Selecting a scene cuts
//! it onto the channel, or plays it in through one of four transition slots
//! (match, show, hide, override). Keyers live in a [`Dock`], one dock per
//! output sink, and a [`KeyerRegistry`] tracks every attached dock.
//!
//! The host application is reached only through the traits in [`host`];
//! [`host::memory::MemoryHost`] implements them in-process.
#![forbid(unsafe_code)]

mod foundation;

/// Host collaborator traits and the in-memory reference host.
pub mod host;
pub(crate) mod keyer;
pub(crate) mod output;
pub(crate) mod scene;
pub(crate) mod transition;

pub use crate::foundation::core::{
    HotkeyId, HotkeyPairId, MAX_CHANNELS, TransitionDuration, TransitionRole,
};
pub use crate::foundation::error::{DskError, DskResult};

pub use crate::host::{
    Compositor, EventSink, HostContext, HotkeyRegistrar, NoEvents, NoOverride, OverridePolicy,
    SceneChangedEvent, SceneDirectory, SceneOverrides, Transition, TransitionHandle,
    TransitionOverride, TransitionRegistry, TransitionSnapshot,
};
pub use crate::keyer::dock::{Dock, DockConfig};
pub use crate::keyer::persist::{DockState, KeyerState, NamedEntry};
pub use crate::keyer::registry::KeyerRegistry;
pub use crate::keyer::{HotkeyAction, Keyer};
pub use crate::output::binding::{OutputChannelBinding, OutputSink, OutputTarget};
pub use crate::output::content::{ChannelContent, same_asset};
pub use crate::scene::exclusion::ExclusionSet;
pub use crate::scene::list::{SceneList, SceneListEntry};
pub use crate::scene::reference::{SceneHandle, SceneId, SceneRef};
pub use crate::transition::engine::{ApplyOutcome, TransitionEngine};
pub use crate::transition::slot::{TransitionSlot, TransitionSlots};
