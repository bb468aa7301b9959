use std::{fmt, sync::Arc};

use crate::{host::TransitionHandle, scene::reference::SceneHandle};

#[derive(Clone, Debug, Default)]
/// What an output channel currently holds.
///
/// A transition's active leaf is read from the asset itself, so the variant
/// only carries the handle.
pub enum ChannelContent {
    #[default]
    Empty,
    Scene(SceneHandle),
    Transition(TransitionHandle),
}

impl ChannelContent {
    /// Hard-cut content for an optional source.
    pub fn from_source(source: Option<SceneHandle>) -> Self {
        match source {
            Some(scene) => Self::Scene(scene),
            None => Self::Empty,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Terminal scene shown by this content, unwrapping transitions.
    pub fn leaf(&self) -> Option<SceneHandle> {
        match self {
            Self::Empty => None,
            Self::Scene(scene) => Some(scene.clone()),
            Self::Transition(asset) => asset.active_source(),
        }
    }

    pub fn transition(&self) -> Option<&TransitionHandle> {
        match self {
            Self::Transition(asset) => Some(asset),
            _ => None,
        }
    }

    /// True when `self` holds exactly `asset` (object identity).
    pub fn holds(&self, asset: &TransitionHandle) -> bool {
        self.transition().is_some_and(|t| same_asset(t, asset))
    }
}

impl fmt::Display for ChannelContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("empty"),
            Self::Scene(scene) => write!(f, "scene '{}'", scene.name()),
            Self::Transition(asset) => match asset.active_source() {
                Some(scene) => write!(f, "transition '{}' -> '{}'", asset.name(), scene.name()),
                None => write!(f, "transition '{}' -> empty", asset.name()),
            },
        }
    }
}

/// Object identity of two transition handles.
pub fn same_asset(a: &TransitionHandle, b: &TransitionHandle) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

#[cfg(test)]
#[path = "../../tests/unit/output/content.rs"]
mod tests;
