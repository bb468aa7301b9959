use std::{fmt, sync::Arc};

use crate::host::SceneDirectory;

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
/// Host identity of a scene, stable across renames.
pub struct SceneId(pub u64);

#[derive(Clone)]
/// A resolved, host-refcounted scene.
///
/// Equality is identity (`id`), never the display name: two scenes may share
/// a name after a rename collision and still be different sources.
pub struct SceneHandle {
    id: SceneId,
    name: Arc<str>,
}

impl SceneHandle {
    pub fn new(id: SceneId, name: impl Into<Arc<str>>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    pub fn id(&self) -> SceneId {
        self.id
    }

    /// Display name at the time the handle was resolved.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl PartialEq for SceneHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for SceneHandle {}

impl fmt::Debug for SceneHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Scene({}#{})", self.name, self.id.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
/// Weak, name-keyed reference to a scene.
///
/// Nothing is cached: every [`SceneRef::resolve`] asks the directory again,
/// since the host may rename or delete the scene between calls.
pub struct SceneRef {
    name: String,
}

impl SceneRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Resolve to a live scene; sources that exist but are not scenes resolve to `None`.
    pub fn resolve(&self, scenes: &dyn SceneDirectory) -> Option<SceneHandle> {
        if self.name.is_empty() {
            return None;
        }
        scenes
            .resolve_by_name(&self.name)
            .filter(|handle| scenes.is_scene(handle))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/reference.rs"]
mod tests;
