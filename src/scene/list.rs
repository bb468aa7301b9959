use crate::{
    foundation::core::HotkeyPairId,
    host::SceneDirectory,
    scene::reference::{SceneHandle, SceneRef},
};

#[derive(Clone, Debug, PartialEq, Eq)]
/// One candidate scene in a keyer's list.
pub struct SceneListEntry {
    scene: SceneRef,
    hotkey: Option<HotkeyPairId>,
}

impl SceneListEntry {
    pub fn new(name: impl Into<String>, hotkey: Option<HotkeyPairId>) -> Self {
        Self {
            scene: SceneRef::new(name),
            hotkey,
        }
    }

    pub fn name(&self) -> &str {
        self.scene.name()
    }

    pub fn hotkey(&self) -> Option<HotkeyPairId> {
        self.hotkey
    }

    pub fn scene(&self) -> &SceneRef {
        &self.scene
    }
}

#[derive(Clone, Debug, Default)]
/// Ordered scene entries plus the (single) selected row.
///
/// Entries are joined to host scenes by display name. The list itself does no
/// host calls besides resolving; hotkey registration is done by the keyer.
pub struct SceneList {
    entries: Vec<SceneListEntry>,
    selected: Option<usize>,
}

impl SceneList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[SceneListEntry] {
        &self.entries
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.name().to_string()).collect()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.name() == name)
    }

    pub fn position_of_hotkey(&self, id: HotkeyPairId) -> Option<usize> {
        self.entries.iter().position(|e| e.hotkey == Some(id))
    }

    /// Insert before `row`, or append when `row` is `None` or past the end.
    /// The selected entry stays selected.
    pub fn insert(&mut self, row: Option<usize>, entry: SceneListEntry) -> usize {
        let row = row.unwrap_or(self.entries.len()).min(self.entries.len());
        self.entries.insert(row, entry);
        if let Some(sel) = self.selected.as_mut() {
            if *sel >= row {
                *sel += 1;
            }
        }
        row
    }

    /// Remove the entry at `row`; clears the selection if it pointed there.
    pub fn remove(&mut self, row: usize) -> Option<SceneListEntry> {
        if row >= self.entries.len() {
            return None;
        }
        let entry = self.entries.remove(row);
        self.selected = match self.selected {
            Some(sel) if sel == row => None,
            Some(sel) if sel > row => Some(sel - 1),
            other => other,
        };
        Some(entry)
    }

    pub fn clear(&mut self) -> Vec<SceneListEntry> {
        self.selected = None;
        std::mem::take(&mut self.entries)
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_entry(&self) -> Option<&SceneListEntry> {
        self.selected.and_then(|row| self.entries.get(row))
    }

    pub fn selected_name(&self) -> Option<&str> {
        self.selected_entry().map(SceneListEntry::name)
    }

    /// Returns whether the selection changed. Out-of-range rows select nothing.
    pub fn select(&mut self, row: Option<usize>) -> bool {
        let row = row.filter(|r| *r < self.entries.len());
        if self.selected == row {
            return false;
        }
        self.selected = row;
        true
    }

    /// Resolve the selected entry against the host; `None` when nothing is
    /// selected or the scene vanished.
    pub fn resolve_selected(&self, scenes: &dyn SceneDirectory) -> Option<SceneHandle> {
        self.selected_entry()?.scene.resolve(scenes)
    }

    /// Move the selected entry by `offset` rows; the selection follows it.
    pub fn move_selected(&mut self, offset: isize) -> bool {
        let Some(row) = self.selected else {
            return false;
        };
        let Some(target) = row.checked_add_signed(offset) else {
            return false;
        };
        if target >= self.entries.len() || target == row {
            return false;
        }
        let entry = self.entries.remove(row);
        self.entries.insert(target, entry);
        self.selected = Some(target);
        true
    }

    /// Rename every entry displayed as `prev`. Returns the number renamed.
    pub fn rename(&mut self, prev: &str, new: &str) -> usize {
        let mut renamed = 0;
        for entry in self.entries.iter_mut().filter(|e| e.name() == prev) {
            entry.scene.rename(new);
            renamed += 1;
        }
        renamed
    }

    /// Remove every entry displayed as `name`, returning them in list order.
    pub fn remove_named(&mut self, name: &str) -> Vec<SceneListEntry> {
        let mut removed = Vec::new();
        let mut row = self.entries.len();
        while row > 0 {
            row -= 1;
            if self.entries[row].name() == name {
                if let Some(entry) = self.remove(row) {
                    removed.push(entry);
                }
            }
        }
        removed.reverse();
        removed
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/list.rs"]
mod tests;
