use crate::{
    foundation::core::{TransitionDuration, TransitionRole},
    host::TransitionHandle,
    output::content::same_asset,
};

#[derive(Clone, Debug)]
/// One of a keyer's transition slots.
///
/// A non-empty slot exclusively owns exactly one duplicated asset; the
/// duration is an independent field.
pub struct TransitionSlot {
    role: TransitionRole,
    asset: Option<TransitionHandle>,
    duration: TransitionDuration,
}

impl TransitionSlot {
    pub fn new(role: TransitionRole) -> Self {
        Self {
            role,
            asset: None,
            duration: TransitionDuration::default(),
        }
    }

    pub fn role(&self) -> TransitionRole {
        self.role
    }

    /// Template name of the owned asset, `""` when empty.
    pub fn name(&self) -> &str {
        self.asset.as_ref().map_or("", |a| a.name())
    }

    pub fn asset(&self) -> Option<&TransitionHandle> {
        self.asset.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.asset.is_none()
    }

    pub fn duration(&self) -> TransitionDuration {
        self.duration
    }

    pub fn set_duration(&mut self, duration: TransitionDuration) {
        self.duration = duration;
    }

    pub fn holds(&self, asset: &TransitionHandle) -> bool {
        self.asset.as_ref().is_some_and(|a| same_asset(a, asset))
    }

    pub(crate) fn replace(&mut self, asset: Option<TransitionHandle>) -> Option<TransitionHandle> {
        std::mem::replace(&mut self.asset, asset)
    }
}

#[derive(Clone, Debug)]
/// The `match`, `show`, `hide` and `override` slots of one keyer.
pub struct TransitionSlots {
    slots: [TransitionSlot; 4],
}

impl Default for TransitionSlots {
    fn default() -> Self {
        Self {
            slots: TransitionRole::ALL.map(TransitionSlot::new),
        }
    }
}

impl TransitionSlots {
    fn index(role: TransitionRole) -> usize {
        match role {
            TransitionRole::Match => 0,
            TransitionRole::Show => 1,
            TransitionRole::Hide => 2,
            TransitionRole::Override => 3,
        }
    }

    pub fn get(&self, role: TransitionRole) -> &TransitionSlot {
        &self.slots[Self::index(role)]
    }

    pub fn get_mut(&mut self, role: TransitionRole) -> &mut TransitionSlot {
        &mut self.slots[Self::index(role)]
    }

    /// Role of the slot owning `asset`, if this keyer owns it at all.
    pub fn owner_of(&self, asset: &TransitionHandle) -> Option<TransitionRole> {
        self.slots.iter().find(|s| s.holds(asset)).map(|s| s.role)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TransitionSlot> {
        self.slots.iter()
    }

    /// Empty every slot, handing back the assets for release.
    pub(crate) fn take_all(&mut self) -> Vec<TransitionHandle> {
        self.slots.iter_mut().filter_map(|s| s.replace(None)).collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/transition/slot.rs"]
mod tests;
