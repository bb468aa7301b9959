use std::{fmt, str::FromStr, time::Duration};

use crate::foundation::error::{DskError, DskResult};

/// Number of output channels exposed by the host mixer.
pub const MAX_CHANNELS: u32 = 64;

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
/// Host handle of a registered enable/disable hotkey pair.
pub struct HotkeyPairId(pub u64);

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
/// Host handle of a single registered hotkey.
pub struct HotkeyId(pub u64);

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
/// Which of a keyer's four transition slots is addressed.
pub enum TransitionRole {
    /// Used for scene-to-scene switches.
    Match,
    /// Used when the output goes from empty to a scene.
    Show,
    /// Used when the output goes from a scene to empty.
    Hide,
    /// Filled on demand from the override policy.
    Override,
}

impl TransitionRole {
    /// All roles in slot order.
    pub const ALL: [Self; 4] = [Self::Match, Self::Show, Self::Hide, Self::Override];

    /// Lowercase role name as used in persisted blobs and requests.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Match => "match",
            Self::Show => "show",
            Self::Hide => "hide",
            Self::Override => "override",
        }
    }

    /// Role named in a remote request; anything other than show/hide means match.
    pub fn from_request(kind: &str) -> Self {
        match kind.trim().to_ascii_lowercase().as_str() {
            "show" => Self::Show,
            "hide" => Self::Hide,
            _ => Self::Match,
        }
    }
}

impl fmt::Display for TransitionRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransitionRole {
    type Err = DskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "match" => Ok(Self::Match),
            "show" => Ok(Self::Show),
            "hide" => Ok(Self::Hide),
            "override" => Ok(Self::Override),
            other => Err(DskError::validation(format!(
                "unknown transition role '{other}'"
            ))),
        }
    }
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
/// Transition duration in milliseconds.
pub struct TransitionDuration(u32);

impl TransitionDuration {
    /// Shortest duration an operator can pick.
    pub const MIN_MS: u32 = 50;
    /// Longest duration an operator can pick.
    pub const MAX_MS: u32 = 20_000;
    /// Duration of freshly created slots.
    pub const DEFAULT_MS: u32 = 300;

    /// Operator-facing constructor; rejects values outside `MIN_MS..=MAX_MS`.
    pub fn new(ms: u32) -> DskResult<Self> {
        if !(Self::MIN_MS..=Self::MAX_MS).contains(&ms) {
            return Err(DskError::validation(format!(
                "transition duration {ms}ms outside {}..={}ms",
                Self::MIN_MS,
                Self::MAX_MS
            )));
        }
        Ok(Self(ms))
    }

    /// Clamp into the operator range, used when loading persisted values.
    pub fn clamped(ms: i64) -> Self {
        Self(ms.clamp(i64::from(Self::MIN_MS), i64::from(Self::MAX_MS)) as u32)
    }

    /// Unchecked duration, used for engine-set override transitions.
    pub fn unbounded(ms: u32) -> Self {
        Self(ms)
    }

    pub fn as_millis(self) -> u32 {
        self.0
    }

    pub fn as_duration(self) -> Duration {
        Duration::from_millis(u64::from(self.0))
    }
}

impl Default for TransitionDuration {
    fn default() -> Self {
        Self(Self::DEFAULT_MS)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
