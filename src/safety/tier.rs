//! Safety tiers and cleanup levels.

use serde::{Deserialize, Serialize};

/// Ordered safety classification, low risk to high risk.
///
/// Total order; `Danger` compares greater than everything else. Only
/// `Safe..=Warning` are ever deletable, regardless of `force`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum SafetyTier {
    Safe = 1,
    Caution = 2,
    Warning = 3,
    Danger = 4,
}

impl SafetyTier {
    /// One step toward `Safe`, saturating. Never crosses down from `Danger`
    /// via this method alone — callers that need the "age never rescues a
    /// protected path" rule check for `Danger` before calling this.
    pub fn step_toward_safe(self) -> Self {
        match self {
            SafetyTier::Safe => SafetyTier::Safe,
            SafetyTier::Caution => SafetyTier::Safe,
            SafetyTier::Warning => SafetyTier::Caution,
            SafetyTier::Danger => SafetyTier::Danger,
        }
    }

    /// One step toward `Danger`, saturating.
    pub fn step_toward_danger(self) -> Self {
        match self {
            SafetyTier::Safe => SafetyTier::Caution,
            SafetyTier::Caution => SafetyTier::Warning,
            SafetyTier::Warning => SafetyTier::Danger,
            SafetyTier::Danger => SafetyTier::Danger,
        }
    }
}

impl std::fmt::Display for SafetyTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SafetyTier::Safe => write!(f, "Safe"),
            SafetyTier::Caution => write!(f, "Caution"),
            SafetyTier::Warning => write!(f, "Warning"),
            SafetyTier::Danger => write!(f, "Danger"),
        }
    }
}

/// User-selectable cleanup aggressiveness. Each level names the maximum
/// tier it authorizes; `System` still never authorizes `Danger`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum CleanupLevel {
    Light,
    #[default]
    Normal,
    Deep,
    System,
}

impl CleanupLevel {
    pub fn max_tier(self) -> SafetyTier {
        match self {
            CleanupLevel::Light => SafetyTier::Safe,
            CleanupLevel::Normal => SafetyTier::Caution,
            CleanupLevel::Deep => SafetyTier::Warning,
            CleanupLevel::System => SafetyTier::Warning,
        }
    }

    /// Whether this level authorizes deleting a path classified at `tier`.
    /// `Danger` is never authorized, independent of the match arms above.
    pub fn can_delete(self, tier: SafetyTier) -> bool {
        tier != SafetyTier::Danger && tier <= self.max_tier()
    }
}

impl std::fmt::Display for CleanupLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CleanupLevel::Light => write!(f, "Light"),
            CleanupLevel::Normal => write!(f, "Normal"),
            CleanupLevel::Deep => write!(f, "Deep"),
            CleanupLevel::System => write!(f, "System"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_is_total() {
        assert!(SafetyTier::Safe < SafetyTier::Caution);
        assert!(SafetyTier::Caution < SafetyTier::Warning);
        assert!(SafetyTier::Warning < SafetyTier::Danger);
    }

    #[test]
    fn level_progression() {
        assert!(CleanupLevel::Light.can_delete(SafetyTier::Safe));
        assert!(!CleanupLevel::Light.can_delete(SafetyTier::Caution));

        assert!(CleanupLevel::Normal.can_delete(SafetyTier::Caution));
        assert!(!CleanupLevel::Normal.can_delete(SafetyTier::Warning));

        assert!(CleanupLevel::Deep.can_delete(SafetyTier::Warning));
        assert!(!CleanupLevel::Deep.can_delete(SafetyTier::Danger));
    }

    #[test]
    fn system_level_never_authorizes_danger() {
        assert!(!CleanupLevel::System.can_delete(SafetyTier::Danger));
    }
}
