//! Core engine newtypes

use serde::Serialize;

/// Stable identity of an item slot, assigned when the item is created.
///
/// Unlike the item's position, the key survives insertions and removals
/// elsewhere in the sequence, so hosts can address slots by key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ItemKey(u64);

impl ItemKey {
    /// Create a key from a raw value.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw u64 value.
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ItemKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic allocator for [`ItemKey`]s.
#[derive(Debug, Clone, Default)]
pub struct KeyAllocator {
    next: u64,
}

impl KeyAllocator {
    /// Create an allocator starting at key 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out the next unused key.
    pub fn allocate(&mut self) -> ItemKey {
        let key = ItemKey(self.next);
        self.next += 1;
        key
    }
}

/// Two-state item lifecycle.
///
/// `Cloaked` items occupy a fixed-width placeholder with nothing mounted;
/// `Uncloaked` items have their content view mounted by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// Reduced to a placeholder.
    #[default]
    Cloaked,
    /// Content mounted and rendered.
    Uncloaked,
}

impl LifecycleState {
    /// Check if this is the `Uncloaked` state.
    pub fn is_uncloaked(&self) -> bool {
        matches!(self, Self::Uncloaked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocator_hands_out_increasing_keys() {
        let mut keys = KeyAllocator::new();
        let a = keys.allocate();
        let b = keys.allocate();
        assert_eq!(a.get(), 0);
        assert_eq!(b.get(), 1);
        assert!(a < b);
    }

    #[test]
    fn item_key_display_is_prefixed() {
        assert_eq!(ItemKey::new(7).to_string(), "#7");
    }

    #[test]
    fn default_state_is_cloaked() {
        assert_eq!(LifecycleState::default(), LifecycleState::Cloaked);
        assert!(!LifecycleState::Cloaked.is_uncloaked());
        assert!(LifecycleState::Uncloaked.is_uncloaked());
    }

    #[test]
    fn state_serializes_snake_case() {
        let json = serde_json::to_string(&LifecycleState::Uncloaked).unwrap();
        assert_eq!(json, "\"uncloaked\"");
    }
}
