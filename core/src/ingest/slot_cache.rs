use std::sync::RwLock;
use std::time::{Duration, Instant};

const MAX_AGE: Duration = Duration::from_secs(1);

/// Cached current slot, refreshed on demand, never more than 1s stale.
pub struct SlotCache {
    state: RwLock<Option<(u64, Instant)>>,
}

impl SlotCache {
    pub fn new() -> Self {
        SlotCache {
            state: RwLock::new(None),
        }
    }

    /// Returns the cached slot if fresh enough, otherwise None (caller
    /// should refresh via RPC and call `set`).
    pub fn get_fresh(&self) -> Option<u64> {
        let state = self.state.read().expect("slot cache lock poisoned");
        state.and_then(|(slot, at)| {
            if at.elapsed() < MAX_AGE {
                Some(slot)
            } else {
                None
            }
        })
    }

    pub fn set(&self, slot: u64) {
        *self.state.write().expect("slot cache lock poisoned") = Some((slot, Instant::now()));
    }

    /// Staleness gate: drop if `current_slot - message_slot` exceeds the
    /// configured threshold.
    pub fn is_stale(current_slot: u64, message_slot: u64, threshold: u64) -> bool {
        current_slot.saturating_sub(message_slot) > threshold
    }
}

impl Default for SlotCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_value_is_returned() {
        let cache = SlotCache::new();
        cache.set(100);
        assert_eq!(cache.get_fresh(), Some(100));
    }

    #[test]
    fn empty_cache_returns_none() {
        let cache = SlotCache::new();
        assert_eq!(cache.get_fresh(), None);
    }

    #[test]
    fn staleness_gate_drops_lagging_messages() {
        assert!(SlotCache::is_stale(1000, 500, 50));
        assert!(!SlotCache::is_stale(1000, 980, 50));
    }
}
