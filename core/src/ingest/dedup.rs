use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

const TTL: Duration = Duration::from_secs(60);
const SWEEP_INTERVAL: Duration = Duration::from_secs(10);

/// Every processed signature appears at most once in the executor path
/// for the lifetime of its dedup entry (>= 60s). A mapping from signature
/// to insertion timestamp; a periodic sweep (every 10s) deletes entries
/// older than the TTL.
pub struct DedupCache {
    entries: Mutex<HashMap<String, Instant>>,
}

impl DedupCache {
    pub fn new() -> Self {
        DedupCache {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns true (insert-and-process) on first observation; false
    /// (drop) if already present within the TTL window.
    pub fn observe(&self, signature: &str) -> bool {
        let mut entries = self.entries.lock().expect("dedup mutex poisoned");
        if entries.contains_key(signature) {
            false
        } else {
            entries.insert(signature.to_string(), Instant::now());
            true
        }
    }

    pub fn sweep(&self) {
        let mut entries = self.entries.lock().expect("dedup mutex poisoned");
        let now = Instant::now();
        entries.retain(|_, inserted| now.duration_since(*inserted) < TTL);
    }

    pub fn sweep_interval() -> Duration {
        SWEEP_INTERVAL
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.lock().expect("dedup mutex poisoned").len()
    }
}

impl Default for DedupCache {
    fn default() -> Self {
        Self::new()
    }
}
