use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

/// Per-program counters: `{received, matches, unresolved, failures}`.
#[derive(Default)]
pub struct SourceCounters {
    pub received: AtomicU64,
    pub matches: AtomicU64,
    pub unresolved: AtomicU64,
    pub failures: AtomicU64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct SourceCountersSnapshot {
    pub received: u64,
    pub matches: u64,
    pub unresolved: u64,
    pub failures: u64,
}

impl SourceCounters {
    pub fn record_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }
    pub fn record_match(&self) {
        self.matches.fetch_add(1, Ordering::Relaxed);
    }
    pub fn record_unresolved(&self) {
        self.unresolved.fetch_add(1, Ordering::Relaxed);
    }
    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> SourceCountersSnapshot {
        SourceCountersSnapshot {
            received: self.received.load(Ordering::Relaxed),
            matches: self.matches.load(Ordering::Relaxed),
            unresolved: self.unresolved.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

/// One `SourceCounters` set per configured `ProgramDescriptor` label, keyed
/// by label and emitted at a fixed interval.
pub struct Metrics {
    per_source: RwLock<HashMap<String, SourceCounters>>,
}

impl Metrics {
    pub fn new(labels: impl IntoIterator<Item = String>) -> Self {
        let mut map = HashMap::new();
        for label in labels {
            map.insert(label, SourceCounters::default());
        }
        Metrics {
            per_source: RwLock::new(map),
        }
    }

    fn ensure(&self, label: &str) {
        if !self.per_source.read().expect("metrics lock poisoned").contains_key(label) {
            self.per_source
                .write()
                .expect("metrics lock poisoned")
                .entry(label.to_string())
                .or_default();
        }
    }

    pub fn record_received(&self, label: &str) {
        self.ensure(label);
        self.per_source.read().expect("metrics lock poisoned")[label].record_received();
    }

    pub fn record_match(&self, label: &str) {
        self.ensure(label);
        self.per_source.read().expect("metrics lock poisoned")[label].record_match();
    }

    pub fn record_unresolved(&self, label: &str) {
        self.ensure(label);
        self.per_source.read().expect("metrics lock poisoned")[label].record_unresolved();
    }

    pub fn record_failure(&self, label: &str) {
        self.ensure(label);
        self.per_source.read().expect("metrics lock poisoned")[label].record_failure();
    }

    pub fn snapshot(&self) -> HashMap<String, SourceCountersSnapshot> {
        self.per_source
            .read()
            .expect("metrics lock poisoned")
            .iter()
            .map(|(label, counters)| (label.clone(), counters.snapshot()))
            .collect()
    }

    pub fn log_metrics(&self) {
        for (label, snap) in self.snapshot() {
            log::info!(
                "metrics[{label}] received={} matches={} unresolved={} failures={}",
                snap.received,
                snap.matches,
                snap.unresolved,
                snap.failures
            );
        }
    }
}

/// Per-JSON-RPC-method counters: `{attempt, success, error, rate_limited}`.
/// Kept separate from `Metrics`/`SourceCounters`, which are keyed by
/// program label rather than RPC method name.
#[derive(Default)]
pub struct RpcMethodCounters {
    pub attempt: AtomicU64,
    pub success: AtomicU64,
    pub error: AtomicU64,
    pub rate_limited: AtomicU64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct RpcMethodCountersSnapshot {
    pub attempt: u64,
    pub success: u64,
    pub error: u64,
    pub rate_limited: u64,
}

impl RpcMethodCounters {
    pub fn record_attempt(&self) {
        self.attempt.fetch_add(1, Ordering::Relaxed);
    }
    pub fn record_success(&self) {
        self.success.fetch_add(1, Ordering::Relaxed);
    }
    pub fn record_error(&self) {
        self.error.fetch_add(1, Ordering::Relaxed);
    }
    pub fn record_rate_limited(&self) {
        self.rate_limited.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> RpcMethodCountersSnapshot {
        RpcMethodCountersSnapshot {
            attempt: self.attempt.load(Ordering::Relaxed),
            success: self.success.load(Ordering::Relaxed),
            error: self.error.load(Ordering::Relaxed),
            rate_limited: self.rate_limited.load(Ordering::Relaxed),
        }
    }
}

/// One `RpcMethodCounters` set per JSON-RPC method name (`getTransaction`,
/// `getSlot`, ...), emitted on the same fixed interval as `Metrics`.
pub struct RpcMetrics {
    per_method: RwLock<HashMap<String, RpcMethodCounters>>,
}

impl RpcMetrics {
    pub fn new() -> Self {
        RpcMetrics {
            per_method: RwLock::new(HashMap::new()),
        }
    }

    fn ensure(&self, method: &str) {
        if !self.per_method.read().expect("rpc metrics lock poisoned").contains_key(method) {
            self.per_method
                .write()
                .expect("rpc metrics lock poisoned")
                .entry(method.to_string())
                .or_default();
        }
    }

    pub fn record_attempt(&self, method: &str) {
        self.ensure(method);
        self.per_method.read().expect("rpc metrics lock poisoned")[method].record_attempt();
    }

    pub fn record_success(&self, method: &str) {
        self.ensure(method);
        self.per_method.read().expect("rpc metrics lock poisoned")[method].record_success();
    }

    pub fn record_error(&self, method: &str) {
        self.ensure(method);
        self.per_method.read().expect("rpc metrics lock poisoned")[method].record_error();
    }

    pub fn record_rate_limited(&self, method: &str) {
        self.ensure(method);
        self.per_method.read().expect("rpc metrics lock poisoned")[method].record_rate_limited();
    }

    pub fn snapshot(&self) -> HashMap<String, RpcMethodCountersSnapshot> {
        self.per_method
            .read()
            .expect("rpc metrics lock poisoned")
            .iter()
            .map(|(method, counters)| (method.clone(), counters.snapshot()))
            .collect()
    }
}

impl Default for RpcMetrics {
    fn default() -> Self {
        Self::new()
    }
}
