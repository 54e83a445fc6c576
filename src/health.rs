//! Upstream health counters, fed by the orchestrator and served on /health.
//! Updated by the orchestrator after every upstream resolution.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

/// Upstream call counters. Observational only; never consulted when resolving.
#[derive(Default)]
pub struct HealthState {
    upstream_successes: AtomicU64,
    upstream_failures: AtomicU64,
    /// Millisecond timestamp of the last successful upstream call (0 = none).
    last_success_at_ms: AtomicU64,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamSnapshot {
    pub successes: u64,
    pub failures: u64,
    pub last_success_at_ms: Option<u64>,
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self) {
        self.upstream_successes.fetch_add(1, Ordering::Relaxed);
        self.last_success_at_ms.store(now_ms(), Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.upstream_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> UpstreamSnapshot {
        let last = self.last_success_at_ms.load(Ordering::Relaxed);
        UpstreamSnapshot {
            successes: self.upstream_successes.load(Ordering::Relaxed),
            failures: self.upstream_failures.load(Ordering::Relaxed),
            last_success_at_ms: (last != 0).then_some(last),
        }
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
