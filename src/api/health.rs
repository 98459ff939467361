//! Shared health state for the /health endpoint.
//! Updated by the Refresher, read by the API.

use std::sync::atomic::{AtomicU64, Ordering};

/// Refresh counters. Timestamps are nanosecond UTC epoch, 0 = never.
#[derive(Default)]
pub struct HealthState {
    pub refresh_ok: AtomicU64,
    pub refresh_failed: AtomicU64,
    pub last_success_at_ns: AtomicU64,
    pub last_failure_at_ns: AtomicU64,
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self, at_ns: u64) {
        self.refresh_ok.fetch_add(1, Ordering::Relaxed);
        self.last_success_at_ns.store(at_ns, Ordering::Relaxed);
    }

    pub fn record_failure(&self, at_ns: u64) {
        self.refresh_failed.fetch_add(1, Ordering::Relaxed);
        self.last_failure_at_ns.store(at_ns, Ordering::Relaxed);
    }

    pub fn refresh_ok(&self) -> u64 {
        self.refresh_ok.load(Ordering::Relaxed)
    }

    pub fn refresh_failed(&self) -> u64 {
        self.refresh_failed.load(Ordering::Relaxed)
    }

    pub fn last_success_at_ns(&self) -> u64 {
        self.last_success_at_ns.load(Ordering::Relaxed)
    }

    pub fn last_failure_at_ns(&self) -> u64 {
        self.last_failure_at_ns.load(Ordering::Relaxed)
    }

    /// Healthy once a refresh has succeeded and the latest attempt was not a failure.
    pub fn is_healthy(&self) -> bool {
        let ok = self.last_success_at_ns();
        ok > 0 && ok >= self.last_failure_at_ns()
    }
}
