//! Subscription metrics for observability

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for a single subscription
#[derive(Debug, Default)]
pub struct SubscriptionMetrics {
    /// Elements delivered downstream
    emitted_count: AtomicU64,
    /// Terminal failures
    failure_count: AtomicU64,
    /// Cancellations
    cancel_count: AtomicU64,
    /// Normal completions
    completion_count: AtomicU64,
}

impl SubscriptionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emitted_count(&self) -> u64 {
        self.emitted_count.load(Ordering::Relaxed)
    }

    pub fn inc_emitted_count(&self) {
        self.emitted_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    pub fn inc_failure_count(&self) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn cancel_count(&self) -> u64 {
        self.cancel_count.load(Ordering::Relaxed)
    }

    pub fn inc_cancel_count(&self) {
        self.cancel_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn completion_count(&self) -> u64 {
        self.completion_count.load(Ordering::Relaxed)
    }

    pub fn inc_completion_count(&self) {
        self.completion_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            emitted_count: self.emitted_count(),
            failure_count: self.failure_count(),
            cancel_count: self.cancel_count(),
            completion_count: self.completion_count(),
        }
    }
}

/// Snapshot of subscription metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub emitted_count: u64,
    pub failure_count: u64,
    pub cancel_count: u64,
    pub completion_count: u64,
}
