//! Delivery counters shared between the modem handle and the dispatch task.
//!
//! Queue-side events (overflow drops, direct handoffs) live in
//! [`crate::modem::queue::QueueStats`]; these counters cover what happens to
//! each recipient once a message reaches the send loop.
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct DeliveryMetrics {
    sent: AtomicU64,
    retries: AtomicU64,
    failed: AtomicU64,
    preempted: AtomicU64,
    messages: AtomicU64,
}

impl DeliveryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_sent(&self) {
        self.sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_retries(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts messages abandoned in favour of newer work, not recipients.
    pub fn inc_preempted(&self) {
        self.preempted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_messages(&self) {
        self.messages.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            messages: self.messages.load(Ordering::Relaxed),
            sent: self.sent.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            preempted: self.preempted.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    /// Messages the send loop has finished with, whatever the outcome.
    pub messages: u64,
    /// Recipients delivered.
    pub sent: u64,
    /// Transient per-recipient failures that were left for another attempt.
    pub retries: u64,
    /// Recipients that ran out of attempts.
    pub failed: u64,
    pub preempted: u64,
}
