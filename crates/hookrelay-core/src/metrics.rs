//! Process-wide dispatch counters.
//!
//! The dispatcher bumps these without logging; [`Metrics::flush`] reports
//! them all in one `info!` line, which the CLI does before exiting.

use std::sync::atomic::{AtomicU64, Ordering};

/// Shared by every dispatcher in the process.
pub static METRICS: Metrics = Metrics::new();

/// Atomic counters, one per dispatch decision.
pub struct Metrics {
    payloads_received: AtomicU64,
    events_published: AtomicU64,
    events_unhandled: AtomicU64,
    events_suppressed: AtomicU64,
    bus_failures: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of every counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub payloads_received: u64,
    pub events_published: u64,
    pub events_unhandled: u64,
    pub events_suppressed: u64,
    pub bus_failures: u64,
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            payloads_received: AtomicU64::new(0),
            events_published: AtomicU64::new(0),
            events_unhandled: AtomicU64::new(0),
            events_suppressed: AtomicU64::new(0),
            bus_failures: AtomicU64::new(0),
        }
    }

    pub fn inc_received(&self) {
        self.payloads_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_published(&self) {
        self.events_published.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_unhandled(&self) {
        self.events_unhandled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_suppressed(&self) {
        self.events_suppressed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_bus_failures(&self) {
        self.bus_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            payloads_received: self.payloads_received.load(Ordering::Relaxed),
            events_published: self.events_published.load(Ordering::Relaxed),
            events_unhandled: self.events_unhandled.load(Ordering::Relaxed),
            events_suppressed: self.events_suppressed.load(Ordering::Relaxed),
            bus_failures: self.bus_failures.load(Ordering::Relaxed),
        }
    }

    /// Log the current snapshot.
    pub fn flush(&self) {
        let s = self.snapshot();
        tracing::info!(
            metric = "flush",
            payloads_received = s.payloads_received,
            events_published = s.events_published,
            events_unhandled = s.events_unhandled,
            events_suppressed = s.events_suppressed,
            bus_failures = s.bus_failures,
        );
    }

    /// Zero every counter.
    pub fn reset(&self) {
        self.payloads_received.store(0, Ordering::Relaxed);
        self.events_published.store(0, Ordering::Relaxed);
        self.events_unhandled.store(0, Ordering::Relaxed);
        self.events_suppressed.store(0, Ordering::Relaxed);
        self.bus_failures.store(0, Ordering::Relaxed);
    }
}
