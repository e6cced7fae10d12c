//! Usage tracking for a memory budget.
//!
//! Records the high-water mark and how many reservations were granted or
//! refused. All counters are advisory.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

#[derive(Default)]
pub struct PeakTracker {
    peak_bytes: AtomicUsize,
    grants: AtomicU64,
    refusals: AtomicU64,
}

/// Point-in-time copy of the tracker counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsageSnapshot {
    pub peak_bytes: usize,
    pub grants: u64,
    pub refusals: u64,
}

impl PeakTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a granted reservation that brought usage to `used_bytes`.
    pub fn record_used(&self, used_bytes: usize) {
        self.grants.fetch_add(1, Ordering::Relaxed);
        let prev = self.peak_bytes.fetch_max(used_bytes, Ordering::AcqRel);
        #[cfg(feature = "tracing")]
        if used_bytes > prev {
            tracing::trace!(used_bytes, prev_peak = prev, "new memory peak");
        }
        #[cfg(not(feature = "tracing"))]
        let _ = prev;
    }

    /// Record a reservation the budget could not satisfy.
    pub fn record_refusal(&self, requested: usize) {
        self.refusals.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "tracing")]
        tracing::debug!(requested, "memory reservation refused");
        #[cfg(not(feature = "tracing"))]
        let _ = requested;
    }

    pub fn peak(&self) -> usize {
        self.peak_bytes.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> UsageSnapshot {
        UsageSnapshot {
            peak_bytes: self.peak(),
            grants: self.grants.load(Ordering::Relaxed),
            refusals: self.refusals.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peak_only_grows() {
        let t = PeakTracker::new();
        t.record_used(100);
        t.record_used(40);
        t.record_used(250);
        t.record_refusal(1 << 20);
        let snap = t.snapshot();
        assert_eq!(snap.peak_bytes, 250);
        assert_eq!(snap.grants, 3);
        assert_eq!(snap.refusals, 1);
    }
}
