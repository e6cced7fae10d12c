//! Budget and guard implementations.
//!
//! Operators reserve the bytes of every morsel they emit. Dropping the guard
//! (normally together with the morsel) returns the bytes to the budget.

use std::cmp::Ordering as SizeOrder;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use vecta_core::budget::{BudgetGuard, MemoryBudget};

use crate::error::{Error, Result};
use crate::tracking::{PeakTracker, UsageSnapshot};

struct Counter {
    capacity: usize,
    used: AtomicUsize,
    peak: PeakTracker,
}

impl Counter {
    /// CAS loop; never lets `used` pass `capacity`.
    fn grow(&self, bytes: usize) -> bool {
        let mut cur = self.used.load(Ordering::Relaxed);
        loop {
            let next = cur.saturating_add(bytes);
            if next > self.capacity {
                self.peak.record_refusal(bytes);
                return false;
            }
            match self
                .used
                .compare_exchange_weak(cur, next, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => {
                    self.peak.record_used(next);
                    return true;
                }
                Err(actual) => cur = actual,
            }
        }
    }

    fn shrink(&self, bytes: usize) {
        self.used.fetch_sub(bytes, Ordering::AcqRel);
    }
}

/// Byte budget shared by every operator of one kernel context.
///
/// Cloning shares the same counter.
#[derive(Clone)]
pub struct MemoryBudgetImpl {
    counter: Arc<Counter>,
}

impl MemoryBudgetImpl {
    pub fn new(capacity_bytes: usize) -> Self {
        Self {
            counter: Arc::new(Counter {
                capacity: capacity_bytes,
                used: AtomicUsize::new(0),
                peak: PeakTracker::new(),
            }),
        }
    }

    pub fn used_bytes(&self) -> usize {
        self.counter.used.load(Ordering::Relaxed)
    }

    pub fn capacity_bytes(&self) -> usize {
        self.counter.capacity
    }

    /// High-water mark since creation.
    pub fn peak_bytes(&self) -> usize {
        self.counter.peak.peak()
    }

    pub fn usage(&self) -> UsageSnapshot {
        self.counter.peak.snapshot()
    }

    /// `try_acquire` with the refusal turned into `Error::BudgetExceeded`.
    pub fn reserve(&self, bytes: usize, tag: &'static str) -> Result<BudgetGuardImpl> {
        MemoryBudget::try_acquire(self, bytes, tag).ok_or_else(|| Error::BudgetExceeded {
            tag,
            requested: bytes,
            capacity: self.capacity_bytes(),
            used: self.used_bytes(),
        })
    }

    fn guard(&self, bytes: usize, tag: &'static str) -> BudgetGuardImpl {
        BudgetGuardImpl {
            counter: Arc::clone(&self.counter),
            bytes,
            tag,
        }
    }
}

impl MemoryBudget for MemoryBudgetImpl {
    type Guard = BudgetGuardImpl;

    fn try_acquire(&self, bytes: usize, tag: &'static str) -> Option<BudgetGuardImpl> {
        (bytes == 0 || self.counter.grow(bytes)).then(|| self.guard(bytes, tag))
    }

    fn capacity_bytes(&self) -> usize {
        self.counter.capacity
    }

    fn used_bytes(&self) -> usize {
        MemoryBudgetImpl::used_bytes(self)
    }
}

impl fmt::Debug for MemoryBudgetImpl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryBudgetImpl")
            .field("capacity", &self.capacity_bytes())
            .field("used", &self.used_bytes())
            .finish()
    }
}

/// Bytes held against a `MemoryBudgetImpl`; released on drop.
pub struct BudgetGuardImpl {
    counter: Arc<Counter>,
    bytes: usize,
    tag: &'static str,
}

impl BudgetGuardImpl {
    /// Grow or shrink the reservation in place. Shrinking always succeeds;
    /// growing fails, leaving the guard unchanged, when the cap is hit.
    pub fn try_resize(&mut self, new_bytes: usize) -> bool {
        let ok = match new_bytes.cmp(&self.bytes) {
            SizeOrder::Equal => true,
            SizeOrder::Less => {
                self.counter.shrink(self.bytes - new_bytes);
                true
            }
            SizeOrder::Greater => self.counter.grow(new_bytes - self.bytes),
        };
        if ok {
            self.bytes = new_bytes;
        }
        ok
    }
}

impl BudgetGuard for BudgetGuardImpl {
    fn bytes(&self) -> usize {
        self.bytes
    }

    fn tag(&self) -> &'static str {
        self.tag
    }
}

impl Drop for BudgetGuardImpl {
    fn drop(&mut self) {
        if self.bytes > 0 {
            // No tracing here; this runs once per morsel.
            self.counter.shrink(std::mem::take(&mut self.bytes));
        }
    }
}

impl fmt::Debug for BudgetGuardImpl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BudgetGuardImpl")
            .field("bytes", &self.bytes)
            .field("tag", &self.tag)
            .finish()
    }
}
