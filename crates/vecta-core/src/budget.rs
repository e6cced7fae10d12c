//! Memory budget interfaces.
//!
//! `vecta-mem` provides the implementation. Kernels that only need to charge
//! output morsels depend on these traits.

/// Bytes held against a budget. Dropping the guard returns them.
///
/// Implementations must be `Send` and release on every exit path, including
/// unwinding.
pub trait BudgetGuard: Send {
    fn bytes(&self) -> usize;

    /// Label used in out-of-memory errors and trace events.
    fn tag(&self) -> &'static str {
        "guard"
    }
}

/// A capped byte counter shared by every operator of a query.
///
/// A refused reservation is final for that morsel: the kernel surfaces it as
/// `Error::OutOfMemory` and never retries on its own.
pub trait MemoryBudget: Send + Sync + 'static {
    type Guard: BudgetGuard;

    /// Reserve `bytes`, or `None` when the cap would be exceeded.
    fn try_acquire(&self, bytes: usize, tag: &'static str) -> Option<Self::Guard>;

    fn capacity_bytes(&self) -> usize;

    /// Advisory; may be stale by the time the caller reads it.
    fn used_bytes(&self) -> usize;

    fn available_bytes(&self) -> usize {
        self.capacity_bytes().saturating_sub(self.used_bytes())
    }
}
