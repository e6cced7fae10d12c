//! Open-addressed set of 64-bit fingerprints.
//!
//! Members are fingerprints, not source values: two distinct values that
//! fingerprint equally are one member. Callers that cannot accept that go
//! through [`FingerprintSet`] and substitute a verifying implementation.

use vecta_core::hash::MIX_HASH_CONSTANT;
use vecta_core::{Error, Result};
use vecta_mem::alloc;

/// Smallest slot array ever allocated.
pub(crate) const MIN_SLOTS: usize = 16;

/// Slot index for `fingerprint` in a table of `64 - shift` index bits.
#[inline]
pub(crate) fn fib_slot(fingerprint: u64, shift: u32) -> usize {
    (fingerprint.wrapping_mul(MIX_HASH_CONSTANT) >> shift) as usize
}

/// Slot count that holds `items` at a load factor of at most one half.
pub(crate) fn slots_for(items: usize, tag: &'static str) -> Result<usize> {
    items
        .checked_mul(2)
        .and_then(usize::checked_next_power_of_two)
        .map(|n| n.max(MIN_SLOTS))
        .ok_or(Error::OutOfMemory {
            bytes: usize::MAX,
            tag,
        })
}

#[inline]
pub(crate) fn shift_for(slots: usize) -> u32 {
    64 - slots.trailing_zeros()
}

/// Membership interface over fingerprints.
///
/// Aggregates program against this so the collision policy of the
/// container can change without touching them.
pub trait FingerprintSet: Send {
    /// `true` when the fingerprint was not already present.
    fn insert(&mut self, fingerprint: u64) -> Result<bool>;

    /// Insert a contiguous run; returns how many were new.
    fn insert_many(&mut self, fingerprints: &[u64]) -> Result<usize> {
        let mut added = 0;
        for &fp in fingerprints {
            added += usize::from(self.insert(fp)?);
        }
        Ok(added)
    }

    fn contains(&self, fingerprint: u64) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Linear-probing set with a power-of-two slot array.
///
/// Slot value `0` marks an empty slot, so the fingerprint `0` itself is
/// tracked by `has_zero`. The table doubles before the load factor would
/// exceed one half.
#[derive(Debug, Clone)]
pub struct FlatHashSet {
    slots: Vec<u64>,
    shift: u32,
    occupied: usize,
    has_zero: bool,
}

impl Default for FlatHashSet {
    fn default() -> Self {
        Self::new()
    }
}

impl FlatHashSet {
    pub fn new() -> Self {
        Self {
            slots: vec![0; MIN_SLOTS],
            shift: shift_for(MIN_SLOTS),
            occupied: 0,
            has_zero: false,
        }
    }

    /// Room for `items` fingerprints before the first growth.
    pub fn with_capacity(items: usize) -> Result<Self> {
        let slots = slots_for(items, "flat_hash_set")?;
        Ok(Self {
            slots: alloc::try_alloc_zeroed(slots, "flat_hash_set")?,
            shift: shift_for(slots),
            occupied: 0,
            has_zero: false,
        })
    }

    pub fn len(&self) -> usize {
        self.occupied + usize::from(self.has_zero)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of slots in the table (twice the items it holds before growing).
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Pre-size so `additional` more fingerprints fit without rehashing.
    pub fn reserve(&mut self, additional: usize) -> Result<()> {
        let want = self.occupied.saturating_add(additional);
        if want.saturating_mul(2) > self.slots.len() {
            self.rehash(slots_for(want, "flat_hash_set")?)?;
        }
        Ok(())
    }

    pub fn insert(&mut self, fingerprint: u64) -> Result<bool> {
        if fingerprint == 0 {
            let added = !self.has_zero;
            self.has_zero = true;
            return Ok(added);
        }
        if (self.occupied + 1) * 2 > self.slots.len() {
            let doubled = self.slots.len().checked_mul(2).ok_or(Error::OutOfMemory {
                bytes: usize::MAX,
                tag: "flat_hash_set",
            })?;
            self.rehash(doubled)?;
        }
        Ok(self.place(fingerprint))
    }

    /// Bulk insert; returns the count of fingerprints that were new.
    pub fn insert_many(&mut self, fingerprints: &[u64]) -> Result<usize> {
        let mut added = 0;
        for &fp in fingerprints {
            added += usize::from(self.insert(fp)?);
        }
        Ok(added)
    }

    pub fn contains(&self, fingerprint: u64) -> bool {
        if fingerprint == 0 {
            return self.has_zero;
        }
        let mask = self.slots.len() - 1;
        let mut i = fib_slot(fingerprint, self.shift);
        loop {
            match self.slots[i] {
                0 => return false,
                s if s == fingerprint => return true,
                _ => i = (i + 1) & mask,
            }
        }
    }

    /// Drop every member but keep the slot array.
    pub fn clear(&mut self) {
        self.slots.fill(0);
        self.occupied = 0;
        self.has_zero = false;
    }

    /// Union `other` into `self`; returns how many members were new.
    ///
    /// This is the merge step for workers that each built a private set.
    pub fn merge(&mut self, other: &FlatHashSet) -> Result<usize> {
        self.reserve(other.occupied)?;
        let mut added = 0;
        for fp in other.iter() {
            added += usize::from(self.insert(fp)?);
        }
        Ok(added)
    }

    /// Members in slot order (the zero fingerprint first when present).
    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.has_zero
            .then_some(0)
            .into_iter()
            .chain(self.slots.iter().copied().filter(|s| *s != 0))
    }

    pub fn memory_size(&self) -> usize {
        self.slots.len() * std::mem::size_of::<u64>()
    }

    /// Insert a non-zero fingerprint into a table with a free slot.
    fn place(&mut self, fingerprint: u64) -> bool {
        let mask = self.slots.len() - 1;
        let mut i = fib_slot(fingerprint, self.shift);
        loop {
            match self.slots[i] {
                0 => {
                    self.slots[i] = fingerprint;
                    self.occupied += 1;
                    return true;
                }
                s if s == fingerprint => return false,
                _ => i = (i + 1) & mask,
            }
        }
    }

    fn rehash(&mut self, slots: usize) -> Result<()> {
        let fresh = alloc::try_alloc_zeroed::<u64>(slots, "flat_hash_set")?;
        let old = std::mem::replace(&mut self.slots, fresh);
        #[cfg(feature = "tracing")]
        tracing::trace!(from = old.len(), to = slots, members = self.len(), "flat hash set rehash");
        self.shift = shift_for(slots);
        self.occupied = 0;
        for fp in old.into_iter().filter(|fp| *fp != 0) {
            self.place(fp);
        }
        Ok(())
    }
}

impl FingerprintSet for FlatHashSet {
    fn insert(&mut self, fingerprint: u64) -> Result<bool> {
        FlatHashSet::insert(self, fingerprint)
    }

    fn insert_many(&mut self, fingerprints: &[u64]) -> Result<usize> {
        FlatHashSet::insert_many(self, fingerprints)
    }

    fn contains(&self, fingerprint: u64) -> bool {
        FlatHashSet::contains(self, fingerprint)
    }

    fn len(&self) -> usize {
        FlatHashSet::len(self)
    }
}
