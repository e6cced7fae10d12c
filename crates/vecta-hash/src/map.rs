//! Fingerprint-keyed map with lazily created values.
//!
//! Entries live in dense, insertion-ordered vectors; the open-addressed
//! index stores `position + 1` so that `0` can mean "empty" without
//! reserving a fingerprint.

use vecta_core::{Error, Result};
use vecta_mem::alloc;

use crate::set::{fib_slot, shift_for, slots_for, MIN_SLOTS};

#[derive(Debug, Clone)]
pub struct FlatHashMap<V> {
    index: Vec<u32>,
    shift: u32,
    keys: Vec<u64>,
    values: Vec<V>,
}

/// Row positions grouped by fingerprint.
pub type RowIndexMap = FlatHashMap<Vec<u32>>;

impl<V> Default for FlatHashMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> FlatHashMap<V> {
    pub fn new() -> Self {
        Self {
            index: vec![0; MIN_SLOTS],
            shift: shift_for(MIN_SLOTS),
            keys: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn with_capacity(items: usize) -> Result<Self> {
        let mut map = Self::new();
        map.reserve(items)?;
        Ok(map)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn reserve(&mut self, additional: usize) -> Result<()> {
        let want = self.keys.len().saturating_add(additional);
        let bytes = additional.saturating_mul(std::mem::size_of::<V>() + 8);
        let oom = |_| Error::OutOfMemory {
            bytes,
            tag: "flat_hash_map",
        };
        self.keys.try_reserve(additional).map_err(oom)?;
        self.values.try_reserve(additional).map_err(oom)?;
        if want.saturating_mul(2) > self.index.len() {
            self.reindex(slots_for(want, "flat_hash_map")?)?;
        }
        Ok(())
    }

    fn find(&self, fingerprint: u64) -> Option<usize> {
        let mask = self.index.len() - 1;
        let mut i = fib_slot(fingerprint, self.shift);
        loop {
            match self.index[i] {
                0 => return None,
                e if self.keys[e as usize - 1] == fingerprint => return Some(e as usize - 1),
                _ => i = (i + 1) & mask,
            }
        }
    }

    /// Value for `fingerprint`, created with `make` on first sight.
    pub fn entry_or_insert_with<F>(&mut self, fingerprint: u64, make: F) -> Result<&mut V>
    where
        F: FnOnce() -> V,
    {
        if let Some(pos) = self.find(fingerprint) {
            return Ok(&mut self.values[pos]);
        }
        if (self.keys.len() + 1) * 2 > self.index.len() {
            self.reserve(self.keys.len().max(1))?;
        }
        let pos = self.keys.len();
        let entry = u32::try_from(pos + 1)
            .map_err(|_| Error::Invariant("flat hash map exceeds u32::MAX entries".into()))?;
        self.keys.push(fingerprint);
        self.values.push(make());
        let mask = self.index.len() - 1;
        let mut i = fib_slot(fingerprint, self.shift);
        while self.index[i] != 0 {
            i = (i + 1) & mask;
        }
        self.index[i] = entry;
        Ok(&mut self.values[pos])
    }

    pub fn get(&self, fingerprint: u64) -> Option<&V> {
        self.find(fingerprint).map(|pos| &self.values[pos])
    }

    pub fn get_mut(&mut self, fingerprint: u64) -> Option<&mut V> {
        self.find(fingerprint).map(move |pos| &mut self.values[pos])
    }

    pub fn contains(&self, fingerprint: u64) -> bool {
        self.find(fingerprint).is_some()
    }

    /// Entries in first-insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, &V)> + '_ {
        self.keys.iter().copied().zip(self.values.iter())
    }

    pub fn keys(&self) -> &[u64] {
        &self.keys
    }

    pub fn values(&self) -> &[V] {
        &self.values
    }

    pub fn into_entries(self) -> Vec<(u64, V)> {
        self.keys.into_iter().zip(self.values).collect()
    }

    fn reindex(&mut self, slots: usize) -> Result<()> {
        #[cfg(feature = "tracing")]
        tracing::trace!(from = self.index.len(), to = slots, entries = self.keys.len(), "flat hash map reindex");
        self.index = alloc::try_alloc_zeroed::<u32>(slots, "flat_hash_map")?;
        self.shift = shift_for(slots);
        let mask = slots - 1;
        for (pos, fp) in self.keys.iter().enumerate() {
            let mut i = fib_slot(*fp, self.shift);
            while self.index[i] != 0 {
                i = (i + 1) & mask;
            }
            // Bounded by the u32 check in `entry_or_insert_with`.
            self.index[i] = pos as u32 + 1;
        }
        Ok(())
    }
}

impl FlatHashMap<Vec<u32>> {
    /// Append `row` to the group for `fingerprint`.
    pub fn push_row(&mut self, fingerprint: u64, row: u32) -> Result<()> {
        self.entry_or_insert_with(fingerprint, Vec::new)?.push(row);
        Ok(())
    }

    /// Group rows `0..fingerprints.len()` by fingerprint.
    pub fn from_fingerprints(fingerprints: &[u64]) -> Result<Self> {
        let mut map = Self::new();
        for (row, fp) in fingerprints.iter().enumerate() {
            let row = u32::try_from(row)
                .map_err(|_| Error::Contract(format!("row {row} does not fit a u32 index")))?;
            map.push_row(*fp, row)?;
        }
        Ok(map)
    }
}
