//! Running count-distinct.
//!
//! Rows are reduced to 64-bit fingerprints with `Vector::hash_into_with`
//! and inserted into a fingerprint set that survives across chunks. The
//! count is the set size, so two distinct values with equal fingerprints
//! count once. [`VerifiedDistinct`] keeps the values behind each
//! fingerprint when that is not acceptable.

use vecta_core::caps::CpuCapabilities;
use vecta_core::scalar::Scalar;
use vecta_core::Result;
use vecta_hash::{FlatHashMap, FlatHashSet};
use vecta_mem::alloc;
use vecta_vector::Vector;

#[cfg(feature = "tracing")]
use tracing::debug;

use super::Accumulator;

/// Count-distinct state fed one chunk at a time.
pub trait DistinctAccumulator: Send {
    fn update(&mut self, values: &Vector) -> Result<()>;

    /// Distinct non-null values seen so far.
    fn count(&self) -> usize;
}

/// Grow `scratch` to at least `len` slots and zero the prefix in use.
fn prepare_scratch(scratch: &mut Vec<u64>, len: usize) -> Result<&mut [u64]> {
    if scratch.len() < len {
        *scratch = alloc::try_alloc_zeroed::<u64>(len, "distinct_scratch")?;
    } else {
        scratch[..len].fill(0);
    }
    Ok(&mut scratch[..len])
}

/// Count distinct non-null values across `chunks`.
///
/// Pass the set returned by a previous call to continue a running count;
/// feeding the same chunks again leaves the count unchanged.
pub fn count_distinct(
    chunks: &[Vector],
    set: Option<FlatHashSet>,
    caps: &CpuCapabilities,
) -> Result<(usize, FlatHashSet)> {
    let largest = chunks.iter().map(Vector::len).max().unwrap_or(0);
    let set = match set {
        Some(s) => s,
        None => FlatHashSet::with_capacity(largest)?,
    };
    let mut acc = FingerprintDistinct::with_set(set, *caps);
    for chunk in chunks {
        DistinctAccumulator::update(&mut acc, chunk)?;
    }
    Ok((acc.count(), acc.into_set()))
}

/// Fingerprint-only distinct counting over a [`FlatHashSet`].
#[derive(Debug, Clone, Default)]
pub struct FingerprintDistinct {
    set: FlatHashSet,
    scratch: Vec<u64>,
    caps: CpuCapabilities,
}

impl FingerprintDistinct {
    pub fn new(caps: CpuCapabilities) -> Self {
        Self::with_set(FlatHashSet::new(), caps)
    }

    pub fn with_set(set: FlatHashSet, caps: CpuCapabilities) -> Self {
        Self {
            set,
            scratch: Vec::new(),
            caps,
        }
    }

    pub fn set(&self) -> &FlatHashSet {
        &self.set
    }

    pub fn into_set(self) -> FlatHashSet {
        self.set
    }

    pub fn memory_size(&self) -> usize {
        self.set.memory_size() + self.scratch.capacity() * std::mem::size_of::<u64>()
    }
}

impl DistinctAccumulator for FingerprintDistinct {
    fn update(&mut self, values: &Vector) -> Result<()> {
        let len = values.len();
        if len == 0 {
            return Ok(());
        }
        let fingerprints = prepare_scratch(&mut self.scratch, len)?;
        values.hash_into_with(&self.caps, fingerprints, 0)?;
        #[cfg(feature = "tracing")]
        let before = self.set.len();
        match values.validity() {
            None => {
                self.set.insert_many(fingerprints)?;
            }
            Some(_) => {
                for (i, fp) in fingerprints.iter().enumerate() {
                    if values.is_valid(i) {
                        self.set.insert(*fp)?;
                    }
                }
            }
        }
        #[cfg(feature = "tracing")]
        debug!(rows = len, new = self.set.len() - before, total = self.set.len(), "distinct chunk");
        Ok(())
    }

    fn count(&self) -> usize {
        self.set.len()
    }
}

impl Accumulator for FingerprintDistinct {
    fn update(&mut self, values: &Vector) -> Result<()> {
        DistinctAccumulator::update(self, values)
    }

    fn finish(&self) -> Result<Scalar> {
        Ok(Scalar::Int64(self.count() as i64))
    }
}

/// Distinct counting that compares values behind equal fingerprints.
///
/// Each fingerprint maps to the distinct values seen under it, so a
/// collision costs a comparison instead of a lost value. Values are held
/// as scalars, which makes this several times heavier than
/// [`FingerprintDistinct`].
#[derive(Debug, Default)]
pub struct VerifiedDistinct {
    buckets: FlatHashMap<Vec<Scalar>>,
    count: usize,
    collisions: usize,
    scratch: Vec<u64>,
    caps: CpuCapabilities,
}

impl VerifiedDistinct {
    pub fn new(caps: CpuCapabilities) -> Self {
        Self {
            caps,
            ..Self::default()
        }
    }

    /// Values that shared a fingerprint with a different value.
    pub fn collisions(&self) -> usize {
        self.collisions
    }
}

fn same_value(a: &Scalar, b: &Scalar) -> bool {
    match (a, b) {
        (Scalar::Float32(x), Scalar::Float32(y)) => x == y || (x.is_nan() && y.is_nan()),
        (Scalar::Float64(x), Scalar::Float64(y)) => x == y || (x.is_nan() && y.is_nan()),
        _ => a == b,
    }
}

impl DistinctAccumulator for VerifiedDistinct {
    fn update(&mut self, values: &Vector) -> Result<()> {
        let len = values.len();
        if len == 0 {
            return Ok(());
        }
        let fingerprints = prepare_scratch(&mut self.scratch, len)?;
        values.hash_into_with(&self.caps, fingerprints, 0)?;
        for (i, fp) in fingerprints.iter().enumerate() {
            if !values.is_valid(i) {
                continue;
            }
            let value = values.get_scalar(i)?;
            let bucket = self.buckets.entry_or_insert_with(*fp, Vec::new)?;
            if bucket.iter().any(|seen| same_value(seen, &value)) {
                continue;
            }
            if !bucket.is_empty() {
                self.collisions += 1;
            }
            bucket.push(value);
            self.count += 1;
        }
        Ok(())
    }

    fn count(&self) -> usize {
        self.count
    }
}

impl Accumulator for VerifiedDistinct {
    fn update(&mut self, values: &Vector) -> Result<()> {
        DistinctAccumulator::update(self, values)
    }

    fn finish(&self) -> Result<Scalar> {
        Ok(Scalar::Int64(self.count as i64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nulls_are_not_counted() {
        let v = Vector::from_scalars(
            vecta_core::types::DataType::Int64,
            &[Scalar::Int64(1), Scalar::Null, Scalar::Int64(1), Scalar::Null],
        )
        .unwrap();
        let (count, _) = count_distinct(&[v], None, &CpuCapabilities::portable()).unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_running_set_continues_across_calls() {
        let caps = CpuCapabilities::portable();
        let (first, set) = count_distinct(&[Vector::int64(vec![1, 2]).unwrap()], None, &caps).unwrap();
        assert_eq!(first, 2);
        let (second, _) =
            count_distinct(&[Vector::int64(vec![2, 3]).unwrap()], Some(set), &caps).unwrap();
        assert_eq!(second, 3);
    }

    #[test]
    fn test_scratch_reused_for_smaller_chunks() {
        let mut acc = FingerprintDistinct::new(CpuCapabilities::portable());
        DistinctAccumulator::update(&mut acc, &Vector::int64((0..100).collect()).unwrap()).unwrap();
        DistinctAccumulator::update(&mut acc, &Vector::int64(vec![5, 500]).unwrap()).unwrap();
        assert_eq!(acc.count(), 101);
    }

    #[test]
    fn test_verified_agrees_with_fingerprint_count() {
        let caps = CpuCapabilities::portable();
        let chunks = [
            Vector::utf8(&[Some("a"), Some("b"), None]).unwrap(),
            Vector::utf8(&[Some("b"), Some("c")]).unwrap(),
        ];
        let mut verified = VerifiedDistinct::new(caps);
        for c in &chunks {
            DistinctAccumulator::update(&mut verified, c).unwrap();
        }
        let (fast, _) = count_distinct(&chunks, None, &caps).unwrap();
        assert_eq!(verified.count(), 3);
        assert_eq!(fast, 3);
        assert_eq!(verified.collisions(), 0);
    }

    #[test]
    fn test_nan_counts_once() {
        let mut acc = VerifiedDistinct::new(CpuCapabilities::portable());
        let v = Vector::float64(vec![f64::NAN, f64::NAN, 1.0]).unwrap();
        DistinctAccumulator::update(&mut acc, &v).unwrap();
        assert_eq!(acc.count(), 2);
    }
}
