//! Two-position bloom filter over integer keys.
//!
//! The caller picks the bit-array size up front; [`optimal_num_bits`] is
//! the usual sizing formula for that choice. The filter never reports its
//! own false-positive rate and has no removal.

use vecta_core::config::KernelConfig;
use vecta_core::hash::MIX_HASH_CONSTANT;
use vecta_core::{Error, Result};
use vecta_mem::alloc;
use vecta_vector::mask::{Mask, MASK_FALSE, MASK_TRUE};

#[derive(Debug, Clone)]
pub struct BloomFilter {
    words: Vec<u64>,
    num_bits: usize,
}

/// Bits needed for `expected_items` at false-positive rate `fp_rate`.
///
/// `m = -(n * ln p) / (ln 2)^2 + 1`.
pub fn optimal_num_bits(expected_items: usize, fp_rate: f64) -> Result<usize> {
    if !(fp_rate > 0.0 && fp_rate < 1.0) {
        return Err(Error::Config(format!(
            "bloom false-positive rate must be in (0, 1), got {fp_rate}"
        )));
    }
    let ln2 = std::f64::consts::LN_2;
    let bits = -(expected_items as f64 * fp_rate.ln()) / (ln2 * ln2) + 1.0;
    Ok(bits as usize)
}

impl BloomFilter {
    pub fn new(num_bits: usize) -> Result<Self> {
        if num_bits == 0 {
            return Err(Error::Config("bloom filter needs at least one bit".into()));
        }
        let words = alloc::try_alloc_zeroed::<u64>(num_bits.div_ceil(64), "bloom_filter")?;
        Ok(Self { words, num_bits })
    }

    pub fn with_expected_items(expected_items: usize, fp_rate: f64) -> Result<Self> {
        Self::new(optimal_num_bits(expected_items, fp_rate)?)
    }

    /// Filter sized by `bloom_default_bits`.
    pub fn from_config(cfg: &KernelConfig) -> Result<Self> {
        Self::new(cfg.bloom_default_bits)
    }

    pub fn num_bits(&self) -> usize {
        self.num_bits
    }

    /// Direct modulo, then a golden-ratio scaled position.
    #[inline]
    fn positions(&self, key: u64) -> (usize, usize) {
        let m = self.num_bits as u64;
        let h1 = key % m;
        let h2 = (key.wrapping_mul(MIX_HASH_CONSTANT) >> 32) % m;
        (h1 as usize, h2 as usize)
    }

    #[inline]
    fn bit(&self, pos: usize) -> bool {
        self.words[pos / 64] & (1 << (pos % 64)) != 0
    }

    pub fn add(&mut self, key: u64) {
        let (a, b) = self.positions(key);
        self.words[a / 64] |= 1 << (a % 64);
        self.words[b / 64] |= 1 << (b % 64);
    }

    pub fn add_many(&mut self, keys: &[u64]) {
        for &key in keys {
            self.add(key);
        }
    }

    /// `false` means definitely absent.
    pub fn possibly_contains(&self, key: u64) -> bool {
        let (a, b) = self.positions(key);
        self.bit(a) && self.bit(b)
    }

    /// Probe every key; the mask never carries the null sentinel.
    pub fn possibly_contains_many(&self, keys: &[u64]) -> Result<Mask> {
        let bytes = alloc::try_collect(
            keys.iter().map(|k| {
                if self.possibly_contains(*k) {
                    MASK_TRUE
                } else {
                    MASK_FALSE
                }
            }),
            "bloom_probe",
        )?;
        Ok(Mask::from_bytes(bytes))
    }

    /// Number of set bits, for diagnostics.
    pub fn count_set_bits(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn memory_size(&self) -> usize {
        self.words.len() * std::mem::size_of::<u64>()
    }
}
