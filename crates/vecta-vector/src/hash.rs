//! Per-row fingerprints.
//!
//! `hash_into` mixes each row's logical value into a caller-owned `u64`
//! buffer, so hashing several columns into the same buffer yields a
//! multi-column row fingerprint. A zeroed buffer gives the single-column
//! fingerprint. Equal logical values fingerprint equally regardless of which
//! batch or chunk they arrive in.

use vecta_core::caps::CpuCapabilities;
use vecta_core::hash::{hash_bytes, mix_hash, mix_hashes_scalar, NULL_HASH};
use vecta_core::native::NativeType;
use vecta_core::{Error, Result};
use vecta_mem::alloc;

use crate::primitive::PrimitiveVector;
use crate::vector::{dispatch_primitive, Vector};

/// Mix `values` into `dest` element-wise, using AVX2 lanes when allowed.
///
/// Always bit-identical to `mix_hashes_scalar`.
pub fn mix_hashes(caps: &CpuCapabilities, dest: &mut [u64], values: &[u64]) {
    debug_assert_eq!(dest.len(), values.len());
    #[cfg(target_arch = "x86_64")]
    {
        if caps.avx2 && std::arch::is_x86_feature_detected!("avx2") {
            // SAFETY: AVX2 availability was checked at runtime just above.
            unsafe { avx2::mix_hashes(dest, values) };
            return;
        }
    }
    #[cfg(not(target_arch = "x86_64"))]
    let _ = caps;
    mix_hashes_scalar(dest, values);
}

#[cfg(target_arch = "x86_64")]
mod avx2 {
    use std::arch::x86_64::*;

    use vecta_core::hash::{mix_hashes_scalar, MIX_HASH_CONSTANT};

    /// Low 64 bits of a lane-wise 64x64 multiply (AVX2 has no `mullo_epi64`).
    #[inline]
    #[target_feature(enable = "avx2")]
    unsafe fn mullo_epi64(a: __m256i, b: __m256i) -> __m256i {
        let a_hi = _mm256_srli_epi64(a, 32);
        let b_hi = _mm256_srli_epi64(b, 32);
        let lo = _mm256_mul_epu32(a, b);
        let cross = _mm256_add_epi64(_mm256_mul_epu32(a_hi, b), _mm256_mul_epu32(a, b_hi));
        _mm256_add_epi64(lo, _mm256_slli_epi64(cross, 32))
    }

    #[target_feature(enable = "avx2")]
    pub(super) unsafe fn mix_hashes(dest: &mut [u64], values: &[u64]) {
        let n = dest.len().min(values.len());
        let lanes = n / 4 * 4;
        let k = _mm256_set1_epi64x(MIX_HASH_CONSTANT as i64);
        let one = _mm256_set1_epi64x(1);
        let mut i = 0;
        while i < lanes {
            let d = _mm256_loadu_si256(dest.as_ptr().add(i) as *const __m256i);
            let v = _mm256_loadu_si256(values.as_ptr().add(i) as *const __m256i);
            let m = _mm256_add_epi64(mullo_epi64(_mm256_xor_si256(d, v), k), one);
            let m = _mm256_xor_si256(m, _mm256_srli_epi64(m, 32));
            _mm256_storeu_si256(dest.as_mut_ptr().add(i) as *mut __m256i, m);
            i += 4;
        }
        mix_hashes_scalar(&mut dest[lanes..n], &values[lanes..n]);
    }
}

fn primitive_row_values<T: NativeType>(p: &PrimitiveVector<T>) -> Result<Vec<u64>> {
    let values = p.values();
    Ok(match p.validity() {
        None => alloc::try_collect(values.iter().map(|v| v.fingerprint_bits()), "hash_values")?,
        Some(valid) => alloc::try_collect(
            values.iter().enumerate().map(|(i, v)| {
                if valid.get(i) {
                    v.fingerprint_bits()
                } else {
                    NULL_HASH
                }
            }),
            "hash_values",
        )?,
    })
}

impl Vector {
    /// Portable-path fingerprints; see [`Vector::hash_into_with`].
    pub fn hash_into(&self, out: &mut [u64], offset: usize) -> Result<()> {
        self.hash_into_with(&CpuCapabilities::portable(), out, offset)
    }

    /// Mix one fingerprint per row into `out[offset..offset + len]`.
    ///
    /// Null rows mix `NULL_HASH`, as do passthrough rows without a fixed
    /// width. A buffer shorter than `offset + len` is a
    /// contract error and leaves `out` untouched.
    pub fn hash_into_with(&self, caps: &CpuCapabilities, out: &mut [u64], offset: usize) -> Result<()> {
        let len = self.len();
        let end = offset.checked_add(len).filter(|end| *end <= out.len()).ok_or_else(|| {
            Error::Contract(format!(
                "hash buffer of {} slots cannot hold {len} rows at offset {offset}",
                out.len()
            ))
        })?;
        let dest = &mut out[offset..end];

        let row_values = dispatch_primitive!(self, p => primitive_row_values(p)?, other => match other {
            Vector::Boolean(b) => alloc::try_collect(
                b.iter().map(|v| v.map_or(NULL_HASH, |x| x as u64)),
                "hash_values",
            )?,
            Vector::Utf8(b) | Vector::Binary(b) => alloc::try_collect(
                b.iter().map(|v| v.map_or(NULL_HASH, hash_bytes)),
                "hash_values",
            )?,
            Vector::Array(a) => {
                let child = a.child();
                let mut child_fps = alloc::try_alloc_zeroed::<u64>(child.len(), "hash_child")?;
                child.hash_into_with(caps, &mut child_fps, 0)?;
                for (i, d) in dest.iter_mut().enumerate() {
                    if !a.is_valid(i) {
                        *d = mix_hash(*d, NULL_HASH);
                        continue;
                    }
                    let range = a.value_range(i);
                    let mut cur = mix_hash(*d, range.len() as u64);
                    for fp in &child_fps[range] {
                        cur = mix_hash(cur, *fp);
                    }
                    *d = cur;
                }
                return Ok(());
            }
            Vector::NonNative(o) => alloc::try_collect(
                (0..len).map(|i| match o.value_bytes(i) {
                    Some(bytes) if o.is_valid(i) => hash_bytes(bytes),
                    _ => NULL_HASH,
                }),
                "hash_values",
            )?,
            _ => return Err(Error::not_implemented("hash_into", self.data_type(), "-")),
        });

        mix_hashes(caps, dest, &row_values);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_avx2_path_matches_scalar() {
        let values: Vec<u64> = (0..37u64).map(|i| i.wrapping_mul(0xDEAD_BEEF_1234)).collect();
        let mut a: Vec<u64> = (0..37u64).map(|i| i * 7).collect();
        let mut b = a.clone();
        mix_hashes_scalar(&mut a, &values);
        mix_hashes(&CpuCapabilities::detect(), &mut b, &values);
        assert_eq!(a, b);
    }
}
