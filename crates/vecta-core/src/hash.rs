//! Fingerprint mixing shared by every vector kind.
//!
//! Fingerprints are for bucketing only; nothing here is cryptographically
//! meaningful even though byte spans go through blake3.

/// Multiplier used by the row mixer and by the bloom filter's second position.
pub const MIX_HASH_CONSTANT: u64 = 0x9E37_79B9_7F4A_7C15;

/// Value mixed in for null rows, so nulls group together.
pub const NULL_HASH: u64 = 0x9E37_79B9_7F4A_7C15;

/// Fold `value` into an accumulated row fingerprint.
#[inline]
pub fn mix_hash(current: u64, value: u64) -> u64 {
    let mut mixed = (current ^ value)
        .wrapping_mul(MIX_HASH_CONSTANT)
        .wrapping_add(1);
    mixed ^= mixed >> 32;
    mixed
}

/// 64-bit digest of a byte span (first eight bytes of blake3, little endian).
pub fn hash_bytes(bytes: &[u8]) -> u64 {
    let digest = blake3::hash(bytes);
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest.as_bytes()[..8]);
    u64::from_le_bytes(head)
}

/// Mix a run of per-row values into `dest`, element-wise.
///
/// Portable path; the wide-SIMD path lives next to the vector kernels and
/// must agree with this bit-for-bit.
#[inline]
pub fn mix_hashes_scalar(dest: &mut [u64], values: &[u64]) {
    debug_assert_eq!(dest.len(), values.len());
    for (d, v) in dest.iter_mut().zip(values) {
        *d = mix_hash(*d, *v);
    }
}
