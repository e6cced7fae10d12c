//! Fallible allocation for kernel output buffers.
//!
//! Every buffer a kernel produces is allocated here so that a failed
//! allocation becomes `Error::AllocFailed` instead of an abort. Zero-length
//! requests succeed with an empty, valid allocation.

use crate::error::{Error, Result};

/// Empty `Vec` with room for `cap` elements.
pub fn try_vec_with_capacity<T>(cap: usize, tag: &'static str) -> Result<Vec<T>> {
    let mut out = Vec::new();
    out.try_reserve_exact(cap).map_err(|_| Error::AllocFailed {
        tag,
        bytes: cap.saturating_mul(std::mem::size_of::<T>()),
    })?;
    Ok(out)
}

/// `len` default-initialized elements (zero for every native type).
pub fn try_alloc_zeroed<T: Copy + Default>(len: usize, tag: &'static str) -> Result<Vec<T>> {
    let mut out = try_vec_with_capacity(len, tag)?;
    out.resize(len, T::default());
    Ok(out)
}

/// Collect an exact-size iterator into a fallibly allocated `Vec`.
pub fn try_collect<T, I>(iter: I, tag: &'static str) -> Result<Vec<T>>
where
    I: ExactSizeIterator<Item = T>,
{
    let mut out = try_vec_with_capacity(iter.len(), tag)?;
    out.extend(iter);
    Ok(out)
}
