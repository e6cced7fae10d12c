//! Typed, immutable buffers with ownership encoded in the type.
//!
//! A buffer is either *owned* (allocated by the kernel, freed when the last
//! handle drops) or *borrowed* (memory exposed zero-copy by an external
//! producer). A borrowed buffer holds an `Arc` to its foreign owner; dropping
//! the last handle to that owner runs the producer's release callback. Vecta
//! never frees borrowed memory itself.
//!
//! Buffers are never mutated after construction. Clones share the memory.

use std::fmt;
use std::ops::Deref;
use std::ptr::NonNull;
use std::sync::Arc;

use vecta_core::native::NativeType;

use crate::alloc;
use crate::error::Result;

/// Anything whose `Drop` gives foreign memory back to its producer.
pub trait ForeignOwner: Send + Sync + 'static {}

/// Whether a buffer's memory belongs to the kernel or to an external producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    Owned,
    Borrowed,
}

pub struct Buffer<T: NativeType> {
    repr: Repr<T>,
}

enum Repr<T: NativeType> {
    Owned(Arc<Vec<T>>),
    Borrowed(ForeignSlice<T>),
}

/// A read-only view into memory kept alive by a foreign owner.
struct ForeignSlice<T> {
    ptr: NonNull<T>,
    len: usize,
    _owner: Arc<dyn ForeignOwner>,
}

// SAFETY: the memory behind `ptr` is immutable for the owner's lifetime and
// the owner itself is `Send + Sync`.
unsafe impl<T: Send + Sync> Send for ForeignSlice<T> {}
unsafe impl<T: Send + Sync> Sync for ForeignSlice<T> {}

impl<T: NativeType> Buffer<T> {
    pub fn from_vec(values: Vec<T>) -> Self {
        Self {
            repr: Repr::Owned(Arc::new(values)),
        }
    }

    /// Owned buffer of `len` zeroed elements. Zero length is valid.
    pub fn try_zeroed(len: usize) -> Result<Self> {
        Ok(Self::from_vec(alloc::try_alloc_zeroed(len, "buffer")?))
    }

    pub fn empty() -> Self {
        Self::from_vec(Vec::new())
    }

    /// Wrap foreign memory without copying.
    ///
    /// # Safety
    /// `ptr` must be aligned for `T` and valid for reads of `len` elements for
    /// as long as `owner` is alive, and nobody may write through it meanwhile.
    pub unsafe fn from_foreign(ptr: NonNull<T>, len: usize, owner: Arc<dyn ForeignOwner>) -> Self {
        Self {
            repr: Repr::Borrowed(ForeignSlice {
                ptr,
                len,
                _owner: owner,
            }),
        }
    }

    pub fn as_slice(&self) -> &[T] {
        match &self.repr {
            Repr::Owned(v) => v.as_slice(),
            // SAFETY: upheld by the `from_foreign` contract.
            Repr::Borrowed(f) => unsafe { std::slice::from_raw_parts(f.ptr.as_ptr(), f.len) },
        }
    }

    pub fn len(&self) -> usize {
        match &self.repr {
            Repr::Owned(v) => v.len(),
            Repr::Borrowed(f) => f.len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ownership(&self) -> Ownership {
        match &self.repr {
            Repr::Owned(_) => Ownership::Owned,
            Repr::Borrowed(_) => Ownership::Borrowed,
        }
    }

    pub fn is_borrowed(&self) -> bool {
        self.ownership() == Ownership::Borrowed
    }

    /// Bytes of payload addressed by this buffer.
    pub fn size_bytes(&self) -> usize {
        self.len() * std::mem::size_of::<T>()
    }

    pub fn as_ptr(&self) -> *const T {
        self.as_slice().as_ptr()
    }
}

impl<T: NativeType> Clone for Buffer<T> {
    fn clone(&self) -> Self {
        let repr = match &self.repr {
            Repr::Owned(v) => Repr::Owned(Arc::clone(v)),
            Repr::Borrowed(f) => Repr::Borrowed(ForeignSlice {
                ptr: f.ptr,
                len: f.len,
                _owner: Arc::clone(&f._owner),
            }),
        };
        Self { repr }
    }
}

impl<T: NativeType> Deref for Buffer<T> {
    type Target = [T];
    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T: NativeType> From<Vec<T>> for Buffer<T> {
    fn from(values: Vec<T>) -> Self {
        Self::from_vec(values)
    }
}

impl<T: NativeType> fmt::Debug for Buffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("ownership", &self.ownership())
            .field("len", &self.len())
            .finish()
    }
}

impl<T: NativeType> PartialEq for Buffer<T> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}
