//! Nested list vectors: i32 offsets delimiting runs of a child vector.

use vecta_core::{Error, Result};
use vecta_mem::{alloc, Bitmap, Buffer, MutableBitmap};

use crate::vector::Vector;

#[derive(Debug, Clone)]
pub struct ArrayVector {
    offsets: Buffer<i32>,
    child: Box<Vector>,
    validity: Option<Bitmap>,
}

impl ArrayVector {
    pub fn try_new(offsets: Buffer<i32>, child: Vector, validity: Option<Bitmap>) -> Result<Self> {
        if offsets.is_empty() {
            return Err(Error::Contract("offsets must have at least one entry".into()));
        }
        let len = offsets.len() - 1;
        if offsets[0] < 0 || offsets.windows(2).any(|w| w[0] > w[1]) {
            return Err(Error::Contract("offsets must be non-negative and non-decreasing".into()));
        }
        if offsets[len] as usize > child.len() {
            return Err(Error::Contract(format!(
                "last offset {} exceeds child length {}",
                offsets[len],
                child.len()
            )));
        }
        if let Some(v) = &validity {
            if v.len() != len {
                return Err(Error::Contract(format!(
                    "validity has {} bits for {} rows",
                    v.len(),
                    len
                )));
            }
        }
        Ok(Self {
            offsets,
            child: Box::new(child),
            validity,
        })
    }

    /// Build from per-row child lengths; `None` rows are null and empty.
    pub fn from_lengths(lengths: &[Option<usize>], child: Vector) -> Result<Self> {
        let mut offsets = alloc::try_vec_with_capacity(lengths.len() + 1, "array_offsets")?;
        let mut validity = MutableBitmap::with_capacity(lengths.len(), "array_validity")?;
        let mut end = 0usize;
        offsets.push(0i32);
        for l in lengths {
            end += l.unwrap_or(0);
            if end > i32::MAX as usize {
                return Err(Error::Contract("array offsets overflow i32".into()));
            }
            offsets.push(end as i32);
            validity.push(l.is_some());
        }
        Self::try_new(Buffer::from_vec(offsets), child, validity.freeze_validity())
    }

    pub fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn offsets(&self) -> &Buffer<i32> {
        &self.offsets
    }

    pub fn child(&self) -> &Vector {
        &self.child
    }

    pub fn validity(&self) -> Option<&Bitmap> {
        self.validity.as_ref()
    }

    #[inline]
    pub fn is_valid(&self, i: usize) -> bool {
        self.validity.as_ref().map_or(true, |v| v.get(i))
    }

    /// Child index range of row `i`, ignoring validity.
    #[inline]
    pub fn value_range(&self, i: usize) -> std::ops::Range<usize> {
        self.offsets[i] as usize..self.offsets[i + 1] as usize
    }

    pub fn null_count(&self) -> usize {
        self.validity.as_ref().map_or(0, |v| v.count_unset())
    }

    pub fn is_borrowed(&self) -> bool {
        self.offsets.is_borrowed() || self.child.is_borrowed()
    }

    pub fn memory_size(&self) -> usize {
        self.offsets.size_bytes()
            + self.child.memory_size()
            + self.validity.as_ref().map_or(0, |v| v.memory_size())
    }
}
