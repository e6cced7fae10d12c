//! Bit-packed boolean vectors.

use vecta_core::{Error, Result};
use vecta_mem::{Bitmap, MutableBitmap};

use crate::mask::{Mask, MASK_NULL, MASK_TRUE};

#[derive(Debug, Clone)]
pub struct BooleanVector {
    values: Bitmap,
    validity: Option<Bitmap>,
}

impl BooleanVector {
    pub fn try_new(values: Bitmap, validity: Option<Bitmap>) -> Result<Self> {
        if let Some(v) = &validity {
            if v.len() != values.len() {
                return Err(Error::Contract(format!(
                    "validity has {} bits for {} booleans",
                    v.len(),
                    values.len()
                )));
            }
        }
        Ok(Self { values, validity })
    }

    pub fn from_bools(values: &[bool]) -> Result<Self> {
        Self::try_new(Bitmap::from_bools(values)?, None)
    }

    pub fn from_options(values: &[Option<bool>]) -> Result<Self> {
        let mut data = MutableBitmap::with_capacity(values.len(), "boolean")?;
        let mut validity = MutableBitmap::with_capacity(values.len(), "boolean_validity")?;
        for v in values {
            data.push(v.unwrap_or(false));
            validity.push(v.is_some());
        }
        Self::try_new(data.freeze(), validity.freeze_validity())
    }

    /// Boolean column from a selection mask; the null sentinel becomes a null row.
    pub fn from_mask(mask: &Mask) -> Result<Self> {
        let bytes = mask.as_bytes();
        let mut data = MutableBitmap::with_capacity(bytes.len(), "boolean")?;
        let mut validity = MutableBitmap::with_capacity(bytes.len(), "boolean_validity")?;
        for &b in bytes {
            data.push(b == MASK_TRUE);
            validity.push(b != MASK_NULL);
        }
        Self::try_new(data.freeze(), validity.freeze_validity())
    }

    /// Inverse of `from_mask`.
    pub fn to_mask(&self) -> Result<Mask> {
        let opts: Vec<Option<bool>> = self.iter().collect();
        Mask::from_options(&opts)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &Bitmap {
        &self.values
    }

    pub fn validity(&self) -> Option<&Bitmap> {
        self.validity.as_ref()
    }

    #[inline]
    pub fn is_valid(&self, i: usize) -> bool {
        self.validity.as_ref().map_or(true, |v| v.get(i))
    }

    #[inline]
    pub fn value(&self, i: usize) -> bool {
        self.values.get(i)
    }

    pub fn get(&self, i: usize) -> Option<bool> {
        if self.is_valid(i) {
            Some(self.values.get(i))
        } else {
            None
        }
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = Option<bool>> + '_ {
        (0..self.len()).map(move |i| self.get(i))
    }

    pub fn null_count(&self) -> usize {
        self.validity.as_ref().map_or(0, |v| v.count_unset())
    }

    pub fn is_borrowed(&self) -> bool {
        self.values.bytes().is_borrowed()
    }

    pub fn memory_size(&self) -> usize {
        self.values.memory_size() + self.validity.as_ref().map_or(0, |v| v.memory_size())
    }
}
