//! Bit-packed validity and boolean storage.
//!
//! LSB-first within each byte, matching the columnar interchange layout. For
//! validity bitmaps a set bit means the row is valid. A bitmap may start at a
//! non-zero bit offset into its bytes (zero-copy slices, foreign imports).

use std::fmt;

use crate::alloc;
use crate::buffer::Buffer;
use crate::error::Result;

#[inline]
fn get_bit_raw(bytes: &[u8], i: usize) -> bool {
    bytes[i >> 3] & (1u8 << (i & 7)) != 0
}

#[inline]
pub fn bytes_for(bits: usize) -> usize {
    bits.div_ceil(8)
}

#[derive(Clone)]
pub struct Bitmap {
    bytes: Buffer<u8>,
    offset: usize,
    len: usize,
}

impl Bitmap {
    /// Wrap existing bytes. `None` if they are too short for `offset + len` bits.
    pub fn try_new(bytes: Buffer<u8>, offset: usize, len: usize) -> Option<Self> {
        let needed = bytes_for(offset.checked_add(len)?);
        if bytes.len() < needed {
            return None;
        }
        Some(Self { bytes, offset, len })
    }

    /// `len` bits all set to `value`.
    pub fn filled(len: usize, value: bool) -> Result<Self> {
        let mut b = MutableBitmap::with_capacity(len, "bitmap")?;
        b.extend_constant(len, value);
        Ok(b.freeze())
    }

    pub fn from_bools(values: &[bool]) -> Result<Self> {
        let mut b = MutableBitmap::with_capacity(values.len(), "bitmap")?;
        for &v in values {
            b.push(v);
        }
        Ok(b.freeze())
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bit offset of the first logical bit into `bytes()`.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn bytes(&self) -> &Buffer<u8> {
        &self.bytes
    }

    #[inline]
    pub fn get(&self, i: usize) -> bool {
        assert!(i < self.len, "bit {i} out of range for bitmap of {}", self.len);
        get_bit_raw(&self.bytes, self.offset + i)
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = bool> + '_ {
        (0..self.len).map(move |i| get_bit_raw(&self.bytes, self.offset + i))
    }

    pub fn count_set(&self) -> usize {
        if self.offset % 8 == 0 {
            let start = self.offset / 8;
            let full = self.len / 8;
            let mut n: usize = self.bytes[start..start + full]
                .iter()
                .map(|b| b.count_ones() as usize)
                .sum();
            for i in full * 8..self.len {
                n += get_bit_raw(&self.bytes, self.offset + i) as usize;
            }
            n
        } else {
            self.iter().filter(|b| *b).count()
        }
    }

    pub fn count_unset(&self) -> usize {
        self.len - self.count_set()
    }

    /// Zero-copy sub-range. Panics if the range is out of bounds.
    pub fn slice(&self, offset: usize, len: usize) -> Self {
        assert!(
            offset + len <= self.len,
            "slice {offset}+{len} out of range for bitmap of {}",
            self.len
        );
        Self {
            bytes: self.bytes.clone(),
            offset: self.offset + offset,
            len,
        }
    }

    /// Same bits starting at offset zero. Cheap clone when already aligned.
    pub fn to_packed(&self) -> Result<Self> {
        if self.offset == 0 {
            return Ok(self.clone());
        }
        let mut b = MutableBitmap::with_capacity(self.len, "bitmap_repack")?;
        for bit in self.iter() {
            b.push(bit);
        }
        Ok(b.freeze())
    }

    /// Bitwise AND of two equal-length bitmaps.
    pub fn and(&self, other: &Bitmap) -> Result<Self> {
        assert_eq!(self.len, other.len, "bitmap length mismatch");
        if self.offset % 8 == 0 && other.offset % 8 == 0 {
            let a = &self.bytes[self.offset / 8..];
            let b = &other.bytes[other.offset / 8..];
            let n = bytes_for(self.len);
            let out = alloc::try_collect(a[..n].iter().zip(&b[..n]).map(|(x, y)| x & y), "bitmap_and")?;
            return Ok(Self {
                bytes: Buffer::from_vec(out),
                offset: 0,
                len: self.len,
            });
        }
        let mut out = MutableBitmap::with_capacity(self.len, "bitmap_and")?;
        for (x, y) in self.iter().zip(other.iter()) {
            out.push(x && y);
        }
        Ok(out.freeze())
    }

    /// Bytes retained by the backing buffer.
    pub fn memory_size(&self) -> usize {
        self.bytes.size_bytes()
    }
}

impl PartialEq for Bitmap {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bitmap")
            .field("len", &self.len)
            .field("offset", &self.offset)
            .field("set", &self.count_set())
            .finish()
    }
}

/// Combined validity of two operands: a row is valid only if valid in both.
pub fn combine_validity(a: Option<&Bitmap>, b: Option<&Bitmap>) -> Result<Option<Bitmap>> {
    match (a, b) {
        (None, None) => Ok(None),
        (Some(x), None) | (None, Some(x)) => Ok(Some(x.clone())),
        (Some(x), Some(y)) => Ok(Some(x.and(y)?)),
    }
}

/// Growable bitmap used while building kernel outputs.
#[derive(Debug, Default)]
pub struct MutableBitmap {
    bytes: Vec<u8>,
    len: usize,
}

impl MutableBitmap {
    pub fn with_capacity(bits: usize, tag: &'static str) -> Result<Self> {
        Ok(Self {
            bytes: alloc::try_vec_with_capacity(bytes_for(bits), tag)?,
            len: 0,
        })
    }

    #[inline]
    pub fn push(&mut self, value: bool) {
        if self.len % 8 == 0 {
            self.bytes.push(0);
        }
        if value {
            let last = self.bytes.len() - 1;
            self.bytes[last] |= 1u8 << (self.len & 7);
        }
        self.len += 1;
    }

    pub fn extend_constant(&mut self, additional: usize, value: bool) {
        for _ in 0..additional {
            self.push(value);
        }
    }

    pub fn set(&mut self, i: usize, value: bool) {
        assert!(i < self.len, "bit {i} out of range");
        let mask = 1u8 << (i & 7);
        if value {
            self.bytes[i >> 3] |= mask;
        } else {
            self.bytes[i >> 3] &= !mask;
        }
    }

    pub fn get(&self, i: usize) -> bool {
        assert!(i < self.len, "bit {i} out of range");
        get_bit_raw(&self.bytes, i)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn freeze(self) -> Bitmap {
        Bitmap {
            bytes: Buffer::from_vec(self.bytes),
            offset: 0,
            len: self.len,
        }
    }

    /// Freeze as a validity bitmap, dropping it when every bit is set.
    pub fn freeze_validity(self) -> Option<Bitmap> {
        let bitmap = self.freeze();
        if bitmap.count_unset() == 0 {
            None
        } else {
            Some(bitmap)
        }
    }
}
