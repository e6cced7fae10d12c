//! Variable-width vectors (UTF-8 strings and raw bytes) with i32 offsets,
//! and [`BinaryVectorBuilder`] for filling one row at a time.

use vecta_core::types::DataType;
use vecta_core::{Error, Result};
use vecta_mem::bitmap::bytes_for;
use vecta_mem::{alloc, combine_validity, Bitmap, Buffer, MutableBitmap};

#[derive(Debug, Clone)]
pub struct BinaryVector {
    data_type: DataType,
    offsets: Buffer<i32>,
    values: Buffer<u8>,
    validity: Option<Bitmap>,
}

impl BinaryVector {
    /// Validates offsets: `len + 1` entries, non-decreasing, in bounds.
    ///
    /// The first offset need not be zero, so a borrowed slice of a larger
    /// array is representable without rewriting its offsets.
    pub fn try_new(
        data_type: DataType,
        offsets: Buffer<i32>,
        values: Buffer<u8>,
        validity: Option<Bitmap>,
    ) -> Result<Self> {
        if !matches!(data_type, DataType::Utf8 | DataType::Binary) {
            return Err(Error::Contract(format!(
                "{data_type} is not a variable-width type"
            )));
        }
        if offsets.is_empty() {
            return Err(Error::Contract("offsets must have at least one entry".into()));
        }
        let len = offsets.len() - 1;
        if offsets[0] < 0 || offsets.windows(2).any(|w| w[0] > w[1]) {
            return Err(Error::Contract("offsets must be non-negative and non-decreasing".into()));
        }
        if offsets[len] as usize > values.len() {
            return Err(Error::Contract(format!(
                "last offset {} exceeds {} payload bytes",
                offsets[len],
                values.len()
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
            data_type,
            offsets,
            values,
            validity,
        })
    }

    pub fn from_options<B: AsRef<[u8]>>(data_type: DataType, values: &[Option<B>]) -> Result<Self> {
        let total: usize = values
            .iter()
            .map(|v| v.as_ref().map_or(0, |b| b.as_ref().len()))
            .sum();
        if total > i32::MAX as usize {
            return Err(Error::Contract(format!(
                "{total} payload bytes overflow i32 offsets"
            )));
        }
        if data_type == DataType::Utf8 {
            for (i, b) in values.iter().enumerate() {
                if let Some(b) = b {
                    utf8_row(i, b.as_ref())?;
                }
            }
        }
        let mut offsets = alloc::try_vec_with_capacity(values.len() + 1, "binary_offsets")?;
        let mut payload = alloc::try_vec_with_capacity(total, "binary_values")?;
        let mut validity = MutableBitmap::with_capacity(values.len(), "binary_validity")?;
        offsets.push(0i32);
        for v in values {
            if let Some(b) = v {
                payload.extend_from_slice(b.as_ref());
            }
            offsets.push(payload.len() as i32);
            validity.push(v.is_some());
        }
        Self::try_new(
            data_type,
            Buffer::from_vec(offsets),
            Buffer::from_vec(payload),
            validity.freeze_validity(),
        )
    }

    pub fn from_strs(values: &[Option<&str>]) -> Result<Self> {
        Self::from_options(DataType::Utf8, values)
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
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

    pub fn payload(&self) -> &Buffer<u8> {
        &self.values
    }

    pub fn validity(&self) -> Option<&Bitmap> {
        self.validity.as_ref()
    }

    #[inline]
    pub fn is_valid(&self, i: usize) -> bool {
        self.validity.as_ref().map_or(true, |v| v.get(i))
    }

    /// Bytes of row `i`, ignoring validity.
    #[inline]
    pub fn value(&self, i: usize) -> &[u8] {
        let start = self.offsets[i] as usize;
        let end = self.offsets[i + 1] as usize;
        &self.values[start..end]
    }

    /// Row `i` as text. Bytes that are not UTF-8 are an error, never replaced.
    pub fn str_value(&self, i: usize) -> Result<&str> {
        utf8_row(i, self.value(i))
    }

    /// Check every non-null row of a `Utf8` vector; `Binary` always passes.
    pub fn validate_utf8(&self) -> Result<()> {
        if self.data_type != DataType::Utf8 {
            return Ok(());
        }
        for i in 0..self.len() {
            if self.is_valid(i) {
                self.str_value(i)?;
            }
        }
        Ok(())
    }

    pub fn get(&self, i: usize) -> Option<&[u8]> {
        if self.is_valid(i) {
            Some(self.value(i))
        } else {
            None
        }
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = Option<&[u8]>> + '_ {
        (0..self.len()).map(move |i| self.get(i))
    }

    pub fn null_count(&self) -> usize {
        self.validity.as_ref().map_or(0, |v| v.count_unset())
    }

    pub fn is_borrowed(&self) -> bool {
        self.values.is_borrowed()
    }

    pub fn memory_size(&self) -> usize {
        self.offsets.size_bytes()
            + self.values.size_bytes()
            + self.validity.as_ref().map_or(0, |v| v.memory_size())
    }
}

pub(crate) fn utf8_row(i: usize, bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes)
        .map_err(|e| Error::Contract(format!("row {i} is not valid UTF-8: {e}")))
}

/// Row-at-a-time construction of a [`BinaryVector`] with a declared row count.
///
/// [`BinaryVectorBuilder::with_counts`] fixes the payload size up front and
/// rejects any write that would overflow it; `finish` then demands that
/// exactly that many bytes were written. [`BinaryVectorBuilder::with_estimate`]
/// treats the size as a hint and doubles its capacity as needed. Either way
/// rows are written in order and every declared row must be written before
/// `finish`. Finishing twice returns the same vector.
#[derive(Debug)]
pub struct BinaryVectorBuilder {
    data_type: DataType,
    rows: usize,
    strict: bool,
    byte_capacity: usize,
    offsets: Vec<i32>,
    payload: Vec<u8>,
    validity: MutableBitmap,
    mask: Option<Bitmap>,
    finished: Option<BinaryVector>,
}

impl BinaryVectorBuilder {
    /// Exactly `rows` rows holding exactly `bytes` payload bytes.
    pub fn with_counts(data_type: DataType, rows: usize, bytes: usize) -> Result<Self> {
        Self::new(data_type, rows, bytes, true)
    }

    /// `rows` rows; `bytes` is only the initial payload capacity.
    pub fn with_estimate(data_type: DataType, rows: usize, bytes: usize) -> Result<Self> {
        Self::new(data_type, rows, bytes, false)
    }

    fn new(data_type: DataType, rows: usize, bytes: usize, strict: bool) -> Result<Self> {
        if !matches!(data_type, DataType::Utf8 | DataType::Binary) {
            return Err(Error::Contract(format!(
                "{data_type} is not a variable-width type"
            )));
        }
        if bytes > i32::MAX as usize {
            return Err(Error::Contract(format!("{bytes} payload bytes overflow i32 offsets")));
        }
        let mut offsets = alloc::try_vec_with_capacity(rows + 1, "builder_offsets")?;
        offsets.push(0);
        Ok(Self {
            data_type,
            rows,
            strict,
            byte_capacity: bytes,
            offsets,
            payload: alloc::try_vec_with_capacity(bytes, "builder_values")?,
            validity: MutableBitmap::with_capacity(rows, "builder_validity")?,
            mask: None,
            finished: None,
        })
    }

    /// Declared row count.
    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Rows written so far.
    pub fn written(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn bytes_capacity(&self) -> usize {
        self.byte_capacity
    }

    pub fn bytes_used(&self) -> usize {
        self.payload.len()
    }

    pub fn remaining_bytes(&self) -> usize {
        self.byte_capacity - self.payload.len()
    }

    fn check_open(&self) -> Result<()> {
        if self.finished.is_some() {
            return Err(Error::Contract("builder already finished".into()));
        }
        if self.written() == self.rows {
            return Err(Error::Contract(format!("all {} rows already written", self.rows)));
        }
        Ok(())
    }

    fn check_next(&self, row: usize) -> Result<()> {
        if row != self.written() {
            return Err(Error::Contract(format!(
                "row {row} written out of order, next row is {}",
                self.written()
            )));
        }
        Ok(())
    }

    fn make_room(&mut self, needed: usize) -> Result<()> {
        if needed <= self.remaining_bytes() {
            return Ok(());
        }
        if self.strict {
            return Err(Error::Contract(format!(
                "not enough remaining capacity: {needed} bytes requested, {} left",
                self.remaining_bytes()
            )));
        }
        let mut target = self.byte_capacity.max(1);
        while target - self.payload.len() < needed {
            target = target.saturating_mul(2);
        }
        if target > i32::MAX as usize {
            return Err(Error::Contract(format!("{target} payload bytes overflow i32 offsets")));
        }
        self.payload
            .try_reserve_exact(target - self.payload.len())
            .map_err(|_| Error::OutOfMemory {
                bytes: target,
                tag: "builder_values",
            })?;
        self.byte_capacity = target;
        Ok(())
    }

    /// Write the next row.
    pub fn append(&mut self, value: &[u8]) -> Result<()> {
        self.check_open()?;
        self.make_room(value.len())?;
        self.payload.extend_from_slice(value);
        self.offsets.push(self.payload.len() as i32);
        self.validity.push(true);
        Ok(())
    }

    /// Write the next row as null; it takes no payload bytes.
    pub fn append_null(&mut self) -> Result<()> {
        self.check_open()?;
        self.offsets.push(self.payload.len() as i32);
        self.validity.push(false);
        Ok(())
    }

    /// Write row `row`, which must be the next unwritten one.
    pub fn set(&mut self, row: usize, value: &[u8]) -> Result<()> {
        self.check_open()?;
        self.check_next(row)?;
        self.append(value)
    }

    pub fn set_null(&mut self, row: usize) -> Result<()> {
        self.check_open()?;
        self.check_next(row)?;
        self.append_null()
    }

    /// Packed validity bits (LSB first, one per declared row) applied at
    /// `finish`. A row is valid only if its bit is set and it was not
    /// written as null.
    pub fn set_validity_mask(&mut self, bits: &[u8]) -> Result<()> {
        if self.finished.is_some() {
            return Err(Error::Contract("builder already finished".into()));
        }
        if bits.len() < bytes_for(self.rows) {
            return Err(Error::Contract(format!(
                "validity mask is too small: {} bytes for {} rows",
                bits.len(),
                self.rows
            )));
        }
        let bytes = alloc::try_collect(bits.iter().copied(), "builder_mask")?;
        self.mask = Bitmap::try_new(Buffer::from_vec(bytes), 0, self.rows);
        Ok(())
    }

    /// Seal the builder. Later calls return the same vector.
    pub fn finish(&mut self) -> Result<BinaryVector> {
        if let Some(done) = &self.finished {
            return Ok(done.clone());
        }
        if self.written() != self.rows {
            return Err(Error::Contract(format!(
                "appended {} of {} entries",
                self.written(),
                self.rows
            )));
        }
        if self.strict && self.payload.len() != self.byte_capacity {
            return Err(Error::Contract(format!(
                "consumed {} bytes but expected {}",
                self.payload.len(),
                self.byte_capacity
            )));
        }
        let mut validity = std::mem::take(&mut self.validity).freeze_validity();
        if let Some(mask) = self.mask.take() {
            validity = combine_validity(validity.as_ref(), Some(&mask))?.filter(|v| v.count_unset() > 0);
        }
        let vector = BinaryVector::try_new(
            self.data_type,
            Buffer::from_vec(std::mem::take(&mut self.offsets)),
            Buffer::from_vec(std::mem::take(&mut self.payload)),
            validity,
        )?;
        vector.validate_utf8()?;
        self.finished = Some(vector.clone());
        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(v: &BinaryVector) -> Vec<Option<&[u8]>> {
        v.iter().collect()
    }

    #[test]
    fn test_append_and_nulls() {
        let mut b = BinaryVectorBuilder::with_counts(DataType::Binary, 3, 3).unwrap();
        b.append(b"a").unwrap();
        b.append(b"bc").unwrap();
        b.append_null().unwrap();
        let v = b.finish().unwrap();
        assert_eq!(rows(&v), vec![Some(&b"a"[..]), Some(&b"bc"[..]), None]);
        assert_eq!(v.offsets().as_slice(), &[0, 1, 3, 3]);
        assert_eq!(v.payload().as_slice(), b"abc");
        assert_eq!(v.null_count(), 1);
    }

    #[test]
    fn test_all_valid_has_no_validity() {
        let mut b = BinaryVectorBuilder::with_counts(DataType::Utf8, 2, 2).unwrap();
        b.append(b"x").unwrap();
        b.append(b"y").unwrap();
        assert!(b.finish().unwrap().validity().is_none());
    }

    #[test]
    fn test_finish_twice_shares_buffers() {
        let mut b = BinaryVectorBuilder::with_counts(DataType::Binary, 1, 1).unwrap();
        b.append(b"z").unwrap();
        let first = b.finish().unwrap();
        let second = b.finish().unwrap();
        assert_eq!(first.payload().as_ptr(), second.payload().as_ptr());
        assert!(b.append(b"q").unwrap_err().to_string().contains("already finished"));
    }

    #[test]
    fn test_strict_capacity() {
        let mut over = BinaryVectorBuilder::with_counts(DataType::Binary, 2, 3).unwrap();
        over.append(b"ab").unwrap();
        let err = over.append(b"cdef").unwrap_err();
        assert!(err.to_string().contains("not enough remaining capacity"));
        // The rejected row was not written.
        assert_eq!(over.written(), 1);
        assert_eq!(over.remaining_bytes(), 1);

        let mut under = BinaryVectorBuilder::with_counts(DataType::Binary, 2, 10).unwrap();
        under.append(b"ab").unwrap();
        under.append(b"cd").unwrap();
        let err = under.finish().unwrap_err();
        assert!(err.to_string().contains("consumed 4 bytes but expected 10"));

        let mut short = BinaryVectorBuilder::with_counts(DataType::Binary, 3, 10).unwrap();
        short.append(b"a").unwrap();
        assert!(short.finish().unwrap_err().to_string().contains("appended 1 of 3 entries"));
    }

    #[test]
    fn test_estimate_grows() {
        let mut b = BinaryVectorBuilder::with_estimate(DataType::Binary, 3, 1).unwrap();
        for fill in [b'a', b'b', b'c'] {
            b.append(&[fill; 10]).unwrap();
        }
        assert!(b.bytes_capacity() >= 30);
        let v = b.finish().unwrap();
        assert_eq!(v.value(2), &[b'c'; 10]);
        assert_eq!(v.len(), 3);
    }

    #[test]
    fn test_capacity_tracking() {
        let mut b = BinaryVectorBuilder::with_counts(DataType::Utf8, 3, 10).unwrap();
        assert_eq!((b.len(), b.bytes_capacity(), b.bytes_used()), (3, 10, 0));
        b.append(b"abc").unwrap();
        b.append(b"de").unwrap();
        assert_eq!(b.bytes_used(), 5);
        assert_eq!(b.remaining_bytes(), 5);
    }

    #[test]
    fn test_set_in_order_only() {
        let mut b = BinaryVectorBuilder::with_counts(DataType::Binary, 3, 3).unwrap();
        b.set(0, b"a").unwrap();
        b.set_null(1).unwrap();
        b.set(2, b"bc").unwrap();
        assert_eq!(rows(&b.finish().unwrap()), vec![Some(&b"a"[..]), None, Some(&b"bc"[..])]);

        let mut skip = BinaryVectorBuilder::with_counts(DataType::Binary, 2, 2).unwrap();
        assert!(skip.set(1, b"x").is_err());
    }

    #[test]
    fn test_validity_mask() {
        let mut b = BinaryVectorBuilder::with_counts(DataType::Binary, 3, 4).unwrap();
        b.append(b"ab").unwrap();
        b.append_null().unwrap();
        b.append(b"cd").unwrap();
        b.set_validity_mask(&[0b011]).unwrap();
        // Row 1 stays null from the write, row 2 is nulled by the mask.
        assert_eq!(rows(&b.finish().unwrap()), vec![Some(&b"ab"[..]), None, None]);

        let mut wide = BinaryVectorBuilder::with_counts(DataType::Binary, 10, 0).unwrap();
        let err = wide.set_validity_mask(&[0xff]).unwrap_err();
        assert!(err.to_string().contains("validity mask is too small"));
    }

    #[test]
    fn test_utf8_rows_are_checked() {
        let mut b = BinaryVectorBuilder::with_counts(DataType::Utf8, 1, 2).unwrap();
        b.append(&[0xC3, 0x28]).unwrap();
        assert!(matches!(b.finish(), Err(Error::Contract(_))));

        let bad: [Option<&[u8]>; 1] = [Some(&[0xFF])];
        assert!(BinaryVector::from_options(DataType::Utf8, &bad).is_err());
        assert!(BinaryVector::from_options(DataType::Binary, &bad).is_ok());

        let ok = BinaryVector::from_strs(&[Some("héllo"), None]).unwrap();
        assert_eq!(ok.str_value(0).unwrap(), "héllo");
    }
}
