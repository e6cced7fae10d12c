//! Passthrough vectors for interchange types the kernel does not interpret.
//!
//! Length and validity are always known. A column that arrived through
//! [`crate::ffi`] also keeps its source array plus a row selection over it,
//! so gathering rows never touches the payload and the column can be
//! exported again. Fixed-width formats (`C S I L e w:N d:P,S tdm tD* tiM
//! tiD`) additionally expose each row's raw bytes, which is what hashing
//! uses; rows of any other format fingerprint like nulls.

use std::sync::Arc;

use vecta_core::{Error, Result};
use vecta_mem::Bitmap;

use crate::ffi::ForeignColumn;

#[derive(Clone)]
pub struct OpaqueVector {
    format: String,
    len: usize,
    validity: Option<Bitmap>,
    source: Option<Arc<ForeignColumn>>,
    /// Source rows, one per logical row. `None` is the identity.
    selection: Option<Arc<[u32]>>,
}

impl OpaqueVector {
    /// A detached passthrough column: no payload, only length and validity.
    pub fn try_new(format: impl Into<String>, len: usize, validity: Option<Bitmap>) -> Result<Self> {
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
            format: format.into(),
            len,
            validity,
            source: None,
            selection: None,
        })
    }

    pub(crate) fn with_source(mut self, source: Arc<ForeignColumn>) -> Self {
        self.source = Some(source);
        self
    }

    /// Interchange format string the column arrived with.
    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn validity(&self) -> Option<&Bitmap> {
        self.validity.as_ref()
    }

    #[inline]
    pub fn is_valid(&self, i: usize) -> bool {
        self.validity.as_ref().map_or(true, |v| v.get(i))
    }

    pub fn null_count(&self) -> usize {
        self.validity.as_ref().map_or(0, |v| v.count_unset())
    }

    pub fn is_borrowed(&self) -> bool {
        self.source.is_some()
    }

    /// Bytes per row when the format is fixed-width and the payload is attached.
    pub fn byte_width(&self) -> Option<usize> {
        self.source.as_ref().and_then(|s| s.byte_width())
    }

    /// Raw payload of row `i`, regardless of its validity.
    ///
    /// `None` unless [`OpaqueVector::byte_width`] is known. Panics if `i` is
    /// out of range.
    pub fn value_bytes(&self, i: usize) -> Option<&[u8]> {
        let row = self.source_row(i);
        self.source.as_ref()?.row_bytes(row)
    }

    pub fn memory_size(&self) -> usize {
        self.validity.as_ref().map_or(0, |v| v.memory_size())
            + self.selection.as_ref().map_or(0, |s| s.len() * std::mem::size_of::<u32>())
    }

    pub(crate) fn source(&self) -> Option<&Arc<ForeignColumn>> {
        self.source.as_ref()
    }

    /// Row of the source array that logical row `i` reads from.
    pub(crate) fn source_row(&self, i: usize) -> usize {
        match &self.selection {
            Some(s) => s[i] as usize,
            None => {
                assert!(i < self.len, "row {i} out of range for {} rows", self.len);
                i
            }
        }
    }

    /// First source row when the selection is one ascending contiguous run.
    pub(crate) fn contiguous_start(&self) -> Option<usize> {
        let Some(s) = &self.selection else {
            return Some(0);
        };
        let Some(&first) = s.first() else {
            return Some(0);
        };
        s.iter()
            .enumerate()
            .all(|(k, &row)| row as usize == first as usize + k)
            .then_some(first as usize)
    }

    /// Same source, new rows. `selection` is ignored for detached columns.
    pub(crate) fn reselect(
        &self,
        len: usize,
        validity: Option<Bitmap>,
        selection: Option<Vec<u32>>,
    ) -> Result<Self> {
        let mut out = Self::try_new(self.format.clone(), len, validity)?;
        if let Some(source) = &self.source {
            out.source = Some(Arc::clone(source));
            out.selection = selection.map(Arc::from);
        }
        Ok(out)
    }
}

impl std::fmt::Debug for OpaqueVector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpaqueVector")
            .field("format", &self.format)
            .field("len", &self.len)
            .field("borrowed", &self.is_borrowed())
            .field("selected", &self.selection.is_some())
            .finish()
    }
}
