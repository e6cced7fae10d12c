//! Byte-per-row selection vectors produced by comparisons.

use vecta_core::Result;
use vecta_mem::alloc;

pub const MASK_FALSE: u8 = 0;
pub const MASK_TRUE: u8 = 1;
/// Row had a null input: the outcome is unknown, not false.
pub const MASK_NULL: u8 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Mask {
    bytes: Vec<u8>,
}

impl Mask {
    /// Wrap raw bytes. Values other than 0/1/2 are a contract violation.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        debug_assert!(bytes.iter().all(|b| *b <= MASK_NULL));
        Self { bytes }
    }

    pub fn from_bools(values: &[bool]) -> Result<Self> {
        let bytes = alloc::try_collect(values.iter().map(|&v| v as u8), "mask")?;
        Ok(Self { bytes })
    }

    pub fn from_options(values: &[Option<bool>]) -> Result<Self> {
        let bytes = alloc::try_collect(
            values.iter().map(|v| match v {
                Some(true) => MASK_TRUE,
                Some(false) => MASK_FALSE,
                None => MASK_NULL,
            }),
            "mask",
        )?;
        Ok(Self { bytes })
    }

    pub fn filled(len: usize, byte: u8) -> Result<Self> {
        let mut bytes = alloc::try_vec_with_capacity(len, "mask")?;
        bytes.resize(len, byte);
        Ok(Self { bytes })
    }

    pub fn all_null(len: usize) -> Result<Self> {
        Self::filled(len, MASK_NULL)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// `None` for the null sentinel.
    pub fn get(&self, i: usize) -> Option<bool> {
        match self.bytes[i] {
            MASK_TRUE => Some(true),
            MASK_FALSE => Some(false),
            _ => None,
        }
    }

    pub fn is_null(&self, i: usize) -> bool {
        self.bytes[i] == MASK_NULL
    }

    pub fn count_true(&self) -> usize {
        self.bytes.iter().filter(|b| **b == MASK_TRUE).count()
    }

    pub fn count_null(&self) -> usize {
        self.bytes.iter().filter(|b| **b == MASK_NULL).count()
    }

    /// Positions holding TRUE; null and false rows are skipped.
    pub fn true_indices(&self) -> Result<Vec<u32>> {
        let mut out = alloc::try_vec_with_capacity(self.count_true(), "mask_indices")?;
        out.extend(
            self.bytes
                .iter()
                .enumerate()
                .filter(|(_, b)| **b == MASK_TRUE)
                .map(|(i, _)| i as u32),
        );
        Ok(out)
    }

    /// Three-valued NOT: null stays null.
    pub fn not(&self) -> Result<Self> {
        let bytes = alloc::try_collect(
            self.bytes.iter().map(|b| match *b {
                MASK_TRUE => MASK_FALSE,
                MASK_FALSE => MASK_TRUE,
                _ => MASK_NULL,
            }),
            "mask",
        )?;
        Ok(Self { bytes })
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = Option<bool>> + '_ {
        (0..self.len()).map(move |i| self.get(i))
    }
}
