//! Morsels: the named, equal-length column batches exchanged with the executor.
//!
//! A morsel is created by a producing operator, consumed by the next one, and
//! dropped. It may carry a budget reservation for the bytes it holds; the
//! reservation is released when the last clone of the morsel drops.

use std::sync::Arc;

use vecta_core::caps::CpuCapabilities;
use vecta_core::scalar::Scalar;
use vecta_core::schema::{Field, Schema};
use vecta_core::{Error, Result};
use vecta_mem::{alloc, BudgetGuardImpl};

use crate::mask::Mask;
use crate::vector::Vector;

#[derive(Debug, Clone, Default)]
pub struct Morsel {
    columns: Vec<(String, Vector)>,
    num_rows: usize,
    reservation: Option<Arc<BudgetGuardImpl>>,
}

impl Morsel {
    /// Row count is taken from the columns; zero when there are none.
    pub fn try_new(columns: Vec<(String, Vector)>) -> Result<Self> {
        let num_rows = columns.first().map_or(0, |(_, v)| v.len());
        Self::with_row_count(columns, num_rows)
    }

    /// Explicit row count, which every column must match. Needed for
    /// zero-column morsels that still carry rows (e.g. `COUNT(*)` inputs).
    pub fn with_row_count(columns: Vec<(String, Vector)>, num_rows: usize) -> Result<Self> {
        for (i, (name, vector)) in columns.iter().enumerate() {
            if vector.len() != num_rows {
                return Err(Error::Contract(format!(
                    "column '{name}' has {} rows, morsel has {num_rows}",
                    vector.len()
                )));
            }
            if columns[..i].iter().any(|(other, _)| other == name) {
                return Err(Error::Contract(format!("duplicate column name '{name}'")));
            }
        }
        Ok(Self {
            columns,
            num_rows,
            reservation: None,
        })
    }

    pub fn empty(num_rows: usize) -> Self {
        Self {
            columns: Vec::new(),
            num_rows,
            reservation: None,
        }
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.num_rows == 0
    }

    pub fn column(&self, name: &str) -> Option<&Vector> {
        self.columns.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn column_at(&self, idx: usize) -> Option<(&str, &Vector)> {
        self.columns.get(idx).map(|(n, v)| (n.as_str(), v))
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &Vector)> + '_ {
        self.columns.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn schema(&self) -> Schema {
        Schema::new(
            self.columns
                .iter()
                .map(|(n, v)| Field::new(n.clone(), v.data_type(), v.validity().is_some()))
                .collect(),
        )
    }

    fn require(&self, name: &str) -> Result<&Vector> {
        self.column(name)
            .ok_or_else(|| Error::Contract(format!("column '{name}' not found")))
    }

    fn map_columns<F>(&self, num_rows: usize, mut f: F) -> Result<Morsel>
    where
        F: FnMut(&Vector) -> Result<Vector>,
    {
        let mut columns = Vec::with_capacity(self.columns.len());
        for (name, v) in &self.columns {
            columns.push((name.clone(), f(v)?));
        }
        Ok(Morsel {
            columns,
            num_rows,
            reservation: None,
        })
    }

    /// Gather rows from every column. Indices are caller-guaranteed in range.
    pub fn take(&self, indices: &[u32]) -> Result<Morsel> {
        self.map_columns(indices.len(), |v| v.take(indices))
    }

    /// Keep rows whose mask byte is TRUE; false and null rows are dropped.
    pub fn filter(&self, mask: &Mask) -> Result<Morsel> {
        if mask.len() != self.num_rows {
            return Err(Error::Contract(format!(
                "mask has {} rows, morsel has {}",
                mask.len(),
                self.num_rows
            )));
        }
        let keep = mask.true_indices()?;
        if keep.len() == self.num_rows {
            return Ok(self.detached());
        }
        self.take(&keep)
    }

    /// Same columns without this morsel's budget reservation.
    pub fn detached(&self) -> Morsel {
        Morsel {
            columns: self.columns.clone(),
            num_rows: self.num_rows,
            reservation: None,
        }
    }

    /// Columns in the given order; unknown names are a contract error.
    pub fn select(&self, names: &[&str]) -> Result<Morsel> {
        let mut columns = Vec::with_capacity(names.len());
        for name in names {
            columns.push((name.to_string(), self.require(name)?.clone()));
        }
        Morsel::with_row_count(columns, self.num_rows)
    }

    pub fn rename(&self, from: &str, to: &str) -> Result<Morsel> {
        self.require(from)?;
        let columns = self
            .columns
            .iter()
            .map(|(n, v)| {
                let name = if n == from { to.to_string() } else { n.clone() };
                (name, v.clone())
            })
            .collect();
        Morsel::with_row_count(columns, self.num_rows)
    }

    /// Replace the column called `name`, or append it.
    pub fn with_column(&self, name: &str, vector: Vector) -> Result<Morsel> {
        let mut columns = self.columns.clone();
        match columns.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = vector,
            None => columns.push((name.to_string(), vector)),
        }
        Morsel::with_row_count(columns, self.num_rows)
    }

    /// Owned copy of rows `offset..offset + len`.
    pub fn slice(&self, offset: usize, len: usize) -> Result<Morsel> {
        if offset.checked_add(len).map_or(true, |end| end > self.num_rows) {
            return Err(Error::Contract(format!(
                "slice {offset}+{len} out of range for {} rows",
                self.num_rows
            )));
        }
        self.map_columns(len, |v| v.slice_owned(offset, len))
    }

    /// Pair rows of two morsels: output row `i` is `left[left_indices[i]]`
    /// followed by `right[right_indices[i]]`.
    ///
    /// Every left column is kept; a right column whose name the left side
    /// already has is dropped. The index lists must be the same length.
    pub fn align(
        left: &Morsel,
        left_indices: &[u32],
        right: &Morsel,
        right_indices: &[u32],
    ) -> Result<Morsel> {
        if left_indices.len() != right_indices.len() {
            return Err(Error::Contract(format!(
                "align needs paired indices, got {} left and {} right",
                left_indices.len(),
                right_indices.len()
            )));
        }
        let mut columns = Vec::with_capacity(left.num_columns() + right.num_columns());
        for (name, v) in &left.columns {
            columns.push((name.clone(), v.take(left_indices)?));
        }
        for (name, v) in &right.columns {
            if left.column(name).is_none() {
                columns.push((name.clone(), v.take(right_indices)?));
            }
        }
        Morsel::with_row_count(columns, left_indices.len())
    }

    /// Row fingerprints over all columns, in column order.
    pub fn hash(&self) -> Result<Vec<u64>> {
        self.hash_with(&CpuCapabilities::portable())
    }

    pub fn hash_with(&self, caps: &CpuCapabilities) -> Result<Vec<u64>> {
        let mut out = alloc::try_alloc_zeroed::<u64>(self.num_rows, "morsel_hash")?;
        for (_, v) in &self.columns {
            v.hash_into_with(caps, &mut out, 0)?;
        }
        Ok(out)
    }

    /// Row fingerprints over the named key columns, in the given order.
    pub fn hash_keys(&self, keys: &[&str], caps: &CpuCapabilities) -> Result<Vec<u64>> {
        let mut out = alloc::try_alloc_zeroed::<u64>(self.num_rows, "morsel_hash")?;
        for key in keys {
            self.require(key)?.hash_into_with(caps, &mut out, 0)?;
        }
        Ok(out)
    }

    /// Hash partition index per row over the key columns.
    pub fn hash_columns(&self, keys: &[&str], num_partitions: usize) -> Result<Vec<usize>> {
        if num_partitions == 0 {
            return Err(Error::Contract("num_partitions must be positive".into()));
        }
        let hashes = self.hash_keys(keys, &CpuCapabilities::portable())?;
        Ok(hashes
            .into_iter()
            .map(|h| (h % num_partitions as u64) as usize)
            .collect())
    }

    /// Bytes addressed by all column buffers.
    pub fn memory_size(&self) -> usize {
        self.columns.iter().map(|(_, v)| v.memory_size()).sum()
    }

    /// Row-major materialisation for row-oriented consumers.
    pub fn to_rows(&self) -> Result<Vec<Vec<Scalar>>> {
        let lists = self
            .columns
            .iter()
            .map(|(_, v)| v.to_materialized_list())
            .collect::<Result<Vec<_>>>()?;
        Ok((0..self.num_rows)
            .map(|row| lists.iter().map(|col| col[row].clone()).collect())
            .collect())
    }

    /// Attach the budget reservation backing this morsel's bytes.
    pub fn with_reservation(mut self, guard: BudgetGuardImpl) -> Self {
        self.reservation = Some(Arc::new(guard));
        self
    }

    pub fn reserved_bytes(&self) -> usize {
        use vecta_core::budget::BudgetGuard;
        self.reservation.as_ref().map_or(0, |g| g.bytes())
    }

    pub fn into_columns(self) -> Vec<(String, Vector)> {
        self.columns
    }
}
