//! Gather rows by position into a new owned vector.
//!
//! Indices are caller-guaranteed to be in range and are not validated up
//! front. An out-of-range index panics through slice bounds checking inside
//! this call; it never reads outside the vector's buffers.

use vecta_core::native::NativeType;
use vecta_core::{Error, Result};
use vecta_mem::{alloc, Bitmap, Buffer, MutableBitmap};

use crate::array::ArrayVector;
use crate::binary::BinaryVector;
use crate::boolean::BooleanVector;
use crate::opaque::OpaqueVector;
use crate::primitive::{PrimitiveType, PrimitiveVector};
use crate::vector::{dispatch_primitive, Vector};

fn take_validity(validity: Option<&Bitmap>, indices: &[u32]) -> Result<Option<Bitmap>> {
    let Some(v) = validity else {
        return Ok(None);
    };
    let mut out = MutableBitmap::with_capacity(indices.len(), "take_validity")?;
    for &i in indices {
        out.push(v.get(i as usize));
    }
    Ok(out.freeze_validity())
}

fn take_primitive<T: NativeType>(p: &PrimitiveVector<T>, indices: &[u32]) -> Result<PrimitiveVector<T>> {
    let src = p.values();
    let values = alloc::try_collect(indices.iter().map(|&i| src[i as usize]), "take")?;
    let validity = take_validity(p.validity(), indices)?;
    Ok(p.with_parts(Buffer::from_vec(values), validity))
}

fn take_boolean(b: &BooleanVector, indices: &[u32]) -> Result<BooleanVector> {
    let mut values = MutableBitmap::with_capacity(indices.len(), "take")?;
    for &i in indices {
        values.push(b.value(i as usize));
    }
    BooleanVector::try_new(values.freeze(), take_validity(b.validity(), indices)?)
}

fn take_binary(b: &BinaryVector, indices: &[u32]) -> Result<BinaryVector> {
    let total: usize = indices.iter().map(|&i| b.value(i as usize).len()).sum();
    if total > i32::MAX as usize {
        return Err(Error::Contract(format!(
            "gathered {total} payload bytes overflow i32 offsets"
        )));
    }
    let mut offsets = alloc::try_vec_with_capacity(indices.len() + 1, "take_offsets")?;
    let mut payload = alloc::try_vec_with_capacity(total, "take_values")?;
    offsets.push(0i32);
    for &i in indices {
        payload.extend_from_slice(b.value(i as usize));
        offsets.push(payload.len() as i32);
    }
    BinaryVector::try_new(
        b.data_type(),
        Buffer::from_vec(offsets),
        Buffer::from_vec(payload),
        take_validity(b.validity(), indices)?,
    )
}

fn take_array(a: &ArrayVector, indices: &[u32]) -> Result<ArrayVector> {
    let mut child_indices = Vec::new();
    for &i in indices {
        child_indices.extend(a.value_range(i as usize).map(|j| j as u32));
    }
    let child = a.child().take(&child_indices)?;
    // Null rows keep their child run so offsets stay a plain prefix sum.
    let mut offsets = alloc::try_vec_with_capacity(indices.len() + 1, "take_offsets")?;
    offsets.push(0i32);
    let mut end = 0usize;
    for &i in indices {
        end += a.value_range(i as usize).len();
        offsets.push(end as i32);
    }
    ArrayVector::try_new(
        Buffer::from_vec(offsets),
        child,
        take_validity(a.validity(), indices)?,
    )
}

/// Passthrough rows are re-selected over the same source; no payload moves.
fn take_opaque(o: &OpaqueVector, indices: &[u32]) -> Result<OpaqueVector> {
    let validity = take_validity(o.validity(), indices)?;
    let selection = if o.is_borrowed() {
        Some(alloc::try_collect(
            indices.iter().map(|&i| o.source_row(i as usize) as u32),
            "take_selection",
        )?)
    } else {
        assert!(
            indices.iter().all(|&i| (i as usize) < o.len()),
            "take index out of range for {} rows",
            o.len()
        );
        None
    };
    o.reselect(indices.len(), validity, selection)
}

impl Vector {
    /// Rows at `indices`, in order, as a new vector of the same kind.
    ///
    /// Every kind but passthrough comes back owned; a passthrough column keeps
    /// borrowing its source array.
    ///
    /// # Panics
    /// If any index is `>= self.len()`.
    pub fn take(&self, indices: &[u32]) -> Result<Vector> {
        let out = dispatch_primitive!(
            self,
            p => PrimitiveType::wrap(take_primitive(p, indices)?),
            other => match other {
                Vector::Boolean(b) => Vector::Boolean(take_boolean(b, indices)?),
                Vector::Utf8(b) => Vector::Utf8(take_binary(b, indices)?),
                Vector::Binary(b) => Vector::Binary(take_binary(b, indices)?),
                Vector::Array(a) => Vector::Array(take_array(a, indices)?),
                Vector::NonNative(o) => Vector::NonNative(take_opaque(o, indices)?),
                _ => return Err(Error::not_implemented("take", self.data_type(), "-")),
            }
        );
        Ok(out)
    }
}
