//! The `Vector` sum type and the operations every kind supports.
//!
//! Kind-specific operations live in sibling modules (`compare`, `take`,
//! `hash`, `reduce`) as further `impl Vector` blocks.

use vecta_core::scalar::Scalar;
use vecta_core::types::{DataType, IntervalMonthDayNano};
use vecta_core::{Error, Result};
use vecta_mem::{alloc, Bitmap};

use crate::array::ArrayVector;
use crate::binary::BinaryVector;
use crate::boolean::BooleanVector;
use crate::mask::{Mask, MASK_FALSE, MASK_TRUE};
use crate::opaque::OpaqueVector;
use crate::primitive::{PrimitiveType, PrimitiveVector};

#[derive(Debug, Clone)]
pub enum Vector {
    Int8(PrimitiveVector<i8>),
    Int16(PrimitiveVector<i16>),
    Int32(PrimitiveVector<i32>),
    Int64(PrimitiveVector<i64>),
    Float32(PrimitiveVector<f32>),
    Float64(PrimitiveVector<f64>),
    Date32(PrimitiveVector<i32>),
    Timestamp64(PrimitiveVector<i64>),
    Time32(PrimitiveVector<i32>),
    Time64(PrimitiveVector<i64>),
    Interval(PrimitiveVector<IntervalMonthDayNano>),
    Boolean(BooleanVector),
    Utf8(BinaryVector),
    Binary(BinaryVector),
    Array(ArrayVector),
    NonNative(OpaqueVector),
}

/// Run `$body` with `$p` bound to the inner `PrimitiveVector<T>` of any
/// fixed-width variant; every other variant goes to the fallback arm.
macro_rules! dispatch_primitive {
    ($vector:expr, $p:ident => $body:expr, $other:pat => $fallback:expr) => {
        match $vector {
            $crate::vector::Vector::Int8($p) => $body,
            $crate::vector::Vector::Int16($p) => $body,
            $crate::vector::Vector::Int32($p) => $body,
            $crate::vector::Vector::Int64($p) => $body,
            $crate::vector::Vector::Float32($p) => $body,
            $crate::vector::Vector::Float64($p) => $body,
            $crate::vector::Vector::Date32($p) => $body,
            $crate::vector::Vector::Timestamp64($p) => $body,
            $crate::vector::Vector::Time32($p) => $body,
            $crate::vector::Vector::Time64($p) => $body,
            $crate::vector::Vector::Interval($p) => $body,
            $other => $fallback,
        }
    };
}

pub(crate) use dispatch_primitive;

impl Vector {
    pub fn len(&self) -> usize {
        dispatch_primitive!(self, p => p.len(), other => match other {
            Vector::Boolean(b) => b.len(),
            Vector::Utf8(b) | Vector::Binary(b) => b.len(),
            Vector::Array(a) => a.len(),
            Vector::NonNative(o) => o.len(),
            _ => 0,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn data_type(&self) -> DataType {
        dispatch_primitive!(self, p => p.data_type(), other => match other {
            Vector::Boolean(_) => DataType::Boolean,
            Vector::Utf8(_) => DataType::Utf8,
            Vector::Binary(_) => DataType::Binary,
            Vector::Array(_) => DataType::Array,
            _ => DataType::NonNative,
        })
    }

    pub fn validity(&self) -> Option<&Bitmap> {
        dispatch_primitive!(self, p => p.validity(), other => match other {
            Vector::Boolean(b) => b.validity(),
            Vector::Utf8(b) | Vector::Binary(b) => b.validity(),
            Vector::Array(a) => a.validity(),
            Vector::NonNative(o) => o.validity(),
            _ => None,
        })
    }

    pub fn null_count(&self) -> usize {
        self.validity().map_or(0, |v| v.count_unset())
    }

    #[inline]
    pub fn is_valid(&self, i: usize) -> bool {
        self.validity().map_or(true, |v| v.get(i))
    }

    /// True when any payload buffer is borrowed from an external producer.
    pub fn is_borrowed(&self) -> bool {
        dispatch_primitive!(self, p => p.is_borrowed(), other => match other {
            Vector::Boolean(b) => b.is_borrowed(),
            Vector::Utf8(b) | Vector::Binary(b) => b.is_borrowed(),
            Vector::Array(a) => a.is_borrowed(),
            Vector::NonNative(o) => o.is_borrowed(),
            _ => false,
        })
    }

    /// Bytes addressed by the vector's buffers, including shared ones.
    pub fn memory_size(&self) -> usize {
        dispatch_primitive!(self, p => p.memory_size(), other => match other {
            Vector::Boolean(b) => b.memory_size(),
            Vector::Utf8(b) | Vector::Binary(b) => b.memory_size(),
            Vector::Array(a) => a.memory_size(),
            Vector::NonNative(o) => o.memory_size(),
            _ => 0,
        })
    }

    /// One byte per row: TRUE where the row is null.
    pub fn is_null(&self) -> Result<Mask> {
        let len = self.len();
        let bytes = match self.validity() {
            None => {
                let mut out = alloc::try_vec_with_capacity(len, "is_null")?;
                out.resize(len, MASK_FALSE);
                out
            }
            Some(v) => alloc::try_collect(
                v.iter().map(|valid| if valid { MASK_FALSE } else { MASK_TRUE }),
                "is_null",
            )?,
        };
        Ok(Mask::from_bytes(bytes))
    }

    /// Logical value of row `i`. Panics if `i` is out of range.
    pub fn get_scalar(&self, i: usize) -> Result<Scalar> {
        if !self.is_valid(i) {
            return Ok(Scalar::Null);
        }
        let dt = self.data_type();
        dispatch_primitive!(self, p => Ok(p.values()[i].to_scalar(dt)), other => match other {
            Vector::Boolean(b) => Ok(Scalar::Boolean(b.value(i))),
            Vector::Utf8(b) => Ok(Scalar::Utf8(b.str_value(i)?.to_owned())),
            Vector::Binary(b) => Ok(Scalar::Binary(b.value(i).to_vec())),
            Vector::Array(a) => {
                let mut items = Vec::with_capacity(a.value_range(i).len());
                for j in a.value_range(i) {
                    items.push(a.child().get_scalar(j)?);
                }
                Ok(Scalar::List(items))
            }
            _ => Err(Error::not_implemented("to_materialized_list", dt, "-")),
        })
    }

    /// Row-oriented copy of every value, nulls as `Scalar::Null`.
    pub fn to_materialized_list(&self) -> Result<Vec<Scalar>> {
        let mut out = alloc::try_vec_with_capacity(self.len(), "materialize")?;
        for i in 0..self.len() {
            out.push(self.get_scalar(i)?);
        }
        Ok(out)
    }

    /// Owned vector of `data_type` from logical values.
    ///
    /// Every scalar must be `Null` or of `data_type`. For arrays the child
    /// type is taken from the first non-null element (Int64 if there is none).
    pub fn from_scalars(data_type: DataType, values: &[Scalar]) -> Result<Vector> {
        for v in values {
            if let Some(t) = v.data_type() {
                if t != data_type {
                    return Err(Error::Contract(format!(
                        "{t} value in a {data_type} column"
                    )));
                }
            }
        }
        match data_type {
            DataType::Int8 => primitive_from_scalars::<i8>(data_type, values),
            DataType::Int16 => primitive_from_scalars::<i16>(data_type, values),
            DataType::Int32 | DataType::Date32 | DataType::Time32(_) => {
                primitive_from_scalars::<i32>(data_type, values)
            }
            DataType::Int64 | DataType::Timestamp64(_) | DataType::Time64(_) => {
                primitive_from_scalars::<i64>(data_type, values)
            }
            DataType::Float32 => primitive_from_scalars::<f32>(data_type, values),
            DataType::Float64 => primitive_from_scalars::<f64>(data_type, values),
            DataType::Interval => primitive_from_scalars::<IntervalMonthDayNano>(data_type, values),
            DataType::Boolean => {
                let opts: Vec<Option<bool>> = values
                    .iter()
                    .map(|v| match v {
                        Scalar::Boolean(b) => Some(*b),
                        _ => None,
                    })
                    .collect();
                Ok(Vector::Boolean(BooleanVector::from_options(&opts)?))
            }
            DataType::Utf8 => {
                let opts: Vec<Option<&[u8]>> = values
                    .iter()
                    .map(|v| match v {
                        Scalar::Utf8(s) => Some(s.as_bytes()),
                        _ => None,
                    })
                    .collect();
                Ok(Vector::Utf8(BinaryVector::from_options(DataType::Utf8, &opts)?))
            }
            DataType::Binary => {
                let opts: Vec<Option<&[u8]>> = values
                    .iter()
                    .map(|v| match v {
                        Scalar::Binary(b) => Some(b.as_slice()),
                        _ => None,
                    })
                    .collect();
                Ok(Vector::Binary(BinaryVector::from_options(DataType::Binary, &opts)?))
            }
            DataType::Array => {
                let mut lengths = Vec::with_capacity(values.len());
                let mut flat = Vec::new();
                for v in values {
                    match v {
                        Scalar::List(items) => {
                            lengths.push(Some(items.len()));
                            flat.extend(items.iter().cloned());
                        }
                        _ => lengths.push(None),
                    }
                }
                let child_type = flat
                    .iter()
                    .find_map(|s| s.data_type())
                    .unwrap_or(DataType::Int64);
                let child = Vector::from_scalars(child_type, &flat)?;
                Ok(Vector::Array(ArrayVector::from_lengths(&lengths, child)?))
            }
            DataType::NonNative => Err(Error::not_implemented("from_scalars", data_type, "-")),
        }
    }

    /// Owned copy of rows `offset..offset + len`.
    pub fn slice_owned(&self, offset: usize, len: usize) -> Result<Vector> {
        let end = offset
            .checked_add(len)
            .filter(|end| *end <= self.len())
            .ok_or_else(|| {
                Error::Contract(format!(
                    "slice {offset}+{len} out of range for {} rows",
                    self.len()
                ))
            })?;
        let indices = alloc::try_collect(offset as u32..end as u32, "slice_indices")?;
        self.take(&indices)
    }

    pub fn int64(values: Vec<i64>) -> Result<Vector> {
        Ok(Vector::Int64(PrimitiveVector::from_values(DataType::Int64, values)?))
    }

    pub fn float64(values: Vec<f64>) -> Result<Vector> {
        Ok(Vector::Float64(PrimitiveVector::from_values(DataType::Float64, values)?))
    }

    pub fn utf8(values: &[Option<&str>]) -> Result<Vector> {
        Ok(Vector::Utf8(BinaryVector::from_strs(values)?))
    }

    pub fn boolean(values: &[Option<bool>]) -> Result<Vector> {
        Ok(Vector::Boolean(BooleanVector::from_options(values)?))
    }
}

fn primitive_from_scalars<T: PrimitiveType>(data_type: DataType, values: &[Scalar]) -> Result<Vector> {
    let opts: Vec<Option<T>> = values.iter().map(T::from_scalar).collect();
    Ok(T::wrap(PrimitiveVector::from_options(data_type, &opts)?))
}

impl From<PrimitiveVector<i64>> for Vector {
    fn from(p: PrimitiveVector<i64>) -> Self {
        i64::wrap(p)
    }
}

impl From<PrimitiveVector<f64>> for Vector {
    fn from(p: PrimitiveVector<f64>) -> Self {
        Vector::Float64(p)
    }
}

impl From<BooleanVector> for Vector {
    fn from(b: BooleanVector) -> Self {
        Vector::Boolean(b)
    }
}
