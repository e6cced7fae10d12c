//! Scalar reductions over a single vector.
//!
//! Null rows are ignored. An empty or all-null input reduces to
//! `Scalar::Null` rather than an error.

use std::cmp::Ordering;

use vecta_core::native::NativeType;
use vecta_core::scalar::Scalar;
use vecta_core::{Error, Result};

use crate::primitive::{PrimitiveType, PrimitiveVector};
use crate::vector::{dispatch_primitive, Vector};

fn extreme_primitive<T: PrimitiveType>(p: &PrimitiveVector<T>, want: Ordering) -> Scalar {
    let mut best: Option<T> = None;
    for v in p.iter().flatten() {
        // NaN is unordered against itself.
        if v.partial_cmp(&v).is_none() {
            continue;
        }
        best = match best {
            Some(b) if v.partial_cmp(&b) != Some(want) => Some(b),
            _ => Some(v),
        };
    }
    best.map_or(Scalar::Null, |b| b.to_scalar(p.data_type()))
}

fn extreme(vector: &Vector, want: Ordering, op: &str) -> Result<Scalar> {
    let dt = vector.data_type();
    let miss = || Error::not_implemented(op, dt, "-");
    if !matches!(vector, Vector::Interval(_)) {
        if let Some(s) = dispatch_primitive!(vector, p => Some(extreme_primitive(p, want)), _ => None) {
            return Ok(s);
        }
    }
    match vector {
        Vector::Boolean(b) => {
            let mut best: Option<bool> = None;
            for v in b.iter().flatten() {
                best = match best {
                    Some(cur) if v.cmp(&cur) != want => Some(cur),
                    _ => Some(v),
                };
            }
            Ok(best.map_or(Scalar::Null, Scalar::Boolean))
        }
        Vector::Utf8(b) | Vector::Binary(b) => {
            let mut best: Option<&[u8]> = None;
            for v in b.iter().flatten() {
                best = match best {
                    Some(cur) if v.cmp(cur) != want => Some(cur),
                    _ => Some(v),
                };
            }
            Ok(match best {
                None => Scalar::Null,
                Some(bytes) if dt == vecta_core::types::DataType::Utf8 => {
                    let text = std::str::from_utf8(bytes)
                        .map_err(|e| Error::Contract(format!("{op} of a utf8 column: {e}")))?;
                    Scalar::Utf8(text.to_owned())
                }
                Some(bytes) => Scalar::Binary(bytes.to_vec()),
            })
        }
        _ => Err(miss()),
    }
}

fn sum_ints<T: NativeType + Into<i64>>(p: &PrimitiveVector<T>) -> Scalar {
    let mut acc: Option<i64> = None;
    for v in p.iter().flatten() {
        acc = Some(acc.unwrap_or(0).wrapping_add(v.into()));
    }
    acc.map_or(Scalar::Null, Scalar::Int64)
}

fn sum_floats<T: NativeType + Into<f64>>(p: &PrimitiveVector<T>) -> Scalar {
    let mut acc: Option<f64> = None;
    for v in p.iter().flatten() {
        acc = Some(acc.unwrap_or(0.0) + v.into());
    }
    acc.map_or(Scalar::Null, Scalar::Float64)
}

impl Vector {
    /// Smallest non-null value; NaNs are skipped.
    pub fn min(&self) -> Result<Scalar> {
        extreme(self, Ordering::Less, "min")
    }

    /// Largest non-null value; NaNs are skipped.
    pub fn max(&self) -> Result<Scalar> {
        extreme(self, Ordering::Greater, "max")
    }

    /// Sum of non-null values: Int64 (wrapping) for integers, Float64 for floats.
    pub fn sum(&self) -> Result<Scalar> {
        match self {
            Vector::Int8(p) => Ok(sum_ints(p)),
            Vector::Int16(p) => Ok(sum_ints(p)),
            Vector::Int32(p) => Ok(sum_ints(p)),
            Vector::Int64(p) => Ok(sum_ints(p)),
            Vector::Float32(p) => Ok(sum_floats(p)),
            Vector::Float64(p) => Ok(sum_floats(p)),
            _ => Err(Error::not_implemented("sum", self.data_type(), "-")),
        }
    }
}
