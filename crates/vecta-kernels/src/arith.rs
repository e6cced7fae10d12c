//! Arithmetic kernels.
//!
//! Both operands are widened to the promoted type first (borrowing when
//! they already have it), so one body per output type serves every input
//! pair. Integer overflow wraps; integer division by zero is a null row.

use std::borrow::Cow;

use vecta_core::native::Numeric;
use vecta_core::scalar::Scalar;
use vecta_core::types::DataType;
use vecta_core::{Error, Result};
use vecta_mem::{alloc, Buffer, MutableBitmap};
use vecta_vector::{PrimitiveType, PrimitiveVector, Side, Vector};

use crate::registry::{row_count, KernelFn, Op, Operand};

/// Numeric element with a fixed logical type.
pub(crate) trait NumericElement: Numeric + PrimitiveType {
    const DATA_TYPE: DataType;
}

macro_rules! numeric_element {
    ($($t:ty => $dt:expr),*) => {$(
        impl NumericElement for $t {
            const DATA_TYPE: DataType = $dt;
        }
    )*};
}

numeric_element!(
    i8 => DataType::Int8,
    i16 => DataType::Int16,
    i32 => DataType::Int32,
    i64 => DataType::Int64,
    f32 => DataType::Float32,
    f64 => DataType::Float64
);

/// Values of a numeric vector in the promoted type `O`.
pub(crate) fn promoted_values<O: NumericElement>(vector: &Vector) -> Result<Cow<'_, [O]>> {
    if vector.data_type() == O::DATA_TYPE {
        if let Some(p) = O::downcast(vector) {
            return Ok(Cow::Borrowed(p.values()));
        }
    }
    macro_rules! widen {
        ($p:expr) => {
            Cow::Owned(alloc::try_collect(
                $p.values().iter().map(|v| O::promote_from(*v)),
                "numeric_promote",
            )?)
        };
    }
    Ok(match vector {
        Vector::Int8(p) => widen!(p),
        Vector::Int16(p) => widen!(p),
        Vector::Int32(p) => widen!(p),
        Vector::Int64(p) => widen!(p),
        Vector::Float32(p) => widen!(p),
        Vector::Float64(p) => widen!(p),
        other => return Err(Error::not_implemented("promote", other.data_type(), O::DATA_TYPE)),
    })
}

/// A numeric literal in the promoted type `O`.
pub(crate) fn scalar_as<O: Numeric>(scalar: &Scalar) -> Option<O> {
    Some(match scalar {
        Scalar::Int8(v) => O::promote_from(*v),
        Scalar::Int16(v) => O::promote_from(*v),
        Scalar::Int32(v) => O::promote_from(*v),
        Scalar::Int64(v) => O::promote_from(*v),
        Scalar::Float32(v) => O::promote_from(*v),
        Scalar::Float64(v) => O::promote_from(*v),
        _ => return None,
    })
}

pub(crate) fn numeric_side<'a, O: NumericElement>(operand: &Operand<'a>) -> Result<Side<'a, O>> {
    match *operand {
        Operand::Vector(v) => Ok(Side::Values(promoted_values(v)?, v.validity())),
        Operand::Scalar(s, _) if s.is_null() => Ok(Side::Scalar(None)),
        Operand::Scalar(s, _) => scalar_as(s)
            .map(|v| Side::Scalar(Some(v)))
            .ok_or_else(|| Error::Contract(format!("literal {s:?} is not numeric"))),
    }
}

/// Value at row `i`, or `None` when that row is null.
#[inline]
pub(crate) fn side_value<P: Copy>(side: &Side<'_, P>, i: usize) -> Option<P> {
    match side {
        Side::Values(_, Some(validity)) if !validity.get(i) => None,
        Side::Values(values, _) => Some(values[i]),
        Side::Scalar(s) => *s,
    }
}

fn combine<O, F>(left: &Side<'_, O>, right: &Side<'_, O>, len: usize, f: F) -> Result<Vector>
where
    O: NumericElement,
    F: Fn(O, O) -> Option<O>,
{
    let mut values = alloc::try_vec_with_capacity::<O>(len, "arith_values")?;
    let mut validity = MutableBitmap::with_capacity(len, "arith_validity")?;
    for i in 0..len {
        let out = match (side_value(left, i), side_value(right, i)) {
            (Some(a), Some(b)) => f(a, b),
            _ => None,
        };
        values.push(out.unwrap_or_default());
        validity.push(out.is_some());
    }
    let vector = PrimitiveVector::try_new(O::DATA_TYPE, Buffer::from_vec(values), validity.freeze_validity())?;
    Ok(O::wrap(vector))
}

/// Arithmetic in the promoted type `O`.
pub(crate) fn arith_kernel<O: NumericElement>(op: Op, left: &Operand<'_>, right: &Operand<'_>) -> Result<Vector> {
    let len = row_count(left, right)?;
    let l = numeric_side::<O>(left)?;
    let r = numeric_side::<O>(right)?;
    match op {
        Op::Add => combine(&l, &r, len, |a, b| Some(a.add(b))),
        Op::Subtract => combine(&l, &r, len, |a, b| Some(a.sub(b))),
        Op::Multiply => combine(&l, &r, len, |a, b| Some(a.mul(b))),
        Op::Divide => combine(&l, &r, len, |a, b| a.div(b)),
        other => Err(Error::not_implemented(other.name(), left.data_type(), right.data_type())),
    }
}

pub(crate) fn kernel_for(out: DataType) -> Option<KernelFn> {
    let func: KernelFn = match out {
        DataType::Int8 => arith_kernel::<i8>,
        DataType::Int16 => arith_kernel::<i16>,
        DataType::Int32 => arith_kernel::<i32>,
        DataType::Int64 => arith_kernel::<i64>,
        DataType::Float32 => arith_kernel::<f32>,
        DataType::Float64 => arith_kernel::<f64>,
        _ => return None,
    };
    Some(func)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widening_borrows_same_type() {
        let v = Vector::int64(vec![1, 2, 3]).unwrap();
        assert!(matches!(promoted_values::<i64>(&v).unwrap(), Cow::Borrowed(_)));
        let widened = promoted_values::<f64>(&v).unwrap();
        assert_eq!(&*widened, &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_divide_by_zero_is_null() {
        let l = Vector::int64(vec![10, 7, -9]).unwrap();
        let r = Vector::int64(vec![2, 0, 3]).unwrap();
        let out = arith_kernel::<i64>(Op::Divide, &Operand::Vector(&l), &Operand::Vector(&r)).unwrap();
        assert_eq!(
            out.to_materialized_list().unwrap(),
            vec![Scalar::Int64(5), Scalar::Null, Scalar::Int64(-3)]
        );
    }

    #[test]
    fn test_overflow_wraps() {
        let l = Vector::int64(vec![i64::MAX]).unwrap();
        let one = Scalar::Int64(1);
        let out = arith_kernel::<i64>(
            Op::Add,
            &Operand::Vector(&l),
            &Operand::Scalar(&one, DataType::Int64),
        )
        .unwrap();
        assert_eq!(out.get_scalar(0).unwrap(), Scalar::Int64(i64::MIN));
    }
}
