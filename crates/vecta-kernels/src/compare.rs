//! Comparison kernels. Every one returns a Boolean vector whose null rows
//! are exactly the rows where either input was null.

use std::borrow::Cow;

use vecta_core::scalar::Scalar;
use vecta_core::types::{DataType, IntervalMonthDayNano};
use vecta_core::{Error, Result};
use vecta_mem::alloc;
use vecta_vector::{compare_sides, BooleanVector, Mask, PrimitiveType, Side, Vector};

use crate::arith::{numeric_side, NumericElement};
use crate::registry::{row_count, KernelFn, Op, Operand};

fn to_boolean(mask: Mask) -> Result<Vector> {
    Ok(Vector::Boolean(BooleanVector::from_mask(&mask)?))
}

fn miss(op: Op, left: &Operand<'_>, right: &Operand<'_>) -> Error {
    Error::not_implemented(op.name(), left.data_type(), right.data_type())
}

fn operand_mismatch(operand: &Operand<'_>) -> Error {
    Error::Contract(format!(
        "operand of type {} does not match its kernel",
        operand.data_type()
    ))
}

/// Compare in the promoted numeric type `O`.
pub(crate) fn numeric_compare<O: NumericElement>(op: Op, left: &Operand<'_>, right: &Operand<'_>) -> Result<Vector> {
    let cmp = op.cmp_op().ok_or_else(|| miss(op, left, right))?;
    let len = row_count(left, right)?;
    let l = numeric_side::<O>(left)?;
    let r = numeric_side::<O>(right)?;
    to_boolean(compare_sides(cmp, &l, &r, len)?)
}

pub(crate) fn numeric_kernel_for(promoted: DataType) -> Option<KernelFn> {
    let func: KernelFn = match promoted {
        DataType::Int8 => numeric_compare::<i8>,
        DataType::Int16 => numeric_compare::<i16>,
        DataType::Int32 => numeric_compare::<i32>,
        DataType::Int64 => numeric_compare::<i64>,
        DataType::Float32 => numeric_compare::<f32>,
        DataType::Float64 => numeric_compare::<f64>,
        _ => return None,
    };
    Some(func)
}

fn primitive_side<'a, T: PrimitiveType>(operand: &Operand<'a>) -> Result<Side<'a, T>> {
    match *operand {
        Operand::Vector(v) => T::downcast(v)
            .map(|p| Side::Values(Cow::Borrowed(p.values()), p.validity()))
            .ok_or_else(|| operand_mismatch(operand)),
        Operand::Scalar(s, _) if s.is_null() => Ok(Side::Scalar(None)),
        Operand::Scalar(s, _) => T::from_scalar(s)
            .map(|v| Side::Scalar(Some(v)))
            .ok_or_else(|| operand_mismatch(operand)),
    }
}

pub(crate) fn bool_side<'a>(operand: &Operand<'a>) -> Result<Side<'a, bool>> {
    match *operand {
        Operand::Vector(Vector::Boolean(b)) => {
            let mut values = alloc::try_vec_with_capacity(b.len(), "bool_operand")?;
            values.extend(b.values().iter());
            Ok(Side::Values(Cow::Owned(values), b.validity()))
        }
        Operand::Scalar(s, _) if s.is_null() => Ok(Side::Scalar(None)),
        Operand::Scalar(Scalar::Boolean(v), _) => Ok(Side::Scalar(Some(*v))),
        _ => Err(operand_mismatch(operand)),
    }
}

fn bytes_side<'a>(operand: &Operand<'a>) -> Result<Side<'a, &'a [u8]>> {
    match *operand {
        Operand::Vector(Vector::Utf8(b)) | Operand::Vector(Vector::Binary(b)) => {
            let values = alloc::try_collect((0..b.len()).map(|i| b.value(i)), "bytes_operand")?;
            Ok(Side::Values(Cow::Owned(values), b.validity()))
        }
        Operand::Scalar(s, _) if s.is_null() => Ok(Side::Scalar(None)),
        Operand::Scalar(Scalar::Utf8(s), _) => Ok(Side::Scalar(Some(s.as_bytes()))),
        Operand::Scalar(Scalar::Binary(s), _) => Ok(Side::Scalar(Some(s.as_slice()))),
        _ => Err(operand_mismatch(operand)),
    }
}

/// Both operands share the fixed-width physical type `T`.
fn primitive_compare<T: PrimitiveType>(op: Op, left: &Operand<'_>, right: &Operand<'_>) -> Result<Vector> {
    let cmp = op.cmp_op().ok_or_else(|| miss(op, left, right))?;
    let len = row_count(left, right)?;
    let l = primitive_side::<T>(left)?;
    let r = primitive_side::<T>(right)?;
    to_boolean(compare_sides(cmp, &l, &r, len)?)
}

fn boolean_compare(op: Op, left: &Operand<'_>, right: &Operand<'_>) -> Result<Vector> {
    let cmp = op.cmp_op().ok_or_else(|| miss(op, left, right))?;
    let len = row_count(left, right)?;
    to_boolean(compare_sides(cmp, &bool_side(left)?, &bool_side(right)?, len)?)
}

/// Lexicographic over the raw bytes, for both Utf8 and Binary.
fn bytes_compare(op: Op, left: &Operand<'_>, right: &Operand<'_>) -> Result<Vector> {
    let cmp = op.cmp_op().ok_or_else(|| miss(op, left, right))?;
    let len = row_count(left, right)?;
    to_boolean(compare_sides(cmp, &bytes_side(left)?, &bytes_side(right)?, len)?)
}

/// Kernel for comparing two operands of the same non-numeric type.
pub(crate) fn same_type_kernel_for(dt: DataType) -> Option<KernelFn> {
    let func: KernelFn = match dt {
        DataType::Date32 | DataType::Time32(_) => primitive_compare::<i32>,
        DataType::Timestamp64(_) | DataType::Time64(_) => primitive_compare::<i64>,
        DataType::Interval => primitive_compare::<IntervalMonthDayNano>,
        DataType::Boolean => boolean_compare,
        DataType::Utf8 | DataType::Binary => bytes_compare,
        _ => return None,
    };
    Some(func)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixed_width_compare_promotes() {
        let l = Vector::from_scalars(DataType::Int8, &[Scalar::Int8(3), Scalar::Null, Scalar::Int8(-1)]).unwrap();
        let lit = Scalar::Float64(2.5);
        let out = numeric_compare::<f64>(
            Op::GreaterThan,
            &Operand::Vector(&l),
            &Operand::Scalar(&lit, DataType::Float64),
        )
        .unwrap();
        assert_eq!(
            out.to_materialized_list().unwrap(),
            vec![Scalar::Boolean(true), Scalar::Null, Scalar::Boolean(false)]
        );
    }

    #[test]
    fn test_scalar_on_left() {
        let r = Vector::utf8(&[Some("apple"), Some("pear")]).unwrap();
        let lit = Scalar::Utf8("banana".into());
        let out = bytes_compare(
            Op::LessThan,
            &Operand::Scalar(&lit, DataType::Utf8),
            &Operand::Vector(&r),
        )
        .unwrap();
        assert_eq!(
            out.to_materialized_list().unwrap(),
            vec![Scalar::Boolean(false), Scalar::Boolean(true)]
        );
    }
}
