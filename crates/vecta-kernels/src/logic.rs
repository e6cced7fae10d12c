//! Boolean connectives over Boolean operands.
//!
//! A null input row gives a null output row for every connective, `and` and
//! `or` included, matching the comparison kernels.

use vecta_core::{Error, Result};
use vecta_mem::MutableBitmap;
use vecta_vector::{BooleanVector, Vector};

use crate::arith::side_value;
use crate::compare::bool_side;
use crate::registry::{row_count, Op, Operand};

pub(crate) fn logical_kernel(op: Op, left: &Operand<'_>, right: &Operand<'_>) -> Result<Vector> {
    let f: fn(bool, bool) -> bool = match op {
        Op::And => |a, b| a && b,
        Op::Or => |a, b| a || b,
        Op::Xor => |a, b| a ^ b,
        other => {
            return Err(Error::not_implemented(other.name(), left.data_type(), right.data_type()))
        }
    };
    let len = row_count(left, right)?;
    let l = bool_side(left)?;
    let r = bool_side(right)?;
    let mut values = MutableBitmap::with_capacity(len, "logical_values")?;
    let mut validity = MutableBitmap::with_capacity(len, "logical_validity")?;
    for i in 0..len {
        match (side_value(&l, i), side_value(&r, i)) {
            (Some(a), Some(b)) => {
                values.push(f(a, b));
                validity.push(true);
            }
            _ => {
                values.push(false);
                validity.push(false);
            }
        }
    }
    Ok(Vector::Boolean(BooleanVector::try_new(
        values.freeze(),
        validity.freeze_validity(),
    )?))
}
