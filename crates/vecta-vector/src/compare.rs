//! Comparisons producing three-valued masks.
//!
//! A row where either input is null yields `MASK_NULL`, never false. The
//! row-wise core here is shared with the dispatch registry's comparison
//! kernels so both surfaces propagate nulls identically.

use std::borrow::Cow;

use vecta_core::scalar::Scalar;
use vecta_core::{Error, Result};
use vecta_mem::{alloc, combine_validity, Bitmap};

use crate::mask::{Mask, MASK_FALSE, MASK_NULL, MASK_TRUE};
use crate::primitive::{PrimitiveType, PrimitiveVector};
use crate::vector::{dispatch_primitive, Vector};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CmpOp {
    Eq,
    NotEq,
    Gt,
    GtEq,
    Lt,
    LtEq,
}

impl CmpOp {
    #[inline]
    pub fn apply<T: PartialOrd + ?Sized>(self, a: &T, b: &T) -> bool {
        match self {
            CmpOp::Eq => a == b,
            CmpOp::NotEq => a != b,
            CmpOp::Gt => a > b,
            CmpOp::GtEq => a >= b,
            CmpOp::Lt => a < b,
            CmpOp::LtEq => a <= b,
        }
    }

    pub fn is_equality(self) -> bool {
        matches!(self, CmpOp::Eq | CmpOp::NotEq)
    }

    pub fn name(self) -> &'static str {
        match self {
            CmpOp::Eq => "equals",
            CmpOp::NotEq => "not_equals",
            CmpOp::Gt => "greater_than",
            CmpOp::GtEq => "greater_than_or_equals",
            CmpOp::Lt => "less_than",
            CmpOp::LtEq => "less_than_or_equals",
        }
    }
}

/// One operand of a row-wise comparison.
pub enum Side<'a, P: Clone> {
    Values(Cow<'a, [P]>, Option<&'a Bitmap>),
    /// Broadcast to every row; `None` is a null literal.
    Scalar(Option<P>),
}

/// Evaluate `pred` per row, writing the null sentinel where any input is null.
pub fn compare_rows<F>(len: usize, validity: [Option<&Bitmap>; 2], mut pred: F) -> Result<Mask>
where
    F: FnMut(usize) -> bool,
{
    let [l, r] = validity;
    let bytes = match combine_validity(l, r)? {
        None => alloc::try_collect((0..len).map(|i| pred(i) as u8), "compare_mask")?,
        Some(valid) => alloc::try_collect(
            (0..len).map(|i| {
                if !valid.get(i) {
                    MASK_NULL
                } else if pred(i) {
                    MASK_TRUE
                } else {
                    MASK_FALSE
                }
            }),
            "compare_mask",
        )?,
    };
    Ok(Mask::from_bytes(bytes))
}

/// Compare two same-typed operands row by row.
pub fn compare_sides<P: PartialOrd + Clone>(
    op: CmpOp,
    left: &Side<'_, P>,
    right: &Side<'_, P>,
    len: usize,
) -> Result<Mask> {
    match (left, right) {
        (Side::Scalar(None), _) | (_, Side::Scalar(None)) => Mask::all_null(len),
        (Side::Values(l, lv), Side::Values(r, rv)) => {
            compare_rows(len, [*lv, *rv], |i| op.apply(&l[i], &r[i]))
        }
        (Side::Values(l, lv), Side::Scalar(Some(s))) => {
            compare_rows(len, [*lv, None], |i| op.apply(&l[i], s))
        }
        (Side::Scalar(Some(s)), Side::Values(r, rv)) => {
            compare_rows(len, [None, *rv], |i| op.apply(s, &r[i]))
        }
        (Side::Scalar(Some(a)), Side::Scalar(Some(b))) => {
            let v = op.apply(a, b);
            compare_rows(len, [None, None], |_| v)
        }
    }
}

fn compare_primitive<T: PrimitiveType>(
    op: CmpOp,
    p: &PrimitiveVector<T>,
    scalar: &Scalar,
) -> Option<Result<Mask>> {
    let s = T::from_scalar(scalar)?;
    Some(compare_sides(
        op,
        &Side::Values(Cow::Borrowed(p.values()), p.validity()),
        &Side::Scalar(Some(s)),
        p.len(),
    ))
}

impl Vector {
    /// Compare every row against `scalar`.
    ///
    /// The scalar must have this vector's logical type; a null scalar yields
    /// an all-null mask. Intervals only support equality. Arrays and
    /// passthrough columns are not comparable.
    pub fn compare_scalar(&self, op: CmpOp, scalar: &Scalar) -> Result<Mask> {
        let dt = self.data_type();
        let miss = || {
            Error::not_implemented(
                op.name(),
                dt,
                scalar.data_type().map_or("null".to_string(), |t| t.to_string()),
            )
        };
        if matches!(self, Vector::Array(_) | Vector::NonNative(_)) {
            return Err(miss());
        }
        if scalar.is_null() {
            return Mask::all_null(self.len());
        }
        if scalar.data_type() != Some(dt) {
            return Err(miss());
        }
        if matches!(self, Vector::Interval(_)) && !op.is_equality() {
            return Err(miss());
        }
        let len = self.len();
        dispatch_primitive!(self, p => match compare_primitive(op, p, scalar) {
            Some(mask) => mask,
            None => Err(miss()),
        }, other => match (other, scalar) {
            (Vector::Boolean(b), Scalar::Boolean(s)) => {
                compare_rows(len, [b.validity(), None], |i| op.apply(&b.value(i), s))
            }
            (Vector::Utf8(b), Scalar::Utf8(s)) => {
                compare_rows(len, [b.validity(), None], |i| op.apply(b.value(i), s.as_bytes()))
            }
            (Vector::Binary(b), Scalar::Binary(s)) => {
                compare_rows(len, [b.validity(), None], |i| op.apply(b.value(i), s.as_slice()))
            }
            _ => Err(miss()),
        })
    }

    pub fn equals(&self, scalar: &Scalar) -> Result<Mask> {
        self.compare_scalar(CmpOp::Eq, scalar)
    }

    pub fn not_equals(&self, scalar: &Scalar) -> Result<Mask> {
        self.compare_scalar(CmpOp::NotEq, scalar)
    }

    pub fn greater_than(&self, scalar: &Scalar) -> Result<Mask> {
        self.compare_scalar(CmpOp::Gt, scalar)
    }

    pub fn greater_than_or_equals(&self, scalar: &Scalar) -> Result<Mask> {
        self.compare_scalar(CmpOp::GtEq, scalar)
    }

    pub fn less_than(&self, scalar: &Scalar) -> Result<Mask> {
        self.compare_scalar(CmpOp::Lt, scalar)
    }

    pub fn less_than_or_equals(&self, scalar: &Scalar) -> Result<Mask> {
        self.compare_scalar(CmpOp::LtEq, scalar)
    }
}
