//! Single logical values: literals for comparisons and kernels, and the
//! element type of materialized lists.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::types::{DataType, IntervalMonthDayNano, TimeUnit};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Scalar {
    Null,
    Boolean(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Date32(i32),
    Timestamp64(i64, TimeUnit),
    Time32(i32, TimeUnit),
    Time64(i64, TimeUnit),
    Interval(IntervalMonthDayNano),
    Utf8(String),
    Binary(Vec<u8>),
    List(Vec<Scalar>),
}

impl Scalar {
    /// Logical type of the value; `None` for an untyped null.
    pub fn data_type(&self) -> Option<DataType> {
        Some(match self {
            Scalar::Null => return None,
            Scalar::Boolean(_) => DataType::Boolean,
            Scalar::Int8(_) => DataType::Int8,
            Scalar::Int16(_) => DataType::Int16,
            Scalar::Int32(_) => DataType::Int32,
            Scalar::Int64(_) => DataType::Int64,
            Scalar::Float32(_) => DataType::Float32,
            Scalar::Float64(_) => DataType::Float64,
            Scalar::Date32(_) => DataType::Date32,
            Scalar::Timestamp64(_, u) => DataType::Timestamp64(*u),
            Scalar::Time32(_, u) => DataType::Time32(*u),
            Scalar::Time64(_, u) => DataType::Time64(*u),
            Scalar::Interval(_) => DataType::Interval,
            Scalar::Utf8(_) => DataType::Utf8,
            Scalar::Binary(_) => DataType::Binary,
            Scalar::List(_) => DataType::Array,
        })
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    /// Widen any numeric scalar to f64.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Int8(v) => Some(*v as f64),
            Scalar::Int16(v) => Some(*v as f64),
            Scalar::Int32(v) => Some(*v as f64),
            Scalar::Int64(v) => Some(*v as f64),
            Scalar::Float32(v) => Some(*v as f64),
            Scalar::Float64(v) => Some(*v),
            _ => None,
        }
    }

    /// Widen any integer scalar to i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Scalar::Int8(v) => Some(*v as i64),
            Scalar::Int16(v) => Some(*v as i64),
            Scalar::Int32(v) => Some(*v as i64),
            Scalar::Int64(v) => Some(*v),
            _ => None,
        }
    }

    /// Total order used for sorting materialized values: nulls first, NaN last
    /// within floats, mixed kinds by type code.
    pub fn total_cmp(&self, other: &Scalar) -> Ordering {
        use Scalar::*;
        match (self, other) {
            (Null, Null) => Ordering::Equal,
            (Null, _) => Ordering::Less,
            (_, Null) => Ordering::Greater,
            (Boolean(a), Boolean(b)) => a.cmp(b),
            (Int8(a), Int8(b)) => a.cmp(b),
            (Int16(a), Int16(b)) => a.cmp(b),
            (Int32(a), Int32(b)) => a.cmp(b),
            (Int64(a), Int64(b)) => a.cmp(b),
            (Float32(a), Float32(b)) => a.total_cmp(b),
            (Float64(a), Float64(b)) => a.total_cmp(b),
            (Date32(a), Date32(b)) => a.cmp(b),
            (Timestamp64(a, _), Timestamp64(b, _)) => a.cmp(b),
            (Time32(a, _), Time32(b, _)) => a.cmp(b),
            (Time64(a, _), Time64(b, _)) => a.cmp(b),
            (Interval(a), Interval(b)) => a.cmp(b),
            (Utf8(a), Utf8(b)) => a.cmp(b),
            (Binary(a), Binary(b)) => a.cmp(b),
            (List(a), List(b)) => {
                for (x, y) in a.iter().zip(b) {
                    match x.total_cmp(y) {
                        Ordering::Equal => continue,
                        other => return other,
                    }
                }
                a.len().cmp(&b.len())
            }
            _ => {
                let code = |s: &Scalar| s.data_type().map(|t| t.code()).unwrap_or(0);
                code(self).cmp(&code(other))
            }
        }
    }
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Scalar::Boolean(v)
    }
}

impl From<i32> for Scalar {
    fn from(v: i32) -> Self {
        Scalar::Int32(v)
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Int64(v)
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::Float64(v)
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::Utf8(v.to_string())
    }
}

impl<T: Into<Scalar>> From<Option<T>> for Scalar {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Scalar::Null)
    }
}
